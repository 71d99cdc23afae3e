pub mod api;
pub mod config;
pub mod models;
pub mod query;
pub mod report;
