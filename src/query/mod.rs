mod postgres;
mod sqlite;
mod trait_def;
pub mod types;

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;
pub use trait_def::{StatsRepo, StoreError, StoreResult};
