//! Aggregate stats reporting
//!
//! The report core: comparison-window derivation, the concurrent fan-out
//! over the stats repo, and the pure merge stages that shape the response.

pub mod aggregate;
pub mod date_range;
pub mod format;
pub mod language;

pub use aggregate::{build_aggregate_report, AggregateReport, ReportRequest};
pub use language::LanguageOrder;
