//! Validation layer
//!
//! - [`report`]: counting, searching and ordering findings of a
//!   [`ValidationReport`](crate::models::ValidationReport)
//! - [`consistency`]: local aggregate checks producing `calculation` warnings

pub mod consistency;
pub mod report;

pub use consistency::check_aggregates;
pub use report::{filter, ordered_categories, search, summarize, CategoryView, ReportSummary};
