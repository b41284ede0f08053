//! Dashboard validation tables: the profile layer under its dashboard
//! display names, plus an "all corridors" summary row.

mod columns;
mod format;
mod report;
mod summary;

pub use report::{DashboardReport, validate_dashboard};
