//! Statistics over tracked sessions.
//!
//! Everything here is pure: it reads task histories and a reference time
//! and never mutates state.

mod report;
mod rollup;

pub use report::{period_report, Period, PeriodReport, ReportBucket};
pub use rollup::{aggregate, aggregate_all, format_hms, TimeTotals, Windows};
