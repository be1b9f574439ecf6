//! Time-window rollups over a task's session history.
//!
//! A session counts toward a window when it *starts* inside it. Sessions
//! are never split at midnight: an overnight session belongs entirely to
//! the day it started on. This keeps aggregation to a single pass with O(1)
//! work per session.

use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::task::{Task, Timestamp};

/// Summed tracked time per window, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTotals {
    pub total: u64,
    pub today: u64,
    pub week: u64,
    pub month: u64,
}

impl std::ops::AddAssign for TimeTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.total += rhs.total;
        self.today += rhs.today;
        self.week += rhs.week;
        self.month += rhs.month;
    }
}

/// Start instants of the windows containing a reference time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windows {
    pub today_start: Timestamp,
    /// Midnight of the Monday on or before the reference date.
    pub week_start: Timestamp,
    pub month_start: Timestamp,
}

impl Windows {
    pub fn containing(now: Timestamp) -> Self {
        let date = now.date();
        let monday = date
            .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
            .unwrap_or(date);
        let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
        Self {
            today_start: date.and_time(NaiveTime::MIN),
            week_start: monday.and_time(NaiveTime::MIN),
            month_start: first.and_time(NaiveTime::MIN),
        }
    }
}

/// Roll a task's sessions up into today/week/month/total at `now`.
///
/// Open sessions run up to `now`; negative durations count as zero.
pub fn aggregate(task: &Task, now: Timestamp) -> TimeTotals {
    let windows = Windows::containing(now);
    let mut totals = TimeTotals::default();
    for session in task.sessions() {
        let secs = session.duration_secs(now);
        totals.total += secs;
        if session.start >= windows.today_start {
            totals.today += secs;
        }
        if session.start >= windows.week_start {
            totals.week += secs;
        }
        if session.start >= windows.month_start {
            totals.month += secs;
        }
    }
    totals
}

/// Sum of [`aggregate`] over a collection.
pub fn aggregate_all<'a, I>(tasks: I, now: Timestamp) -> TimeTotals
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut totals = TimeTotals::default();
    for task in tasks {
        totals += aggregate(task, now);
    }
    totals
}

/// Render seconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_hms(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}
