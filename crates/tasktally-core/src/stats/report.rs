//! Spent-vs-allocated reports over a date range.
//!
//! Uses the same start-date rule as the rollups: a session's full duration
//! is attributed to the day it started on.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::task::{Task, Timestamp};

/// Bucket size for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    /// Monday-anchored weeks.
    Week,
    Month,
}

impl Period {
    /// First day of the bucket containing `date`.
    fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Day => date,
            Period::Week => date
                .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
                .unwrap_or(date),
            Period::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        };
        f.write_str(s)
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(format!("unknown period '{other}' (expected day, week or month)")),
        }
    }
}

/// One row of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBucket {
    /// Bucket label: the day, the Monday of the week, or the 1st of the month.
    pub label: NaiveDate,
    /// First and last day of the requested range that fall in this bucket.
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub spent_secs: u64,
    pub allocated_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub task_id: String,
    pub period: Period,
    pub buckets: Vec<ReportBucket>,
    pub total_spent_secs: u64,
    pub total_allocated_secs: u64,
}

/// Build a report for `task` over the inclusive range `[from, to]`.
///
/// Each day in range is allocated `time_allocated` minutes. An empty range
/// (`from > to`) yields no buckets.
pub fn period_report(
    task: &Task,
    from: NaiveDate,
    to: NaiveDate,
    period: Period,
    now: Timestamp,
) -> PeriodReport {
    let mut spent_by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for session in task.sessions() {
        let day = session.start.date();
        if day >= from && day <= to {
            *spent_by_day.entry(day).or_insert(0) += session.duration_secs(now);
        }
    }

    let allocated_per_day = u64::from(task.time_allocated) * 60;
    let mut buckets: Vec<ReportBucket> = Vec::new();
    for day in from.iter_days().take_while(|d| *d <= to) {
        let spent = spent_by_day.get(&day).copied().unwrap_or(0);
        let label = period.bucket_start(day);
        match buckets.last_mut() {
            Some(bucket) if bucket.label == label => {
                bucket.last_day = day;
                bucket.spent_secs += spent;
                bucket.allocated_secs += allocated_per_day;
            }
            _ => buckets.push(ReportBucket {
                label,
                first_day: day,
                last_day: day,
                spent_secs: spent,
                allocated_secs: allocated_per_day,
            }),
        }
    }

    PeriodReport {
        task_id: task.id().to_string(),
        period,
        total_spent_secs: buckets.iter().map(|b| b.spent_secs).sum(),
        total_allocated_secs: buckets.iter().map(|b| b.allocated_secs).sum(),
        buckets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample_task() -> Task {
        let mut task = Task::new("Thesis");
        task.time_allocated = 30;
        task.record_session(ts("2024-01-01T23:59:00"), ts("2024-01-02T00:01:00"));
        task.record_session(ts("2024-01-03T10:00:00"), ts("2024-01-03T10:10:00"));
        task.record_session(ts("2024-01-08T10:00:00"), ts("2024-01-08T11:00:00"));
        task
    }

    #[test]
    fn daily_buckets_use_start_date() {
        let report = period_report(
            &sample_task(),
            date("2024-01-01"),
            date("2024-01-03"),
            Period::Day,
            ts("2024-01-10T00:00:00"),
        );
        let spent: Vec<u64> = report.buckets.iter().map(|b| b.spent_secs).collect();
        assert_eq!(spent, vec![120, 0, 600]);
        assert_eq!(report.total_allocated_secs, 3 * 30 * 60);
    }

    #[test]
    fn weekly_buckets_are_monday_anchored() {
        // 2024-01-01 is a Monday.
        let report = period_report(
            &sample_task(),
            date("2024-01-01"),
            date("2024-01-10"),
            Period::Week,
            ts("2024-01-10T00:00:00"),
        );
        assert_eq!(report.buckets.len(), 2);
        assert_eq!(report.buckets[0].label, date("2024-01-01"));
        assert_eq!(report.buckets[0].spent_secs, 720);
        assert_eq!(report.buckets[1].label, date("2024-01-08"));
        assert_eq!(report.buckets[1].last_day, date("2024-01-10"));
        assert_eq!(report.buckets[1].allocated_secs, 3 * 30 * 60);
        assert_eq!(report.total_spent_secs, 720 + 3600);
    }

    #[test]
    fn monthly_bucket_label_is_first_of_month_even_mid_range() {
        let report = period_report(
            &sample_task(),
            date("2024-01-03"),
            date("2024-02-02"),
            Period::Month,
            ts("2024-02-10T00:00:00"),
        );
        assert_eq!(report.buckets.len(), 2);
        assert_eq!(report.buckets[0].label, date("2024-01-01"));
        assert_eq!(report.buckets[0].first_day, date("2024-01-03"));
        assert_eq!(report.buckets[1].label, date("2024-02-01"));
    }

    #[test]
    fn reversed_range_is_empty() {
        let report = period_report(
            &sample_task(),
            date("2024-01-05"),
            date("2024-01-01"),
            Period::Day,
            ts("2024-01-10T00:00:00"),
        );
        assert!(report.buckets.is_empty());
        assert_eq!(report.total_spent_secs, 0);
    }

    #[test]
    fn period_parses_case_insensitively() {
        assert_eq!("Week".parse::<Period>().unwrap(), Period::Week);
        assert!("fortnight".parse::<Period>().is_err());
    }
}
