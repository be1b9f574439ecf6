//! Per-task advice.
//!
//! Advice is produced from a read-only [`TaskSnapshot`] by an
//! [`AdviceProvider`]. Providers may fail; [`advice_for`] turns a failure
//! into `None` after logging it, so a broken provider never reaches the
//! tracker.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::error::AdviceError;
use crate::stats::aggregate;
use crate::task::{PomodoroSettings, Task, Timestamp};

pub const NO_RECOMMENDATIONS: &str = "No recommendations";

/// Everything a provider may look at, copied out of the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSnapshot {
    pub title: String,
    pub description: String,
    pub deadline: Option<Timestamp>,
    pub is_completed: bool,
    /// Minutes.
    pub time_allocated: u32,
    pub spent_secs: u64,
    pub use_pomodoro: bool,
    pub pomodoro: PomodoroSettings,
    /// Reference time the snapshot was taken at.
    pub taken_at: Timestamp,
}

impl TaskSnapshot {
    pub fn of(task: &Task, now: Timestamp) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            deadline: task.deadline,
            is_completed: task.is_completed,
            time_allocated: task.time_allocated,
            spent_secs: aggregate(task, now).total,
            use_pomodoro: task.use_pomodoro,
            pomodoro: task.pomodoro,
            taken_at: now,
        }
    }

    /// Whole calendar days from today until the deadline's date.
    pub fn days_left(&self) -> Option<i64> {
        let today: NaiveDate = self.taken_at.date();
        self.deadline.map(|d| (d.date() - today).num_days())
    }
}

pub trait AdviceProvider {
    fn advise(&self, snapshot: &TaskSnapshot) -> Result<String, AdviceError>;
}

/// Ask `provider` about one task; failures are logged and become `None`.
pub fn advice_for<P>(provider: &P, snapshot: &TaskSnapshot) -> Option<String>
where
    P: AdviceProvider + ?Sized,
{
    match provider.advise(snapshot) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(title = %snapshot.title, error = %e, "advice unavailable");
            None
        }
    }
}

/// Built-in heuristics. Each matching rule contributes one line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedAdvisor;

impl RuleBasedAdvisor {
    fn lines(snapshot: &TaskSnapshot) -> Vec<String> {
        if snapshot.is_completed {
            return vec!["Task completed, great work!".to_string()];
        }

        let mut lines = Vec::new();
        match snapshot.days_left() {
            Some(days) if days < 0 => lines.push("This task is overdue!".to_string()),
            Some(days) if days <= 2 => {
                lines.push("The deadline is close, finish this task soon".to_string());
            }
            _ => {}
        }
        if snapshot.use_pomodoro {
            lines.push(format!(
                "Pomodoro: {} min work / {} min break",
                snapshot.pomodoro.work_min, snapshot.pomodoro.break_min
            ));
        }
        // Half the allocation, compared in seconds.
        if snapshot.spent_secs * 2 < u64::from(snapshot.time_allocated) * 60 {
            lines.push("Not much progress yet, plan some time for it".to_string());
        }
        lines
    }
}

impl AdviceProvider for RuleBasedAdvisor {
    fn advise(&self, snapshot: &TaskSnapshot) -> Result<String, AdviceError> {
        let lines = Self::lines(snapshot);
        if lines.is_empty() {
            Ok(NO_RECOMMENDATIONS.to_string())
        } else {
            Ok(lines.join("\n"))
        }
    }
}
