//! Task and session types.
//!
//! A [`Task`] owns its chronological list of [`Session`] intervals. Only the
//! crate can append to or close those sessions; callers edit the descriptive
//! and Pomodoro fields, which the tracker validates before accepting.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{Result, TrackerError};

/// Local wall-clock timestamp without offset.
pub type Timestamp = NaiveDateTime;

/// Current local wall-clock time, truncated to whole seconds.
pub fn now_local() -> Timestamp {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// One contiguous interval of tracked time. `end == None` means open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub start: Timestamp,
    #[serde(default)]
    pub end: Option<Timestamp>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Length in whole seconds; an open session runs up to `now`.
    ///
    /// Clock skew (end before start) yields zero.
    pub fn duration_secs(&self, now: Timestamp) -> u64 {
        let end = self.end.unwrap_or(now);
        (end - self.start).num_seconds().max(0) as u64
    }
}

/// Pomodoro durations for a task, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroSettings {
    #[serde(rename = "pomodoro_work", default = "default_work")]
    pub work_min: u32,
    #[serde(rename = "pomodoro_break", default = "default_break")]
    pub break_min: u32,
    #[serde(rename = "pomodoro_long", default = "default_long")]
    pub long_break_min: u32,
    /// Work phases before a long break.
    #[serde(rename = "pomodoro_cycles", default = "default_cycles")]
    pub cycles_before_long: u32,
}

fn default_work() -> u32 {
    25
}
fn default_break() -> u32 {
    5
}
fn default_long() -> u32 {
    15
}
fn default_cycles() -> u32 {
    4
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            work_min: default_work(),
            break_min: default_break(),
            long_break_min: default_long(),
            cycles_before_long: default_cycles(),
        }
    }
}

impl PomodoroSettings {
    /// Reject settings the cycle machine cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.cycles_before_long == 0 {
            return Err(TrackerError::InvalidConfiguration(
                "pomodoro_cycles must be at least 1".into(),
            ));
        }
        if self.work_min == 0 {
            return Err(TrackerError::InvalidConfiguration(
                "pomodoro_work must be at least 1 minute".into(),
            ));
        }
        Ok(())
    }
}

/// A tracked task.
///
/// Field names match the on-disk record layout of the tasks file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_deadline")]
    pub deadline: Option<Timestamp>,
    #[serde(default)]
    pub is_completed: bool,
    /// Target budget in minutes.
    #[serde(default)]
    pub time_allocated: u32,
    #[serde(default)]
    pub use_pomodoro: bool,
    #[serde(flatten)]
    pub pomodoro: PomodoroSettings,
    #[serde(default)]
    sessions: Vec<Session>,
}

impl Task {
    /// Create a task with a fresh UUID and no history.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), title)
    }

    pub fn with_id(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            deadline: None,
            is_completed: false,
            time_allocated: 0,
            use_pomodoro: false,
            pomodoro: PomodoroSettings::default(),
            sessions: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Sessions in insertion (chronological) order.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Append an already-finished interval, e.g. a manual time entry.
    pub fn record_session(&mut self, start: Timestamp, end: Timestamp) {
        self.sessions.push(Session {
            start,
            end: Some(end),
        });
    }

    /// Pomodoro settings only matter when the task uses them.
    pub fn validate(&self) -> Result<()> {
        if self.use_pomodoro {
            self.pomodoro.validate()?;
        }
        Ok(())
    }

    pub fn is_overdue(&self, now: Timestamp) -> bool {
        match self.deadline {
            Some(deadline) => !self.is_completed && deadline < now,
            None => false,
        }
    }

    pub(crate) fn sessions_mut(&mut self) -> &mut Vec<Session> {
        &mut self.sessions
    }
}

/// Parse a deadline written either as a date or a date-time.
///
/// A bare date means midnight at the start of that day.
pub fn parse_deadline(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = raw.parse::<NaiveDateTime>() {
        return Some(ts);
    }
    raw.parse::<NaiveDate>()
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
}

/// Deadlines were historically written either as a date or a date-time.
fn deserialize_deadline<'de, D>(deserializer: D) -> std::result::Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(raw) => parse_deadline(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid deadline '{raw}'"))),
    }
}
