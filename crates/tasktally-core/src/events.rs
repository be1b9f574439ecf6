use serde::{Deserialize, Serialize};

use crate::task::Timestamp;
use crate::timer::Phase;

/// Every tracker state change produces an Event.
/// The presentation layer drains them after each call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TrackingStarted {
        task_id: String,
        pomodoro: bool,
        at: Timestamp,
    },
    SessionOpened {
        task_id: String,
        at: Timestamp,
    },
    SessionClosed {
        task_id: String,
        start: Timestamp,
        end: Timestamp,
        duration_secs: u64,
    },
    PhaseChanged {
        task_id: String,
        from: Phase,
        to: Phase,
        duration_secs: u64,
        cycles_completed: u32,
        at: Timestamp,
    },
    TrackingStopped {
        task_id: String,
        at: Timestamp,
    },
    /// Sessions left open by an earlier run were closed on load.
    SessionsRecovered {
        count: usize,
        at: Timestamp,
    },
}
