//! # Tasktally Core Library
//!
//! Session tracking and Pomodoro engine behind the `tasktally` CLI. The
//! library owns all behavior; the CLI only parses arguments and renders.
//!
//! ## Architecture
//!
//! - **Session store**: the task collection with at most one open session
//! - **Time aggregation**: pure rollups by day, week, month and total
//! - **Pomodoro**: a tick-driven Work/Break/LongBreak state machine
//! - **Session tracker**: the orchestrator. The caller supplies `now` and
//!   calls `tick()` once per second
//! - **Storage**: JSON tasks file and TOML configuration
//!
//! ## Key Components
//!
//! - [`SessionTracker`]: start, tick, stop and shutdown
//! - [`SessionStore`]: session open/close with the single-open invariant
//! - [`Config`]: application configuration management
//! - [`AdviceProvider`]: trait for per-task advice

pub mod advice;
pub mod error;
pub mod events;
pub mod session;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use advice::{advice_for, AdviceProvider, RuleBasedAdvisor, TaskSnapshot};
pub use error::{AdviceError, ConfigError, StorageError, TrackerError};
pub use events::Event;
pub use session::SessionStore;
pub use stats::{aggregate, aggregate_all, format_hms, period_report, Period, TimeTotals};
pub use storage::{Config, JsonTaskFile, MemoryRepository, TaskRepository};
pub use task::{now_local, parse_deadline, PomodoroSettings, Session, Task, Timestamp};
pub use timer::{
    run_ticker, Phase, PomodoroCycle, PomodoroRun, SessionTracker, SharedTracker, TrackerStatus,
    TICK_PERIOD,
};
