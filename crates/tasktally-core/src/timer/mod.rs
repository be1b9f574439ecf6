mod pomodoro;
mod ticker;
mod tracker;

pub use pomodoro::{Phase, PhaseStep, PhaseTransition, PomodoroCycle, PomodoroRun};
pub use ticker::{run_ticker, SharedTracker, TICK_PERIOD};
pub use tracker::{SessionTracker, TrackerStatus};
