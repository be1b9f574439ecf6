//! Session tracker: the orchestrator.
//!
//! The tracker is the only component that opens or closes sessions and the
//! only holder of Pomodoro run state. The active task lives in a single
//! private slot, so a second `start` can never silently switch tasks.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle --start--> Tracking --stop/shutdown--> Idle
//!                   |  ^
//!                   tick (phase boundaries open/close sessions)
//! ```
//!
//! The caller drives time: every operation takes `now`, and Pomodoro phases
//! advance exactly one second per `tick`.
//!
//! ## Persistence
//!
//! The collection is saved after every mutation that closes a session, and
//! only while no session is open. Failed saves leave the tracker dirty; the
//! next mutating call tries again. In-memory state stays authoritative.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::pomodoro::{Phase, PomodoroCycle, PomodoroRun};
use crate::error::{Result, TrackerError};
use crate::events::Event;
use crate::session::SessionStore;
use crate::stats::format_hms;
use crate::storage::TaskRepository;
use crate::task::{Task, Timestamp};

/// What the presentation layer renders once per tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerStatus {
    pub task_id: Option<String>,
    /// `None` in plain mode and when idle.
    pub phase: Option<Phase>,
    /// Seconds left in the phase (Pomodoro) or elapsed in this run (plain).
    pub display_secs: u64,
    pub cycles_completed: Option<u32>,
    pub cycles_before_long: Option<u32>,
}

impl TrackerStatus {
    fn idle() -> Self {
        Self {
            task_id: None,
            phase: None,
            display_secs: 0,
            cycles_completed: None,
            cycles_before_long: None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.task_id.is_some()
    }

    /// `HH:MM:SS` rendering of `display_secs`.
    pub fn display(&self) -> String {
        format_hms(self.display_secs)
    }

    /// Phase label, or "Work" for plain tracking.
    pub fn label(&self) -> &'static str {
        self.phase.map_or(Phase::Work.label(), Phase::label)
    }
}

#[derive(Debug)]
struct ActiveRun {
    task_id: String,
    started_at: Timestamp,
    pomodoro: Option<PomodoroRun>,
}

pub struct SessionTracker<R: TaskRepository> {
    store: SessionStore,
    repo: R,
    active: Option<ActiveRun>,
    dirty: bool,
    events: Vec<Event>,
}

impl<R: TaskRepository> SessionTracker<R> {
    /// Load the collection from `repo`.
    ///
    /// Sessions left open by a previous run are closed at `now` and the
    /// repaired collection is saved.
    ///
    /// # Errors
    /// `StorageUnavailable` if the collection cannot be loaded.
    pub fn open(repo: R, now: Timestamp) -> Result<Self> {
        let tasks = repo.load_tasks()?;
        let (store, recovered) = SessionStore::recover(tasks, now);
        let mut tracker = Self {
            store,
            repo,
            active: None,
            dirty: false,
            events: Vec::new(),
        };
        if recovered > 0 {
            tracker.events.push(Event::SessionsRecovered {
                count: recovered,
                at: now,
            });
            tracker.dirty = true;
            if let Err(e) = tracker.flush() {
                warn!(error = %e, "could not save recovered collection; will retry");
            }
        }
        Ok(tracker)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.store.get(task_id)
    }

    pub fn active_task(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.task_id.as_str())
    }

    /// True while a save is pending after a failure or a deferred edit.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Current display values without advancing the Pomodoro clock.
    pub fn status(&self, now: Timestamp) -> TrackerStatus {
        let Some(active) = &self.active else {
            return TrackerStatus::idle();
        };
        match &active.pomodoro {
            Some(run) => TrackerStatus {
                task_id: Some(active.task_id.clone()),
                phase: Some(run.phase()),
                display_secs: run.remaining_secs(),
                cycles_completed: Some(run.cycles_completed()),
                cycles_before_long: Some(run.cycles_before_long()),
            },
            None => TrackerStatus {
                task_id: Some(active.task_id.clone()),
                phase: None,
                display_secs: (now - active.started_at).num_seconds().max(0) as u64,
                cycles_completed: None,
                cycles_before_long: None,
            },
        }
    }

    // ── Tracking commands ────────────────────────────────────────────

    /// Begin tracking `task_id`.
    ///
    /// # Errors
    /// - `AlreadyTracking` if any task is active; the active run is untouched.
    /// - `UnknownTask` if the id does not exist.
    /// - `InvalidConfiguration` if the task uses Pomodoro with bad settings.
    pub fn start(&mut self, task_id: &str, now: Timestamp) -> Result<TrackerStatus> {
        if let Some(active) = &self.active {
            return Err(TrackerError::AlreadyTracking {
                active: active.task_id.clone(),
            });
        }
        let task = self
            .store
            .get(task_id)
            .ok_or_else(|| TrackerError::UnknownTask(task_id.to_string()))?;
        let pomodoro = if task.use_pomodoro {
            Some(PomodoroRun::start(PomodoroCycle::new(&task.pomodoro)?))
        } else {
            None
        };

        if self.dirty {
            if let Err(e) = self.flush() {
                warn!(error = %e, "pending save still failing");
            }
        }

        // Every run begins in a Work phase, so a session always opens here.
        self.store.open(task_id, now)?;
        self.active = Some(ActiveRun {
            task_id: task_id.to_string(),
            started_at: now,
            pomodoro,
        });
        let is_pomodoro = self.active.as_ref().is_some_and(|a| a.pomodoro.is_some());
        info!(task_id, pomodoro = is_pomodoro, %now, "tracking started");
        self.events.push(Event::TrackingStarted {
            task_id: task_id.to_string(),
            pomodoro: is_pomodoro,
            at: now,
        });
        self.events.push(Event::SessionOpened {
            task_id: task_id.to_string(),
            at: now,
        });
        Ok(self.status(now))
    }

    /// Advance one second. Call once per tick period.
    ///
    /// At a Pomodoro phase boundary the Work session is closed (and saved)
    /// before a break, and a new one is opened when Work resumes. Breaks
    /// never have an open session. A failed save here is logged and retried
    /// later rather than returned, so the display keeps updating.
    pub fn tick(&mut self, now: Timestamp) -> Result<TrackerStatus> {
        let Some(active) = self.active.as_mut() else {
            return Ok(TrackerStatus::idle());
        };
        let transition = active.pomodoro.as_mut().and_then(PomodoroRun::tick);
        let Some(transition) = transition else {
            return Ok(self.status(now));
        };
        let task_id = active.task_id.clone();

        if transition.from.is_work() {
            self.close_quietly(&task_id, now);
            self.dirty = true;
            if let Err(e) = self.flush() {
                warn!(task_id = %task_id, error = %e, "save after work phase failed; will retry");
            }
        }
        if transition.to.phase.is_work() {
            self.store.open(&task_id, now)?;
            self.events.push(Event::SessionOpened {
                task_id: task_id.clone(),
                at: now,
            });
        }

        info!(
            task_id = %task_id,
            from = %transition.from,
            to = %transition.to.phase,
            cycles = transition.to.cycles_completed,
            "pomodoro phase changed"
        );
        self.events.push(Event::PhaseChanged {
            task_id,
            from: transition.from,
            to: transition.to.phase,
            duration_secs: transition.to.duration_secs,
            cycles_completed: transition.to.cycles_completed,
            at: now,
        });
        Ok(self.status(now))
    }

    /// Stop tracking. A no-op when nothing is active.
    ///
    /// # Errors
    /// `StorageUnavailable` if the save fails. Tracking has still stopped
    /// and the session is closed in memory.
    pub fn stop(&mut self, now: Timestamp) -> Result<()> {
        let Some(active) = self.active.take() else {
            if self.dirty {
                if let Err(e) = self.flush() {
                    warn!(error = %e, "pending save still failing");
                }
            }
            return Ok(());
        };
        self.close_quietly(&active.task_id, now);
        info!(task_id = %active.task_id, %now, "tracking stopped");
        self.events.push(Event::TrackingStopped {
            task_id: active.task_id,
            at: now,
        });
        self.dirty = true;
        self.flush()
    }

    /// Stop everything before the process exits. Never fails.
    ///
    /// Closes any open session anywhere in the collection, then makes a
    /// best-effort save.
    pub fn shutdown(&mut self, now: Timestamp) {
        if let Some(active) = self.active.take() {
            self.close_quietly(&active.task_id, now);
            info!(task_id = %active.task_id, %now, "tracking stopped at shutdown");
            self.events.push(Event::TrackingStopped {
                task_id: active.task_id,
                at: now,
            });
            self.dirty = true;
        }
        let stray = self.store.close_all_open(now);
        if stray > 0 {
            warn!(stray, "closed sessions without an active run at shutdown");
            self.dirty = true;
        }
        if let Err(e) = self.flush() {
            warn!(error = %e, "final save failed");
        }
    }

    // ── Task editing ─────────────────────────────────────────────────

    /// # Errors
    /// `InvalidConfiguration` for bad Pomodoro settings, `DuplicateTask`
    /// when the id is taken.
    pub fn add_task(&mut self, task: Task) -> Result<()> {
        self.store.insert(task)?;
        self.dirty = true;
        self.flush()
    }

    /// Edit a task's descriptive and Pomodoro fields.
    ///
    /// Allowed mid-session: a running Pomodoro cycle keeps the durations it
    /// started with; new settings apply from the next `start`.
    pub fn update_task<F>(&mut self, task_id: &str, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Task),
    {
        self.store.update(task_id, edit)?;
        self.dirty = true;
        self.flush()
    }

    /// Add a finished interval entered by hand.
    ///
    /// # Errors
    /// `InvalidInterval` if `end` is before `start`, `UnknownTask` if the
    /// task does not exist.
    pub fn record_session(&mut self, task_id: &str, start: Timestamp, end: Timestamp) -> Result<()> {
        self.store.record(task_id, start, end)?;
        info!(task_id, %start, %end, "session recorded");
        self.events.push(Event::SessionClosed {
            task_id: task_id.to_string(),
            start,
            end,
            duration_secs: (end - start).num_seconds().max(0) as u64,
        });
        self.dirty = true;
        self.flush()
    }

    /// # Errors
    /// `TaskActive` if the task is being tracked, `UnknownTask` otherwise.
    pub fn remove_task(&mut self, task_id: &str) -> Result<Task> {
        if self.active_task() == Some(task_id) {
            return Err(TrackerError::TaskActive(task_id.to_string()));
        }
        let task = self.store.remove(task_id)?;
        self.dirty = true;
        self.flush()?;
        Ok(task)
    }

    /// Save if a save is pending and no session is open.
    ///
    /// With a session open the save is deferred to the next close, so the
    /// persisted collection never holds an open session.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if self.store.open_session().is_some() {
            debug!("save deferred while a session is open");
            return Ok(());
        }
        self.repo.save_tasks(self.store.tasks())?;
        self.dirty = false;
        Ok(())
    }

    fn close_quietly(&mut self, task_id: &str, now: Timestamp) {
        match self.store.close(task_id, now) {
            Ok(session) => self.events.push(Event::SessionClosed {
                task_id: task_id.to_string(),
                start: session.start,
                end: now,
                duration_secs: session.duration_secs(now),
            }),
            Err(TrackerError::NoOpenSession { .. }) => {
                debug!(task_id, "no open session to close");
            }
            Err(e) => debug!(task_id, error = %e, "close ignored"),
        }
    }
}
