//! Shared tracker handle and the periodic tick loop.
//!
//! The tracker itself is synchronous. [`SharedTracker`] lets a UI thread and
//! the tick task drive the same instance; [`run_ticker`] feeds it one tick
//! per [`TICK_PERIOD`] until cancelled, then shuts it down.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::tracker::{SessionTracker, TrackerStatus};
use crate::error::Result;
use crate::storage::TaskRepository;
use crate::task::Timestamp;

/// Wall time between ticks. Each tick counts down one second of a
/// Pomodoro phase, so this is fixed.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Cloneable handle to one [`SessionTracker`].
pub struct SharedTracker<R: TaskRepository> {
    inner: Arc<Mutex<SessionTracker<R>>>,
}

impl<R: TaskRepository> Clone for SharedTracker<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: TaskRepository> SharedTracker<R> {
    pub fn new(tracker: SessionTracker<R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    /// Lock the tracker. A poisoned lock is recovered: the tracker's own
    /// state is consistent after every call, panicking or not.
    pub fn lock(&self) -> MutexGuard<'_, SessionTracker<R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn start(&self, task_id: &str, now: Timestamp) -> Result<TrackerStatus> {
        self.lock().start(task_id, now)
    }

    pub fn tick(&self, now: Timestamp) -> Result<TrackerStatus> {
        self.lock().tick(now)
    }

    pub fn stop(&self, now: Timestamp) -> Result<()> {
        self.lock().stop(now)
    }

    pub fn shutdown(&self, now: Timestamp) {
        self.lock().shutdown(now);
    }

    pub fn status(&self, now: Timestamp) -> TrackerStatus {
        self.lock().status(now)
    }
}

/// Tick `tracker` every [`TICK_PERIOD`] until `cancel` flips to true, its sender
/// is dropped, or tracking stops elsewhere. Always ends with `shutdown`.
///
/// `clock` supplies the timestamp for each call; `on_tick` sees every status.
pub async fn run_ticker<R, C, F>(
    tracker: SharedTracker<R>,
    mut cancel: watch::Receiver<bool>,
    clock: C,
    mut on_tick: F,
) where
    R: TaskRepository,
    C: Fn() -> Timestamp,
    F: FnMut(&TrackerStatus),
{
    let mut ticks = interval(TICK_PERIOD);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Burst);
    // The first tick completes immediately.
    ticks.tick().await;

    loop {
        tokio::select! {
            _ = ticks.tick() => {
                // Release the lock before `on_tick` so it may use the tracker.
                let result = tracker.tick(clock());
                match result {
                    Ok(status) if status.is_tracking() => on_tick(&status),
                    Ok(_) => {
                        debug!("tracker idle, ticker exiting");
                        break;
                    }
                    Err(e) => warn!(error = %e, "tick failed"),
                }
            }
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    debug!("ticker cancelled");
                    break;
                }
            }
        }
    }

    tracker.shutdown(clock());
}
