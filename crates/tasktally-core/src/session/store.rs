//! Session store implementation.
//!
//! Invariant: at most one session across the whole collection is open, and
//! when one is, `open` points at it. Every path that opens or closes a
//! session goes through this type, so the invariant is checked in O(1)
//! instead of by scanning task histories.

use tracing::{debug, warn};

use crate::error::{Result, TrackerError};
use crate::task::{Session, Task, Timestamp};

/// Location of the open session inside the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSession {
    pub task_id: String,
    pub index: usize,
}

/// Ordered task collection plus the open-session reference.
#[derive(Debug, Default)]
pub struct SessionStore {
    tasks: Vec<Task>,
    open: Option<OpenSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a loaded collection.
    ///
    /// Sessions left open by a process that died without shutting down are
    /// closed at `at`. Returns the store and how many were closed.
    pub fn recover(tasks: Vec<Task>, at: Timestamp) -> (Self, usize) {
        let mut store = Self { tasks, open: None };
        let closed = store.close_all_open(at);
        if closed > 0 {
            warn!(closed, %at, "closed sessions left open by a previous run");
        }
        (store, closed)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == task_id)
    }

    pub fn open_session(&self) -> Option<&OpenSession> {
        self.open.as_ref()
    }

    /// The open session itself, resolved through the reference.
    pub fn current(&self) -> Option<&Session> {
        let open = self.open.as_ref()?;
        self.get(&open.task_id)?.sessions().get(open.index)
    }

    /// Count open sessions by scanning every task. Used to audit the
    /// invariant; the tracker itself relies on `open_session`.
    pub fn count_open(&self) -> usize {
        self.tasks
            .iter()
            .flat_map(|t| t.sessions())
            .filter(|s| s.is_open())
            .count()
    }

    // ── Session commands ─────────────────────────────────────────────

    /// Append an open session to `task_id`.
    ///
    /// Fails if any session in the collection is already open.
    pub fn open(&mut self, task_id: &str, start: Timestamp) -> Result<()> {
        if let Some(open) = &self.open {
            return Err(TrackerError::InvariantViolation {
                open_task: open.task_id.clone(),
            });
        }
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id() == task_id)
            .ok_or_else(|| TrackerError::UnknownTask(task_id.to_string()))?;
        let sessions = task.sessions_mut();
        sessions.push(Session { start, end: None });
        self.open = Some(OpenSession {
            task_id: task_id.to_string(),
            index: sessions.len() - 1,
        });
        debug!(task_id, %start, "session opened");
        Ok(())
    }

    /// Close the open session of `task_id` and return a copy of it.
    pub fn close(&mut self, task_id: &str, end: Timestamp) -> Result<Session> {
        let open = match &self.open {
            Some(open) if open.task_id == task_id => open.clone(),
            _ => {
                return Err(TrackerError::NoOpenSession {
                    task_id: task_id.to_string(),
                })
            }
        };
        let session = self
            .tasks
            .iter_mut()
            .find(|t| t.id() == task_id)
            .and_then(|t| t.sessions_mut().get_mut(open.index))
            .ok_or_else(|| TrackerError::NoOpenSession {
                task_id: task_id.to_string(),
            })?;
        session.end = Some(end);
        let closed = session.clone();
        self.open = None;
        debug!(task_id, %end, "session closed");
        Ok(closed)
    }

    /// Close every open session in the collection at `end`.
    ///
    /// Sweeps all tasks rather than trusting the reference, because it also
    /// runs over freshly loaded data. Returns the number closed.
    pub fn close_all_open(&mut self, end: Timestamp) -> usize {
        let mut closed = 0;
        for task in &mut self.tasks {
            for session in task.sessions_mut().iter_mut().filter(|s| s.is_open()) {
                session.end = Some(end);
                closed += 1;
            }
        }
        self.open = None;
        closed
    }

    // ── Collection commands ──────────────────────────────────────────

    /// Add a task to the end of the collection.
    pub fn insert(&mut self, task: Task) -> Result<()> {
        if self.get(task.id()).is_some() {
            return Err(TrackerError::DuplicateTask(task.id().to_string()));
        }
        if task.sessions().iter().any(Session::is_open) {
            return Err(TrackerError::InvariantViolation {
                open_task: task.id().to_string(),
            });
        }
        task.validate()?;
        self.tasks.push(task);
        Ok(())
    }

    /// Apply `edit` to a copy of the task and keep it only if it validates.
    ///
    /// The id and session history cannot be changed this way.
    pub fn update<F>(&mut self, task_id: &str, edit: F) -> Result<&Task>
    where
        F: FnOnce(&mut Task),
    {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id() == task_id)
            .ok_or_else(|| TrackerError::UnknownTask(task_id.to_string()))?;

        let mut draft = task.clone();
        edit(&mut draft);
        draft.validate()?;

        let mut updated = Task::with_id(task.id(), draft.title.clone());
        updated.description = draft.description;
        updated.deadline = draft.deadline;
        updated.is_completed = draft.is_completed;
        updated.time_allocated = draft.time_allocated;
        updated.use_pomodoro = draft.use_pomodoro;
        updated.pomodoro = draft.pomodoro;
        *updated.sessions_mut() = std::mem::take(task.sessions_mut());
        *task = updated;
        Ok(&*task)
    }

    /// Append a finished interval to a task's history.
    pub fn record(&mut self, task_id: &str, start: Timestamp, end: Timestamp) -> Result<()> {
        if end < start {
            return Err(TrackerError::InvalidInterval { start, end });
        }
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id() == task_id)
            .ok_or_else(|| TrackerError::UnknownTask(task_id.to_string()))?;
        task.record_session(start, end);
        Ok(())
    }

    /// Remove a task. Refused while it holds the open session.
    pub fn remove(&mut self, task_id: &str) -> Result<Task> {
        if matches!(&self.open, Some(open) if open.task_id == task_id) {
            return Err(TrackerError::TaskActive(task_id.to_string()));
        }
        let pos = self
            .tasks
            .iter()
            .position(|t| t.id() == task_id)
            .ok_or_else(|| TrackerError::UnknownTask(task_id.to_string()))?;
        Ok(self.tasks.remove(pos))
    }
}
