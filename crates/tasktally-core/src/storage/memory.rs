//! In-memory task repository.
//!
//! Clones share the same backing collection, so a test can hand one clone
//! to a tracker and inspect what was saved through another.

use std::sync::{Arc, Mutex};

use super::TaskRepository;
use crate::error::StorageError;
use crate::task::Task;

#[derive(Debug, Default)]
struct Inner {
    tasks: Vec<Task>,
    saves: usize,
    fail_saves: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let repo = Self::new();
        if let Ok(mut inner) = repo.inner.lock() {
            inner.tasks = tasks;
        }
        repo
    }

    /// Last saved collection.
    pub fn snapshot(&self) -> Vec<Task> {
        self.inner.lock().map(|i| i.tasks.clone()).unwrap_or_default()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.inner.lock().map(|i| i.saves).unwrap_or(0)
    }

    /// Make subsequent saves fail until switched back.
    pub fn set_fail_saves(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_saves = fail;
        }
    }
}

impl TaskRepository for MemoryRepository {
    fn load_tasks(&self) -> Result<Vec<Task>, StorageError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StorageError::Backend("memory repository poisoned".into()))?;
        Ok(inner.tasks.clone())
    }

    fn save_tasks(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StorageError::Backend("memory repository poisoned".into()))?;
        if inner.fail_saves {
            return Err(StorageError::Backend("simulated save failure".into()));
        }
        inner.tasks = tasks.to_vec();
        inner.saves += 1;
        Ok(())
    }
}
