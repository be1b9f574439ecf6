//! JSON file persistence for the task collection.
//!
//! The file holds a JSON array of task records. Saves go to a sibling
//! temporary file which is then renamed over the target, so readers only
//! ever see the previous or the new collection.
//!
//! Writers take an exclusive advisory lock on `<file>.lock` for as long as
//! the [`JsonTaskFile`] lives, so two processes can never both load, edit
//! and overwrite the same collection.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use super::TaskRepository;
use crate::error::StorageError;
use crate::task::Task;

#[derive(Debug)]
pub struct JsonTaskFile {
    path: PathBuf,
    /// Held open while locked; the lock is released when it is dropped.
    lock: Option<File>,
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.to_path_buf().into_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

impl JsonTaskFile {
    /// Unlocked handle, for reading.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: None,
        }
    }

    /// Handle holding the exclusive lock on `path` until dropped.
    ///
    /// # Errors
    /// `Locked` if another handle (in this or another process) holds it.
    pub fn open_locked(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let lock_path = sibling(&path, ".lock");
        let io_err = |source| StorageError::Io {
            path: lock_path.clone(),
            source,
        };
        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_err)?;
        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                return Err(StorageError::Locked { path });
            }
            Err(e) => return Err(io_err(e)),
        }
        // The lock file stays on disk; deleting it would let a waiting
        // process lock a different inode.
        debug!(path = %lock_path.display(), "tasks file locked");
        Ok(Self {
            path,
            lock: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// Where the file is copied when a load had to skip records.
    pub fn backup_path(&self) -> PathBuf {
        sibling(&self.path, ".bak")
    }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TaskRepository for JsonTaskFile {
    /// A missing file is an empty collection. Individual records that fail
    /// to parse are skipped with a warning, and the file as read is copied
    /// to [`JsonTaskFile::backup_path`] before a later save drops them. A
    /// file that is not a JSON array at all is an error.
    fn load_tasks(&self) -> Result<Vec<Task>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_err(e)),
        };

        let records: Vec<serde_json::Value> =
            serde_json::from_str(&content).map_err(|source| StorageError::Json {
                path: self.path.clone(),
                source,
            })?;

        let mut tasks = Vec::with_capacity(records.len());
        let mut skipped = 0usize;
        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Task>(record) {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    skipped += 1;
                    warn!(index, error = %e, path = %self.path.display(), "skipping malformed task record");
                }
            }
        }
        if skipped > 0 {
            let backup = self.backup_path();
            match fs::write(&backup, &content) {
                Ok(()) => warn!(skipped, backup = %backup.display(), "original tasks file backed up"),
                Err(e) => warn!(skipped, error = %e, "could not back up tasks file"),
            }
        }
        debug!(count = tasks.len(), path = %self.path.display(), "tasks loaded");
        Ok(tasks)
    }

    fn save_tasks(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }

        let json = serde_json::to_string_pretty(tasks).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;

        let tmp = sibling(&self.path, ".tmp");
        fs::write(&tmp, json).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        debug!(count = tasks.len(), path = %self.path.display(), "tasks saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ts(s: &str) -> crate::task::Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn missing_file_is_empty_collection() {
        let dir = TempDir::new().unwrap();
        let repo = JsonTaskFile::new(dir.path().join("tasks.json"));
        assert!(repo.load_tasks().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut repo = JsonTaskFile::new(dir.path().join("nested/tasks.json"));

        let mut task = Task::with_id("t-1", "Read paper");
        task.time_allocated = 90;
        task.use_pomodoro = true;
        task.deadline = Some(ts("2024-06-01T18:00:00"));
        task.record_session(ts("2024-05-01T09:00:00"), ts("2024-05-01T09:25:00"));

        repo.save_tasks(std::slice::from_ref(&task)).unwrap();
        let loaded = repo.load_tasks().unwrap();
        assert_eq!(loaded, vec![task]);
        assert!(!dir.path().join("nested/tasks.json.tmp").exists());
    }

    #[test]
    fn save_of_loaded_collection_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let mut repo = JsonTaskFile::new(dir.path().join("tasks.json"));
        let mut a = Task::with_id("a", "A");
        a.record_session(ts("2024-05-01T09:00:00"), ts("2024-05-01T09:25:00"));
        repo.save_tasks(&[a, Task::with_id("b", "B")]).unwrap();

        let first = fs::read_to_string(repo.path()).unwrap();
        let loaded = repo.load_tasks().unwrap();
        repo.save_tasks(&loaded).unwrap();
        let second = fs::read_to_string(repo.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(
            &path,
            r#"[{"id": "ok", "title": "Fine"}, {"title": "no id"}, {"id": "x", "title": "Bad", "sessions": [{"start": "yesterday"}]}]"#,
        )
        .unwrap();
        let repo = JsonTaskFile::new(&path);
        let tasks = repo.load_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id(), "ok");
        assert_eq!(
            fs::read_to_string(repo.backup_path()).unwrap(),
            fs::read_to_string(&path).unwrap()
        );
    }

    #[test]
    fn clean_load_writes_no_backup() {
        let dir = TempDir::new().unwrap();
        let mut repo = JsonTaskFile::new(dir.path().join("tasks.json"));
        repo.save_tasks(&[Task::with_id("a", "A")]).unwrap();
        repo.load_tasks().unwrap();
        assert!(!repo.backup_path().exists());
    }

    #[test]
    fn second_lock_on_same_file_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let first = JsonTaskFile::open_locked(&path).unwrap();
        assert!(first.is_locked());
        assert!(matches!(
            JsonTaskFile::open_locked(&path),
            Err(StorageError::Locked { .. })
        ));

        drop(first);
        assert!(JsonTaskFile::open_locked(&path).is_ok());
    }

    #[test]
    fn non_array_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{not json").unwrap();
        let err = JsonTaskFile::new(&path).load_tasks().unwrap_err();
        assert!(matches!(err, StorageError::Json { .. }));
    }
}
