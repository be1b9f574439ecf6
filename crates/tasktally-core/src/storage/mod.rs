mod config;
pub mod json_file;
pub mod memory;

pub use config::{Config, PomodoroDefaults, TrackingConfig};
pub use json_file::JsonTaskFile;
pub use memory::MemoryRepository;

use std::path::PathBuf;

use crate::error::StorageError;
use crate::task::Task;

/// Persistence collaborator for the task collection.
///
/// `save_tasks` replaces the whole collection. Implementations must not
/// leave a partially written collection behind if they fail.
pub trait TaskRepository: Send {
    fn load_tasks(&self) -> Result<Vec<Task>, StorageError>;
    fn save_tasks(&mut self, tasks: &[Task]) -> Result<(), StorageError>;
}

/// Returns the tasktally data directory.
///
/// `TASKTALLY_HOME` overrides the location outright. Otherwise this is
/// `~/.config/tasktally`, or `~/.config/tasktally-dev` when
/// `TASKTALLY_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("TASKTALLY_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("TASKTALLY_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("tasktally-dev")
            } else {
                base_dir.join("tasktally")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
