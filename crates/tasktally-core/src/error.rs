//! Core error types for tasktally-core.
//!
//! Each concern gets its own thiserror enum. `TrackerError` is the one the
//! presentation layer sees; storage and config errors fold into it or are
//! returned directly by their own modules.

use std::path::PathBuf;
use thiserror::Error;

use crate::task::Timestamp;

/// Errors reported by the session tracker and the session store.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// A second task was started while another one is active.
    #[error("already tracking task '{active}'; stop it first")]
    AlreadyTracking { active: String },

    /// Pomodoro settings that would break the cycle arithmetic.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Close requested but the task has no open session.
    ///
    /// The tracker swallows this; it only escapes from direct store calls.
    #[error("task '{task_id}' has no open session")]
    NoOpenSession { task_id: String },

    /// The store refused to open a second session.
    #[error("session already open for task '{open_task}'")]
    InvariantViolation { open_task: String },

    /// No task with this id exists in the collection.
    #[error("unknown task '{0}'")]
    UnknownTask(String),

    /// A task with this id is already in the collection.
    #[error("task '{0}' already exists")]
    DuplicateTask(String),

    /// A manually entered session ends before it starts.
    #[error("session end {end} is before its start {start}")]
    InvalidInterval { start: Timestamp, end: Timestamp },

    /// The operation is not allowed on the task currently being tracked.
    #[error("task '{0}' is being tracked")]
    TaskActive(String),

    /// Persistence failed; in-memory state is still authoritative.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

/// Persistence-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the tasks file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tasks file is not valid JSON for the record layout
    #[error("malformed tasks file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Another process holds the tasks file
    #[error("{path} is in use by another tasktally process")]
    Locked { path: PathBuf },

    /// The data directory could not be determined or created
    #[error("data directory unavailable: {0}")]
    DataDir(String),

    /// Test doubles and non-file backends
    #[error("{0}")]
    Backend(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read configuration
    #[error("failed to read configuration from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write configuration
    #[error("failed to write configuration to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize configuration
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Key does not name a configuration value
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Value could not be converted to the key's type
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// The data directory could not be determined or created
    #[error("data directory unavailable: {0}")]
    DataDir(String),
}

/// Failures reported by an advice provider.
#[derive(Error, Debug)]
pub enum AdviceError {
    /// The provider could not be reached or is not ready
    #[error("advice provider unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for TrackerError
pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
