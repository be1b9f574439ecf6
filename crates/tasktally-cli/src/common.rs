//! Helpers shared by the subcommands.

use chrono::Timelike;
use tasktally_core::{
    now_local, parse_deadline, Config, JsonTaskFile, SessionTracker, Task, TaskRepository,
    Timestamp,
};
use tracing::debug;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Open the tracker over the configured tasks file.
///
/// Holds the file's lock until the tracker is dropped, so a concurrent
/// `track` or edit fails fast instead of overwriting this process's work.
pub fn open_tracker(config: &Config) -> CliResult<SessionTracker<JsonTaskFile>> {
    let path = config.tasks_path()?;
    debug!(path = %path.display(), "opening tasks file");
    let file = JsonTaskFile::open_locked(path)?;
    Ok(SessionTracker::open(file, now_local())?)
}

/// Read the task collection without locking or writing it.
pub fn load_tasks(config: &Config) -> CliResult<Vec<Task>> {
    let path = config.tasks_path()?;
    debug!(path = %path.display(), "reading tasks file");
    Ok(JsonTaskFile::new(path).load_tasks()?)
}

pub fn deadline_arg(raw: &str) -> Result<Timestamp, String> {
    parse_deadline(raw)
        .ok_or_else(|| format!("invalid deadline '{raw}' (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)"))
}

pub fn timestamp_arg(raw: &str) -> Result<Timestamp, String> {
    raw.parse::<Timestamp>()
        .map(|ts| ts.with_nanosecond(0).unwrap_or(ts))
        .map_err(|_| format!("invalid time '{raw}' (expected YYYY-MM-DDTHH:MM:SS)"))
}

/// Look a task up by id, or by id prefix when that is unambiguous.
pub fn resolve_task<'a>(tasks: &'a [Task], key: &str) -> CliResult<&'a Task> {
    if let Some(task) = tasks.iter().find(|t| t.id() == key) {
        return Ok(task);
    }
    let mut matches = tasks.iter().filter(|t| t.id().starts_with(key));
    match (matches.next(), matches.next()) {
        (Some(task), None) => Ok(task),
        (Some(_), Some(_)) => Err(format!("task id prefix '{key}' is ambiguous").into()),
        (None, _) => Err(format!("unknown task '{key}'").into()),
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
