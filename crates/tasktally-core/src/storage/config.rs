//! TOML-based application configuration.
//!
//! Stores:
//! - Pomodoro defaults applied to newly created tasks
//! - Tracking options (tasks file location, default budget)
//! - The default log filter
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::task::{PomodoroSettings, Task};

/// Pomodoro settings given to new tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PomodoroDefaults {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_work")]
    pub work_min: u32,
    #[serde(default = "default_break")]
    pub break_min: u32,
    #[serde(default = "default_long")]
    pub long_break_min: u32,
    #[serde(default = "default_cycles")]
    pub cycles_before_long: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Overrides `<data_dir>/tasks.json`.
    #[serde(default)]
    pub tasks_file: Option<PathBuf>,
    /// Budget in minutes for new tasks.
    #[serde(default = "default_time_allocated")]
    pub default_time_allocated: u32,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// `tracing` filter directive used when `TASKTALLY_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub pomodoro: PomodoroDefaults,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

fn default_work() -> u32 {
    25
}
fn default_break() -> u32 {
    5
}
fn default_long() -> u32 {
    15
}
fn default_cycles() -> u32 {
    4
}
fn default_time_allocated() -> u32 {
    60
}
fn default_log_filter() -> String {
    "info".into()
}

impl Default for PomodoroDefaults {
    fn default() -> Self {
        Self {
            enabled: false,
            work_min: default_work(),
            break_min: default_break(),
            long_break_min: default_long(),
            cycles_before_long: default_cycles(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tasks_file: None,
            default_time_allocated: default_time_allocated(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            pomodoro: PomodoroDefaults::default(),
            tracking: TrackingConfig::default(),
        }
    }
}

impl PomodoroDefaults {
    pub fn settings(&self) -> PomodoroSettings {
        PomodoroSettings {
            work_min: self.work_min,
            break_min: self.break_min,
            long_break_min: self.long_break_min,
            cycles_before_long: self.cycles_before_long,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }
        key.split('.').try_fold(root, |current, part| current.get(part))
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut parent = root;
        if let Some(path) = parent_path {
            for part in path.split('.') {
                parent = parent.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = parent.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => value
                .parse::<u64>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
            _ => serde_json::Value::String(value.into()),
        };
        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|d| d.join("config.toml"))
            .map_err(|e| ConfigError::DataDir(e.to_string()))
    }

    /// Load from `<data_dir>/config.toml`, writing defaults if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Persist to `<data_dir>/config.toml`.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::get_json_value_by_path(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Where the task collection lives.
    pub fn tasks_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.tracking.tasks_file {
            Some(path) => Ok(path.clone()),
            None => data_dir()
                .map(|d| d.join("tasks.json"))
                .map_err(|e| ConfigError::DataDir(e.to_string())),
        }
    }

    /// A new task carrying the configured defaults.
    pub fn new_task(&self, title: impl Into<String>) -> Task {
        let mut task = Task::new(title);
        task.time_allocated = self.tracking.default_time_allocated;
        task.use_pomodoro = self.pomodoro.enabled;
        task.pomodoro = self.pomodoro.settings();
        task
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.tracking.default_time_allocated, 60);
        assert_eq!(parsed.pomodoro.cycles_before_long, 4);
        assert!(parsed.tracking.tasks_file.is_none());
    }

    #[test]
    fn retired_tick_interval_key_is_ignored() {
        let parsed: Config =
            toml::from_str("[tracking]\ntick_interval_secs = 5\ndefault_time_allocated = 30\n")
                .unwrap();
        assert_eq!(parsed.tracking.default_time_allocated, 30);
        assert!(parsed.get("tracking.tick_interval_secs").is_none());
        assert!(!toml::to_string_pretty(&parsed).unwrap().contains("tick_interval"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[pomodoro]\nwork_min = 50\n").unwrap();
        assert_eq!(parsed.pomodoro.work_min, 50);
        assert_eq!(parsed.pomodoro.break_min, 5);
        assert_eq!(parsed.log_filter, "info");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("pomodoro.enabled").as_deref(), Some("false"));
        assert_eq!(cfg.get("tracking.default_time_allocated").as_deref(), Some("60"));
        assert_eq!(cfg.get("log_filter").as_deref(), Some("info"));
        assert!(cfg.get("pomodoro.missing").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("pomodoro.enabled", "true").unwrap();
        cfg.set("pomodoro.work_min", "45").unwrap();
        cfg.set("tracking.tasks_file", "/tmp/elsewhere.json").unwrap();
        assert!(cfg.pomodoro.enabled);
        assert_eq!(cfg.pomodoro.work_min, 45);
        assert_eq!(
            cfg.tracking.tasks_file.as_deref(),
            Some(Path::new("/tmp/elsewhere.json"))
        );
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("pomodoro.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("pomodoro.work_min", "-3"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg.pomodoro.work_min, 25);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn new_task_uses_defaults() {
        let mut cfg = Config::default();
        cfg.pomodoro.enabled = true;
        cfg.pomodoro.cycles_before_long = 2;
        let task = cfg.new_task("Draft");
        assert!(task.use_pomodoro);
        assert_eq!(task.pomodoro.cycles_before_long, 2);
        assert_eq!(task.time_allocated, 60);
    }
}
