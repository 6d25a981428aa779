//! Configuration loader
//!
//! Loads application configuration with a layered strategy: every field has
//! a default, a config file can override the defaults, and environment
//! variables override both.
//!
//! ## Loading Strategy
//! 1. Start from [`Config::default`]
//! 2. If a config file is found, it replaces the defaults
//! 3. Environment variables override individual fields
//!
//! ## Environment Variables
//! - `TASKBRIDGE_CALENDAR_ID`: Calendar holding the timed work items
//! - `TASKBRIDGE_HISTORY_CALENDAR_ID`: Archive calendar for overdue events
//! - `TASKBRIDGE_LOOKBACK_HOURS`: Event fetch window, hours into the past
//! - `TASKBRIDGE_LOOKAHEAD_HOURS`: Event fetch window, hours into the future
//! - `TASKBRIDGE_TIMEZONE`: IANA timezone for all scheduling arithmetic
//! - `TASKBRIDGE_WORK_START` / `TASKBRIDGE_WORK_END`: Working hours (`HH:MM`)
//! - `TASKBRIDGE_PREFERRED_START` / `TASKBRIDGE_PREFERRED_END`: Preferred
//!   placement window (`HH:MM`)
//! - `TASKBRIDGE_WORKING_DAYS`: Comma-separated weekdays (`mon,tue,...`)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./taskbridge.json` or `./taskbridge.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names in the parent directory
//! 4. Relative to the executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use taskbridge_domain::{Config, Result, TaskbridgeError};

/// Load configuration with the layered fallback strategy.
///
/// A `.env` file is honored before the environment is read.
///
/// # Errors
/// Returns `TaskbridgeError::Config` if:
/// - A config file exists but cannot be read or parsed
/// - An environment override has an invalid value
pub fn load() -> Result<Config> {
    dotenvy::dotenv().ok();

    let base = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("no config file found, starting from defaults");
            Config::default()
        }
    };

    apply_env_overrides(base)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Supports both JSON
/// and TOML formats, detected by file extension.
///
/// # Errors
/// Returns `TaskbridgeError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TaskbridgeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TaskbridgeError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| TaskbridgeError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format detected by extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| TaskbridgeError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| TaskbridgeError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(TaskbridgeError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let names = ["taskbridge.json", "taskbridge.toml", "config.json", "config.toml"];
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for name in names {
            candidates.push(cwd.join(name));
        }
        for name in names {
            candidates.push(cwd.join("..").join(name));
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            for name in names {
                candidates.push(exe_dir.join(name));
            }
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Apply `TASKBRIDGE_*` environment overrides onto a base configuration.
fn apply_env_overrides(mut config: Config) -> Result<Config> {
    if let Some(calendar_id) = env_opt("TASKBRIDGE_CALENDAR_ID") {
        config.sync.calendar_id = calendar_id;
    }
    if let Some(history_id) = env_opt("TASKBRIDGE_HISTORY_CALENDAR_ID") {
        config.sync.history_calendar_id = Some(history_id);
    }
    if let Some(hours) = env_parse::<u32>("TASKBRIDGE_LOOKBACK_HOURS")? {
        config.sync.lookback_hours = hours;
    }
    if let Some(hours) = env_parse::<u32>("TASKBRIDGE_LOOKAHEAD_HOURS")? {
        config.sync.lookahead_hours = hours;
    }

    if let Some(timezone) = env_opt("TASKBRIDGE_TIMEZONE") {
        config.scheduling.timezone = Tz::from_str(&timezone)
            .map_err(|e| TaskbridgeError::Config(format!("Invalid timezone: {e}")))?;
    }
    if let Some(time) = env_time("TASKBRIDGE_WORK_START")? {
        config.scheduling.work_start = time;
    }
    if let Some(time) = env_time("TASKBRIDGE_WORK_END")? {
        config.scheduling.work_end = time;
    }
    if let Some(time) = env_time("TASKBRIDGE_PREFERRED_START")? {
        config.scheduling.preferred_start = time;
    }
    if let Some(time) = env_time("TASKBRIDGE_PREFERRED_END")? {
        config.scheduling.preferred_end = time;
    }
    if let Some(days) = env_opt("TASKBRIDGE_WORKING_DAYS") {
        config.scheduling.working_days = parse_working_days(&days)?;
    }

    Ok(config)
}

/// Read an environment variable, treating empty values as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Read and parse an optional environment variable.
fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| TaskbridgeError::Config(format!("Invalid value for {key}: {e}"))),
        None => Ok(None),
    }
}

/// Read an optional `HH:MM` (or `HH:MM:SS`) time-of-day variable.
fn env_time(key: &str) -> Result<Option<NaiveTime>> {
    match env_opt(key) {
        Some(value) => NaiveTime::parse_from_str(&value, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&value, "%H:%M:%S"))
            .map(Some)
            .map_err(|e| TaskbridgeError::Config(format!("Invalid time for {key}: {e}"))),
        None => Ok(None),
    }
}

/// Parse a comma-separated weekday list (`mon,tue,wed`).
fn parse_working_days(value: &str) -> Result<Vec<Weekday>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|day| !day.is_empty())
        .map(|day| {
            Weekday::from_str(day)
                .map_err(|_| TaskbridgeError::Config(format!("Invalid weekday: {day}")))
        })
        .collect()
}
