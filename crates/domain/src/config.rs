//! Configuration management
//!
//! All configuration is an explicit value threaded into the core calls.
//! Nothing in the engine reads ambient environment state; the infra loader
//! is the only place environment variables are consulted.

use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub sync: SyncConfig,
    pub scheduling: SchedulingConfig,
}

/// Snapshot-fetch and cross-system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Calendar holding the timed work items.
    pub calendar_id: String,
    /// Secondary calendar receiving archived copies of overdue events.
    /// Copy-to-history is a no-op when unset.
    pub history_calendar_id: Option<String>,
    /// How far back events are fetched, in hours.
    pub lookback_hours: u32,
    /// How far forward events are fetched, in hours.
    pub lookahead_hours: u32,
}

/// Slot-placement settings for the scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Timezone all day-boundary and window arithmetic happens in.
    pub timezone: Tz,
    /// Start of the full working-hours window.
    pub work_start: NaiveTime,
    /// End of the full working-hours window.
    pub work_end: NaiveTime,
    /// Start of the narrowed preferred window tried before the full window.
    pub preferred_start: NaiveTime,
    /// End of the narrowed preferred window.
    pub preferred_end: NaiveTime,
    /// Days eligible for placement; all other days are skipped.
    pub working_days: Vec<Weekday>,
}

impl Default for Config {
    fn default() -> Self {
        Self { sync: SyncConfig::default(), scheduling: SchedulingConfig::default() }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            calendar_id: "primary".to_string(),
            history_calendar_id: None,
            lookback_hours: 72,
            lookahead_hours: 336,
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            work_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            work_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            preferred_start: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
            preferred_end: NaiveTime::from_hms_opt(15, 0, 0).unwrap_or(NaiveTime::MIN),
            working_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }
}

impl SchedulingConfig {
    /// Whether the given weekday is eligible for slot placement.
    #[must_use]
    pub fn is_working_day(&self, day: Weekday) -> bool {
        self.working_days.contains(&day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_business_week() {
        let config = SchedulingConfig::default();

        assert!(config.is_working_day(Weekday::Mon));
        assert!(config.is_working_day(Weekday::Fri));
        assert!(!config.is_working_day(Weekday::Sat));
        assert!(!config.is_working_day(Weekday::Sun));
    }

    #[test]
    fn preferred_window_is_inside_working_hours() {
        let config = SchedulingConfig::default();

        assert!(config.preferred_start >= config.work_start);
        assert!(config.preferred_end <= config.work_end);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let rendered = toml::to_string(&config).expect("serialize default config");
        let parsed: Config = toml::from_str(&rendered).expect("parse rendered config");

        assert_eq!(parsed.sync.calendar_id, config.sync.calendar_id);
        assert_eq!(parsed.scheduling.timezone, config.scheduling.timezone);
    }
}
