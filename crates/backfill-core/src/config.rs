use std::path::{Path, PathBuf};

use chrono::Duration;
use chrono_tz::Tz;
use thiserror::Error;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;
/// The aggregation system stamps readings 15 minutes early.
pub const DEFAULT_SHIFT_MINUTES: i64 = 15;

pub const TIMEZONE_ENV: &str = "BACKFILL_TIMEZONE";
pub const SHIFT_MINUTES_ENV: &str = "BACKFILL_SHIFT_MINUTES";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid timezone '{value}': {reason}")]
    InvalidTimezone { value: String, reason: String },
    #[error("invalid shift '{value}': {reason}")]
    InvalidShift { value: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct PivotConfig {
    pub output_dir: PathBuf,
    pub timezone: Tz,
    pub shift: Duration,
}

impl PivotConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            timezone: DEFAULT_TIMEZONE,
            shift: Duration::minutes(DEFAULT_SHIFT_MINUTES),
        }
    }

    /// Defaults overridden by `BACKFILL_TIMEZONE` / `BACKFILL_SHIFT_MINUTES`.
    pub fn from_env(output_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::from_lookup(output_dir, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(output_dir: impl Into<PathBuf>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timezone = lookup(TIMEZONE_ENV);
        let shift = match lookup(SHIFT_MINUTES_ENV) {
            Some(raw) => Some(parse_shift_minutes(&raw)?),
            None => None,
        };
        Self::new(output_dir).apply_overrides(timezone.as_deref(), shift)
    }

    pub fn apply_overrides(
        mut self,
        timezone: Option<&str>,
        shift_minutes: Option<i64>,
    ) -> Result<Self, ConfigError> {
        if let Some(name) = timezone {
            self.timezone = parse_timezone(name)?;
        }
        if let Some(minutes) = shift_minutes {
            self.shift = shift_from_minutes(minutes)?;
        }
        Ok(self)
    }

    pub fn with_output_dir(mut self, output_dir: &Path) -> Self {
        self.output_dir = output_dir.to_path_buf();
        self
    }

    pub fn shift_minutes(&self) -> i64 {
        self.shift.num_minutes()
    }
}

pub fn parse_timezone(value: &str) -> Result<Tz, ConfigError> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|err| ConfigError::InvalidTimezone {
            value: value.to_string(),
            reason: err.to_string(),
        })
}

fn parse_shift_minutes(value: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|err| ConfigError::InvalidShift {
            value: value.to_string(),
            reason: err.to_string(),
        })
}

fn shift_from_minutes(minutes: i64) -> Result<Duration, ConfigError> {
    // A shift of a full day or more would move readings into another folder's range.
    if minutes.abs() >= 24 * 60 {
        return Err(ConfigError::InvalidShift {
            value: minutes.to_string(),
            reason: "shift must be less than one day".to_string(),
        });
    }
    Ok(Duration::minutes(minutes))
}
