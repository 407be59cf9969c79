//! Runtime configuration from environment variables.
//!
//! # Responsibility
//! - Read `STANDUP_*` settings with defaults and validation.
//! - Keep parsing testable through an injectable key lookup.
//!
//! # Invariants
//! - A loaded config is always internally valid (limit range, absolute log
//!   dir, positive TTL, parseable reminder time).

use crate::logging::{default_log_level, normalize_level, normalize_log_dir};
use crate::reminder::ReminderSchedule;
use crate::service::cursor::DEFAULT_CURSOR_TTL;
use crate::service::standup_service::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DB_PATH: &str = "STANDUP_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "STANDUP_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "STANDUP_LOG_DIR";
pub const ENV_PAGE_LIMIT: &str = "STANDUP_PAGE_LIMIT";
pub const ENV_CURSOR_TTL_SECS: &str = "STANDUP_CURSOR_TTL_SECS";
pub const ENV_REMINDER_TIME: &str = "STANDUP_REMINDER_TIME";
pub const ENV_CHANNEL_ID: &str = "STANDUP_CHANNEL_ID";

const DEFAULT_DB_FILE_NAME: &str = "standup.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(key: &'static str, value: &str, message: impl Into<String>) -> Self {
        Self {
            key,
            value: value.to_string(),
            message: message.into(),
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} `{}`: {}", self.key, self.value, self.message)
    }
}

impl Error for ConfigError {}

/// Effective settings for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandupConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
    /// Default page size for summary/next requests.
    pub page_limit: i64,
    pub cursor_ttl: Duration,
    pub reminder: ReminderSchedule,
    /// Channel whose members receive reminders. Embedders pass it to
    /// [`crate::reminder::dispatch_reminders`] with their own gateway.
    pub channel_id: Option<String>,
}

impl Default for StandupConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
            page_limit: DEFAULT_PAGE_LIMIT,
            cursor_ttl: DEFAULT_CURSOR_TTL,
            reminder: ReminderSchedule::default(),
            channel_id: None,
        }
    }
}

impl StandupConfig {
    /// Loads settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(value) = get(ENV_DB_PATH) {
            config.db_path = PathBuf::from(value);
        }

        if let Some(value) = get(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&value)
                .map_err(|err| ConfigError::new(ENV_LOG_LEVEL, &value, err.to_string()))?;
        }

        if let Some(value) = get(ENV_LOG_DIR) {
            let dir = normalize_log_dir(Path::new(&value))
                .map_err(|err| ConfigError::new(ENV_LOG_DIR, &value, err.to_string()))?;
            config.log_dir = Some(dir);
        }

        if let Some(value) = get(ENV_PAGE_LIMIT) {
            config.page_limit = match value.parse::<i64>() {
                Ok(limit) if (1..=MAX_PAGE_LIMIT).contains(&limit) => limit,
                _ => {
                    return Err(ConfigError::new(
                        ENV_PAGE_LIMIT,
                        &value,
                        format!("expected an integer between 1 and {MAX_PAGE_LIMIT}"),
                    ));
                }
            };
        }

        if let Some(value) = get(ENV_CURSOR_TTL_SECS) {
            config.cursor_ttl = match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::new(
                        ENV_CURSOR_TTL_SECS,
                        &value,
                        "expected a positive number of seconds",
                    ));
                }
            };
        }

        if let Some(value) = get(ENV_REMINDER_TIME) {
            config.reminder = ReminderSchedule::parse(&value)
                .map_err(|err| ConfigError::new(ENV_REMINDER_TIME, &value, err.to_string()))?;
        }

        config.channel_id = get(ENV_CHANNEL_ID);

        Ok(config)
    }
}
