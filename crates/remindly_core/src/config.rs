//! Runtime configuration for due-checks and notifications.
//!
//! # Invariants
//! - `due_check_interval` is never zero (a zero tokio interval panics).
//! - `lookahead` is never zero; a zero window would never fire.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_DUE_CHECK_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_LOOKAHEAD: Duration = Duration::from_secs(60);
pub const DEFAULT_NOTIFICATION_ICON: &str = "/favicon.ico";
pub const DEFAULT_NOTIFICATION_BODY: &str = "Reminder time has come!";

/// Scheduler and notification settings for the reminder lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Cadence of the periodic due-check.
    pub due_check_interval: Duration,
    /// Window before `datetime` in which an advance notification fires.
    pub lookahead: Duration,
    pub notification_icon: String,
    /// Body used when a reminder has no description.
    pub default_body: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            due_check_interval: DEFAULT_DUE_CHECK_INTERVAL,
            lookahead: DEFAULT_LOOKAHEAD,
            notification_icon: DEFAULT_NOTIFICATION_ICON.to_string(),
            default_body: DEFAULT_NOTIFICATION_BODY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroDueCheckInterval,
    ZeroLookahead,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDueCheckInterval => write!(f, "due-check interval must be positive"),
            Self::ZeroLookahead => write!(f, "notification lookahead must be positive"),
        }
    }
}

impl Error for ConfigError {}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.due_check_interval.is_zero() {
            return Err(ConfigError::ZeroDueCheckInterval);
        }
        if self.lookahead.is_zero() {
            return Err(ConfigError::ZeroLookahead);
        }
        Ok(())
    }

    /// Lookahead window as a chrono delta for instant arithmetic.
    pub fn lookahead_delta(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.lookahead)
            .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_LOOKAHEAD.as_secs() as i64))
    }
}
