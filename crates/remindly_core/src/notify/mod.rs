//! Notification dispatcher contract.
//!
//! # Responsibility
//! - Define the seam between reminder lifecycle and the delivery channel
//!   (local notification, push, terminal output).
//! - Keep dispatch failures away from reminder state.
//!
//! # Invariants
//! - Dispatch is fire-and-forget; no delivery confirmation is tracked.
//! - Dispatch errors are logged and swallowed by `dispatch_best_effort`.

use crate::config::SchedulerConfig;
use crate::model::reminder::Reminder;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;

/// One notification as handed to a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
}

impl Notification {
    /// Builds the notification shown for a reminder occurrence.
    pub fn for_reminder(reminder: &Reminder, config: &SchedulerConfig) -> Self {
        let body = reminder
            .description
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(config.default_body.as_str())
            .to_string();
        Self {
            title: reminder.title.clone(),
            body,
            icon: Some(config.notification_icon.clone()).filter(|icon| !icon.is_empty()),
        }
    }
}

/// Delivery failures reported by dispatchers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    PermissionDenied,
    Unsupported,
    Failed(String),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "notification permission denied"),
            Self::Unsupported => write!(f, "notifications unsupported in this environment"),
            Self::Failed(message) => write!(f, "notification dispatch failed: {message}"),
        }
    }
}

impl Error for DispatchError {}

/// Delivery channel for reminder notifications.
pub trait NotificationDispatcher: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), DispatchError>;
}

/// Dispatches and swallows failures. Returns whether delivery was accepted.
pub fn dispatch_best_effort(
    dispatcher: &dyn NotificationDispatcher,
    notification: &Notification,
) -> bool {
    match dispatcher.notify(notification) {
        Ok(()) => true,
        Err(err) => {
            warn!("event=notify module=notify status=error error={err}");
            false
        }
    }
}

/// Dispatcher that writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

impl NotificationDispatcher for LogDispatcher {
    fn notify(&self, notification: &Notification) -> Result<(), DispatchError> {
        info!(
            "event=notify module=notify status=ok channel=log title_chars={}",
            notification.title.chars().count()
        );
        Ok(())
    }
}

/// In-memory dispatcher that records every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of delivered notifications in dispatch order.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn notify(&self, notification: &Notification) -> Result<(), DispatchError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| DispatchError::Failed("recording dispatcher poisoned".to_string()))?;
        sent.push(notification.clone());
        Ok(())
    }
}
