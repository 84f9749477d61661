//! Reminder domain model.
//!
//! # Responsibility
//! - Define one scheduled occurrence and its series back-reference.
//! - Validate occurrence records before they reach storage.
//!
//! # Invariants
//! - `id` is stable and never reused for another occurrence.
//! - A series root has `original_id = None`; every descendant points at the
//!   root, never at its direct parent.
//! - `original_id` never equals the occurrence's own `id`.

use crate::model::common::{normalize_title, Category, OwnerId, Priority};
use crate::model::recurrence::{RecurrenceError, RecurrenceRule};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one reminder occurrence.
pub type ReminderId = Uuid;

/// One concrete occurrence of a (possibly recurring) reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: ReminderId,
    pub title: String,
    pub description: Option<String>,
    /// Scheduled instant, timezone-naive local time.
    pub datetime: NaiveDateTime,
    pub completed: bool,
    pub priority: Priority,
    pub category: Category,
    pub recurrence: Option<RecurrenceRule>,
    /// Root occurrence id for every non-root member of a series.
    pub original_id: Option<ReminderId>,
    pub user_id: OwnerId,
}

/// Caller-supplied fields for creating a reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDraft {
    pub title: String,
    pub description: Option<String>,
    pub datetime: NaiveDateTime,
    pub priority: Priority,
    pub category: Category,
    pub recurrence: Option<RecurrenceRule>,
}

impl ReminderDraft {
    pub fn new(title: impl Into<String>, datetime: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            description: None,
            datetime,
            priority: Priority::Medium,
            category: Category::Other,
            recurrence: None,
        }
    }

    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Validation errors for reminder records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderValidationError {
    NilId,
    EmptyTitle,
    EmptyOwner,
    SelfReferencingSeries(ReminderId),
    Recurrence(RecurrenceError),
}

impl Display for ReminderValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "reminder id must not be nil"),
            Self::EmptyTitle => write!(f, "reminder title must not be empty"),
            Self::EmptyOwner => write!(f, "reminder owner must not be empty"),
            Self::SelfReferencingSeries(id) => {
                write!(f, "reminder {id} cannot be its own series root")
            }
            Self::Recurrence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReminderValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Recurrence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecurrenceError> for ReminderValidationError {
    fn from(value: RecurrenceError) -> Self {
        Self::Recurrence(value)
    }
}

impl Reminder {
    /// Builds a new series root from a draft with a generated id.
    ///
    /// Title whitespace is normalized and the recurrence rule receives its
    /// creation-time defaults. The result is not validated.
    pub fn from_draft(user_id: impl Into<OwnerId>, draft: ReminderDraft) -> Self {
        let recurrence = draft
            .recurrence
            .map(|rule| rule.normalized_for(draft.datetime));
        Self {
            id: Uuid::new_v4(),
            title: normalize_title(&draft.title),
            description: draft
                .description
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            datetime: draft.datetime,
            completed: false,
            priority: draft.priority,
            category: draft.category,
            recurrence,
            original_id: None,
            user_id: user_id.into(),
        }
    }

    /// Whether completing this occurrence can spawn a successor.
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Root id of the series this occurrence belongs to.
    pub fn series_id(&self) -> ReminderId {
        self.original_id.unwrap_or(self.id)
    }

    pub fn is_series_root(&self) -> bool {
        self.original_id.is_none()
    }

    pub fn validate(&self) -> Result<(), ReminderValidationError> {
        if self.id.is_nil() {
            return Err(ReminderValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(ReminderValidationError::EmptyTitle);
        }
        if self.user_id.trim().is_empty() {
            return Err(ReminderValidationError::EmptyOwner);
        }
        if self.original_id == Some(self.id) {
            return Err(ReminderValidationError::SelfReferencingSeries(self.id));
        }
        if let Some(rule) = &self.recurrence {
            rule.validate()?;
        }
        Ok(())
    }
}
