//! Task domain model.
//!
//! Tasks carry no lifecycle logic beyond create/toggle/delete.

use crate::model::common::{normalize_title, Category, OwnerId, Priority};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type TaskId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: NaiveDateTime,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub category: Category,
    pub user_id: OwnerId,
}

/// Caller-supplied fields for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub category: Category,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            due_date: None,
            priority: Priority::Medium,
            category: Category::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    NilId,
    EmptyTitle,
    EmptyOwner,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "task id must not be nil"),
            Self::EmptyTitle => write!(f, "task title must not be empty"),
            Self::EmptyOwner => write!(f, "task owner must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

impl Task {
    /// Builds a new incomplete task stamped with `created_at`.
    pub fn from_draft(user_id: impl Into<OwnerId>, draft: TaskDraft, created_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: normalize_title(&draft.title),
            description: draft
                .description
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            completed: false,
            created_at,
            due_date: draft.due_date,
            priority: draft.priority,
            category: draft.category,
            user_id: user_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        if self.user_id.trim().is_empty() {
            return Err(TaskValidationError::EmptyOwner);
        }
        Ok(())
    }
}
