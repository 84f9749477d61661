//! Task use-case service.
//!
//! Each operation is one direct store call; there is no lifecycle logic.

use crate::model::task::{Task, TaskDraft, TaskId, TaskValidationError};
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoError;
use crate::service::filter::ItemFilter;
use chrono::NaiveDateTime;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum TaskServiceError {
    Validation(TaskValidationError),
    Store(RepoError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidTask(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

impl From<TaskValidationError> for TaskServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Task service facade over repository implementations.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one incomplete task stamped with `now`.
    pub fn create_task(
        &self,
        owner: &str,
        draft: TaskDraft,
        now: NaiveDateTime,
    ) -> Result<Task, TaskServiceError> {
        let task = Task::from_draft(owner, draft, now);
        task.validate()?;
        self.repo.insert_task(&task).map_err(|err| {
            error!("event=task_create module=service status=error error={err}");
            TaskServiceError::from(err)
        })?;
        info!("event=task_create module=service status=ok");
        Ok(task)
    }

    /// Flips `completed`. Returns `None` when the task does not exist.
    pub fn toggle_task_completion(
        &self,
        owner: &str,
        id: TaskId,
    ) -> Result<Option<Task>, TaskServiceError> {
        let Some(mut task) = self.repo.get_task(owner, id)? else {
            return Ok(None);
        };
        task.completed = !task.completed;
        self.repo.set_task_completed(owner, id, task.completed)?;
        Ok(Some(task))
    }

    /// Deletes one task. Returns whether a row was removed.
    pub fn delete_task(&self, owner: &str, id: TaskId) -> Result<bool, TaskServiceError> {
        let removed = self.repo.delete_task(owner, id)?;
        Ok(removed > 0)
    }

    /// Lists the owner's tasks, newest first, restricted by `filter`.
    pub fn list_tasks(&self, owner: &str, filter: &ItemFilter) -> Result<Vec<Task>, TaskServiceError> {
        let tasks = self.repo.list_tasks(owner)?;
        Ok(tasks
            .into_iter()
            .filter(|task| filter.matches_task(task))
            .collect())
    }
}
