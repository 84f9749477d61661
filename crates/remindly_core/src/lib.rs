//! Core domain logic for Remindly.
//! Reminder recurrence, lifecycle control, and task bookkeeping live here;
//! front-ends only pass an owner id and render results.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod report;
pub mod schedule;
pub mod service;

pub use config::{ConfigError, SchedulerConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::common::{Category, OwnerId, Priority};
pub use model::recurrence::{Recurrence, RecurrenceError, RecurrenceRule, RecurrenceType};
pub use model::reminder::{Reminder, ReminderDraft, ReminderId, ReminderValidationError};
pub use model::task::{Task, TaskDraft, TaskId, TaskValidationError};
pub use notify::{
    DispatchError, LogDispatcher, Notification, NotificationDispatcher, RecordingDispatcher,
};
pub use repo::reminder_repo::{ReminderListQuery, ReminderRepository, SqliteReminderRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use report::export::{export, export_csv, export_json, ExportFormat};
pub use report::stats::Statistics;
pub use schedule::due_check::{DueCheckScheduler, SharedReminderService};
pub use schedule::engine::compute_next_occurrence;
pub use service::filter::{ItemFilter, StatusFilter};
pub use service::reminder_service::{
    DeleteMode, DeleteOutcome, DueCheckReport, ReminderService, ReminderServiceError,
    ReminderServiceResult, SeriesDeleteChoice, SuccessorOutcome, ToggleOutcome,
};
pub use service::task_service::{TaskService, TaskServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
