//! Record store abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define owner-scoped data access contracts for tasks and reminders.
//! - Isolate SQLite query details from lifecycle orchestration.
//!
//! # Invariants
//! - Every query and mutation is filtered by `user_id`.
//! - Write paths validate records before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod reminder_repo;
pub mod task_repo;

use crate::db::DbError;
use crate::model::reminder::ReminderValidationError;
use crate::model::task::TaskValidationError;
use chrono::{NaiveDate, NaiveDateTime};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DB_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DB_DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    InvalidReminder(ReminderValidationError),
    InvalidTask(TaskValidationError),
    Db(DbError),
    NotFound(Uuid),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidReminder(err) => write!(f, "{err}"),
            Self::InvalidTask(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidReminder(err) => Some(err),
            Self::InvalidTask(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ReminderValidationError> for RepoError {
    fn from(value: ReminderValidationError) -> Self {
        Self::InvalidReminder(value)
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::InvalidTask(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Formats a naive local instant for storage; lexical order equals time order.
pub(crate) fn format_db_datetime(value: NaiveDateTime) -> String {
    value.format(DB_DATETIME_FORMAT).to_string()
}

/// Parses a stored instant, tolerating fractional seconds and a trailing `Z`.
pub(crate) fn parse_db_datetime(value: &str, column: &str) -> RepoResult<NaiveDateTime> {
    let trimmed = value.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .map_err(|_| RepoError::InvalidData(format!("invalid datetime `{value}` in {column}")))
}

pub(crate) fn format_db_date(value: NaiveDate) -> String {
    value.format(DB_DATE_FORMAT).to_string()
}

pub(crate) fn parse_db_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DB_DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

pub(crate) fn parse_db_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_db_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
