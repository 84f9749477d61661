//! Reminder repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped CRUD over the `reminders` table.
//! - Provide series-wide deletion (`id = S OR original_id = S`).
//!
//! # Invariants
//! - Write paths call `Reminder::validate()` before SQL mutations.
//! - Every statement binds `user_id`; rows of other owners are invisible.
//! - List results are ordered by `datetime ASC, id ASC`.

use crate::model::common::{Category, Priority};
use crate::model::recurrence::RecurrenceRule;
use crate::model::reminder::{Reminder, ReminderId};
use crate::repo::{
    bool_to_int, format_db_datetime, parse_db_bool, parse_db_datetime, parse_db_uuid, RepoError,
    RepoResult,
};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::borrow::Borrow;

const REMINDER_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    datetime,
    completed,
    priority,
    category,
    recurrence,
    original_id,
    user_id
FROM reminders";

/// Query options for listing reminders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderListQuery {
    /// `Some(flag)` keeps only rows whose `completed` equals `flag`.
    pub completed: Option<bool>,
    /// Restricts the result to one series (root + descendants).
    pub series_id: Option<ReminderId>,
    pub limit: Option<u32>,
}

/// Owner-scoped record store contract for reminders.
pub trait ReminderRepository {
    fn insert_reminder(&self, reminder: &Reminder) -> RepoResult<ReminderId>;
    /// Persists the completion flag of one occurrence.
    fn set_reminder_completed(
        &self,
        owner: &str,
        id: ReminderId,
        completed: bool,
    ) -> RepoResult<()>;
    fn get_reminder(&self, owner: &str, id: ReminderId) -> RepoResult<Option<Reminder>>;
    fn list_reminders(&self, owner: &str, query: &ReminderListQuery) -> RepoResult<Vec<Reminder>>;
    /// Finds a series member scheduled at the same instant as `datetime`.
    fn find_series_occurrence(
        &self,
        owner: &str,
        series_id: ReminderId,
        datetime: NaiveDateTime,
    ) -> RepoResult<Option<Reminder>>;
    /// Deletes one occurrence. Returns the number of removed rows (0 or 1).
    fn delete_reminder(&self, owner: &str, id: ReminderId) -> RepoResult<usize>;
    /// Deletes the root and every descendant of a series; returns removed ids.
    fn delete_series(&self, owner: &str, series_id: ReminderId) -> RepoResult<Vec<ReminderId>>;
}

/// SQLite-backed reminder repository.
///
/// Holds either a borrowed `&Connection` or an owned `Connection`, so the
/// same implementation serves short-lived call sites and long-lived
/// background schedulers.
pub struct SqliteReminderRepository<C = Connection> {
    conn: C,
}

impl<C: Borrow<Connection>> SqliteReminderRepository<C> {
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    /// Underlying connection, for callers sharing it with other repositories.
    pub fn connection(&self) -> &Connection {
        self.conn.borrow()
    }
}

impl<C: Borrow<Connection>> ReminderRepository for SqliteReminderRepository<C> {
    fn insert_reminder(&self, reminder: &Reminder) -> RepoResult<ReminderId> {
        reminder.validate()?;

        self.connection().execute(
            "INSERT INTO reminders (
                id,
                title,
                description,
                datetime,
                completed,
                priority,
                category,
                recurrence,
                original_id,
                user_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                reminder.id.to_string(),
                reminder.title.as_str(),
                reminder.description.as_deref(),
                format_db_datetime(reminder.datetime),
                bool_to_int(reminder.completed),
                reminder.priority.as_str(),
                reminder.category.as_str(),
                reminder.recurrence.as_ref().map(RecurrenceRule::to_json),
                reminder.original_id.map(|id| id.to_string()),
                reminder.user_id.as_str(),
            ],
        )?;

        Ok(reminder.id)
    }

    fn set_reminder_completed(
        &self,
        owner: &str,
        id: ReminderId,
        completed: bool,
    ) -> RepoResult<()> {
        let changed = self.connection().execute(
            "UPDATE reminders
             SET completed = ?1
             WHERE id = ?2
               AND user_id = ?3;",
            params![bool_to_int(completed), id.to_string(), owner],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_reminder(&self, owner: &str, id: ReminderId) -> RepoResult<Option<Reminder>> {
        let mut stmt = self.connection().prepare(&format!(
            "{REMINDER_SELECT_SQL}
             WHERE id = ?1
               AND user_id = ?2;"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), owner])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_reminder_row(row)?));
        }

        Ok(None)
    }

    fn list_reminders(&self, owner: &str, query: &ReminderListQuery) -> RepoResult<Vec<Reminder>> {
        let mut sql = format!("{REMINDER_SELECT_SQL} WHERE user_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(owner.to_string())];

        if let Some(completed) = query.completed {
            sql.push_str(" AND completed = ?");
            bind_values.push(Value::Integer(bool_to_int(completed)));
        }

        if let Some(series_id) = query.series_id {
            sql.push_str(" AND (id = ? OR original_id = ?)");
            bind_values.push(Value::Text(series_id.to_string()));
            bind_values.push(Value::Text(series_id.to_string()));
        }

        sql.push_str(" ORDER BY datetime ASC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.connection().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut reminders = Vec::new();

        while let Some(row) = rows.next()? {
            reminders.push(parse_reminder_row(row)?);
        }

        Ok(reminders)
    }

    fn find_series_occurrence(
        &self,
        owner: &str,
        series_id: ReminderId,
        datetime: NaiveDateTime,
    ) -> RepoResult<Option<Reminder>> {
        // Legacy rows may store `.000Z` or minutes-only text.
        let mut stmt = self.connection().prepare(&format!(
            "{REMINDER_SELECT_SQL}
             WHERE user_id = ?1
               AND (id = ?2 OR original_id = ?2)
               AND datetime(datetime) = datetime(?3)
             ORDER BY id ASC
             LIMIT 1;"
        ))?;

        let mut rows = stmt.query(params![
            owner,
            series_id.to_string(),
            format_db_datetime(datetime)
        ])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_reminder_row(row)?));
        }

        Ok(None)
    }

    fn delete_reminder(&self, owner: &str, id: ReminderId) -> RepoResult<usize> {
        let changed = self.connection().execute(
            "DELETE FROM reminders
             WHERE id = ?1
               AND user_id = ?2;",
            params![id.to_string(), owner],
        )?;
        Ok(changed)
    }

    fn delete_series(&self, owner: &str, series_id: ReminderId) -> RepoResult<Vec<ReminderId>> {
        let mut stmt = self.connection().prepare(
            "DELETE FROM reminders
             WHERE user_id = ?1
               AND (id = ?2 OR original_id = ?2)
             RETURNING id;",
        )?;

        let mut rows = stmt.query(params![owner, series_id.to_string()])?;
        let mut removed = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get(0)?;
            removed.push(parse_db_uuid(&id_text, "reminders.id")?);
        }

        Ok(removed)
    }
}

fn parse_reminder_row(row: &Row<'_>) -> RepoResult<Reminder> {
    let id_text: String = row.get("id")?;
    let id = parse_db_uuid(&id_text, "reminders.id")?;

    let datetime_text: String = row.get("datetime")?;
    let datetime = parse_db_datetime(&datetime_text, "reminders.datetime")?;

    let priority_text: String = row.get("priority")?;
    let priority = Priority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in reminders.priority"
        ))
    })?;

    let category_text: String = row.get("category")?;
    let category = Category::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in reminders.category"
        ))
    })?;

    let recurrence = match row.get::<_, Option<String>>("recurrence")? {
        Some(text) if !text.trim().is_empty() && text.trim() != "null" => {
            RecurrenceRule::from_json(&text).map_err(|err| {
                RepoError::InvalidData(format!("{err} in reminders.recurrence"))
            })?
        }
        _ => None,
    };

    let original_id = match row.get::<_, Option<String>>("original_id")? {
        Some(text) => Some(parse_db_uuid(&text, "reminders.original_id")?),
        None => None,
    };

    let reminder = Reminder {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        datetime,
        completed: parse_db_bool(row.get("completed")?, "reminders.completed")?,
        priority,
        category,
        recurrence,
        original_id,
        user_id: row.get("user_id")?,
    };
    reminder.validate()?;
    Ok(reminder)
}
