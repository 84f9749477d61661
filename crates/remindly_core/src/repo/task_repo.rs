//! Task repository contract and SQLite implementation.
//!
//! Tasks are plain owner-scoped rows: insert, flip `completed`, delete.
//! Lists are ordered by `created_at DESC, id ASC`.

use crate::model::common::{Category, Priority};
use crate::model::task::{Task, TaskId};
use crate::repo::{
    bool_to_int, format_db_date, format_db_datetime, parse_db_bool, parse_db_date,
    parse_db_datetime, parse_db_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};
use std::borrow::Borrow;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    completed,
    created_at,
    due_date,
    priority,
    category,
    user_id
FROM tasks";

pub trait TaskRepository {
    fn insert_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn set_task_completed(&self, owner: &str, id: TaskId, completed: bool) -> RepoResult<()>;
    fn get_task(&self, owner: &str, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, owner: &str) -> RepoResult<Vec<Task>>;
    fn delete_task(&self, owner: &str, id: TaskId) -> RepoResult<usize>;
}

/// SQLite-backed task repository over a borrowed or owned connection.
pub struct SqliteTaskRepository<C = Connection> {
    conn: C,
}

impl<C: Borrow<Connection>> SqliteTaskRepository<C> {
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        self.conn.borrow()
    }
}

impl<C: Borrow<Connection>> TaskRepository for SqliteTaskRepository<C> {
    fn insert_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.connection().execute(
            "INSERT INTO tasks (
                id,
                title,
                description,
                completed,
                created_at,
                due_date,
                priority,
                category,
                user_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.description.as_deref(),
                bool_to_int(task.completed),
                format_db_datetime(task.created_at),
                task.due_date.map(format_db_date),
                task.priority.as_str(),
                task.category.as_str(),
                task.user_id.as_str(),
            ],
        )?;

        Ok(task.id)
    }

    fn set_task_completed(&self, owner: &str, id: TaskId, completed: bool) -> RepoResult<()> {
        let changed = self.connection().execute(
            "UPDATE tasks
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

    fn get_task(&self, owner: &str, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self.connection().prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE id = ?1
               AND user_id = ?2;"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), owner])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn list_tasks(&self, owner: &str) -> RepoResult<Vec<Task>> {
        let mut stmt = self.connection().prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, id ASC;"
        ))?;

        let mut rows = stmt.query([owner])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn delete_task(&self, owner: &str, id: TaskId) -> RepoResult<usize> {
        let changed = self.connection().execute(
            "DELETE FROM tasks
             WHERE id = ?1
               AND user_id = ?2;",
            params![id.to_string(), owner],
        )?;
        Ok(changed)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let created_text: String = row.get("created_at")?;
    let priority_text: String = row.get("priority")?;
    let category_text: String = row.get("category")?;

    let due_date = match row.get::<_, Option<String>>("due_date")? {
        Some(text) if !text.trim().is_empty() => Some(parse_db_date(&text, "tasks.due_date")?),
        _ => None,
    };

    let task = Task {
        id: parse_db_uuid(&id_text, "tasks.id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        completed: parse_db_bool(row.get("completed")?, "tasks.completed")?,
        created_at: parse_db_datetime(&created_text, "tasks.created_at")?,
        due_date,
        priority: Priority::parse(&priority_text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid priority `{priority_text}` in tasks.priority"))
        })?,
        category: Category::parse(&category_text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid category `{category_text}` in tasks.category"))
        })?,
        user_id: row.get("user_id")?,
    };
    task.validate()?;
    Ok(task)
}
