//! JSON/CSV export of task and reminder collections.
//!
//! # Invariants
//! - JSON export keeps the camelCase record shape of `Task`/`Reminder`.
//! - CSV export always writes the same ten columns, in a fixed order.
//! - CSV fields with a comma, quote, or line break are quoted.

use crate::model::recurrence::RecurrenceRule;
use crate::model::reminder::Reminder;
use crate::model::task::Task;
use serde::Serialize;

const CSV_HEADERS: [&str; 10] = [
    "id",
    "title",
    "description",
    "completed",
    "createdAt",
    "dueDate",
    "priority",
    "category",
    "datetime",
    "recurrence",
];

/// Supported export encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Json => "tasks-and-reminders.json",
            Self::Csv => "tasks-and-reminders.csv",
        }
    }
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    tasks: &'a [Task],
    reminders: &'a [Reminder],
}

/// Encodes both collections in the requested format.
pub fn export(format: ExportFormat, tasks: &[Task], reminders: &[Reminder]) -> Result<String, serde_json::Error> {
    match format {
        ExportFormat::Json => export_json(tasks, reminders),
        ExportFormat::Csv => Ok(export_csv(tasks, reminders)),
    }
}

/// Pretty-printed `{"tasks": [...], "reminders": [...]}` document.
pub fn export_json(tasks: &[Task], reminders: &[Reminder]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ExportDocument { tasks, reminders })
}

/// CSV with task rows first, then reminder rows.
pub fn export_csv(tasks: &[Task], reminders: &[Reminder]) -> String {
    let mut lines = Vec::with_capacity(1 + tasks.len() + reminders.len());
    lines.push(CSV_HEADERS.join(","));

    for task in tasks {
        lines.push(csv_row(&[
            task.id.to_string(),
            task.title.clone(),
            task.description.clone().unwrap_or_default(),
            completed_flag(task.completed),
            task.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            task.due_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            task.priority.as_str().to_string(),
            task.category.as_str().to_string(),
            String::new(),
            String::new(),
        ]));
    }

    for reminder in reminders {
        lines.push(csv_row(&[
            reminder.id.to_string(),
            reminder.title.clone(),
            reminder.description.clone().unwrap_or_default(),
            completed_flag(reminder.completed),
            String::new(),
            String::new(),
            reminder.priority.as_str().to_string(),
            reminder.category.as_str().to_string(),
            reminder.datetime.format("%Y-%m-%dT%H:%M:%S").to_string(),
            reminder
                .recurrence
                .as_ref()
                .map(RecurrenceRule::to_json)
                .unwrap_or_default(),
        ]));
    }

    lines.join("\n")
}

fn completed_flag(completed: bool) -> String {
    if completed { "1" } else { "0" }.to_string()
}

fn csv_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| escape_csv_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
