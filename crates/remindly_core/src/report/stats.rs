//! Aggregate counters over an owner's tasks and reminders.
//!
//! # Invariants
//! - Rates are whole percentages; an empty collection yields 0.
//! - Category/priority buckets only list values with at least one task.
//! - Weekday buckets are Sunday-first and always have 7 entries.

use crate::model::common::{Category, Priority};
use crate::model::reminder::Reminder;
use crate::model::task::Task;
use chrono::Datelike;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub task_completion_rate: u32,
    pub total_reminders: usize,
    pub completed_reminders: usize,
    pub pending_reminders: usize,
    pub reminder_completion_rate: u32,
    pub recurring_reminders: usize,
    pub tasks_by_category: Vec<(Category, usize)>,
    pub tasks_by_priority: Vec<(Priority, usize)>,
    /// Completed tasks per weekday of creation, index 0 is Sunday.
    pub completed_by_weekday: [usize; 7],
}

impl Statistics {
    pub fn compute(tasks: &[Task], reminders: &[Reminder]) -> Self {
        let completed_tasks = tasks.iter().filter(|task| task.completed).count();
        let completed_reminders = reminders
            .iter()
            .filter(|reminder| reminder.completed)
            .count();

        let tasks_by_category = Category::ALL
            .iter()
            .map(|category| {
                let count = tasks.iter().filter(|task| task.category == *category).count();
                (*category, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();

        let tasks_by_priority = Priority::ALL
            .iter()
            .map(|priority| {
                let count = tasks.iter().filter(|task| task.priority == *priority).count();
                (*priority, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();

        let mut completed_by_weekday = [0usize; 7];
        for task in tasks.iter().filter(|task| task.completed) {
            let index = task.created_at.weekday().num_days_from_sunday() as usize;
            completed_by_weekday[index] += 1;
        }

        Self {
            total_tasks: tasks.len(),
            completed_tasks,
            pending_tasks: tasks.len() - completed_tasks,
            task_completion_rate: percent(completed_tasks, tasks.len()),
            total_reminders: reminders.len(),
            completed_reminders,
            pending_reminders: reminders.len() - completed_reminders,
            reminder_completion_rate: percent(completed_reminders, reminders.len()),
            recurring_reminders: reminders.iter().filter(|r| r.is_recurring()).count(),
            tasks_by_category,
            tasks_by_priority,
            completed_by_weekday,
        }
    }
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}
