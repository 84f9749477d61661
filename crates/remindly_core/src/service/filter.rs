//! List filters shared by task and reminder views.

use crate::model::common::{Category, Priority};
use crate::model::reminder::Reminder;
use crate::model::task::Task;

/// Completion-state filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "completed" | "done" => Some(Self::Completed),
            "pending" | "open" => Some(Self::Pending),
            _ => None,
        }
    }

    fn matches(self, completed: bool) -> bool {
        match self {
            Self::All => true,
            Self::Completed => completed,
            Self::Pending => !completed,
        }
    }
}

/// Conjunctive filter; `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub status: StatusFilter,
}

impl ItemFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches_task(&self, task: &Task) -> bool {
        self.matches(task.priority, task.category, task.completed)
    }

    pub fn matches_reminder(&self, reminder: &Reminder) -> bool {
        self.matches(reminder.priority, reminder.category, reminder.completed)
    }

    fn matches(&self, priority: Priority, category: Category, completed: bool) -> bool {
        self.priority.map_or(true, |wanted| wanted == priority)
            && self.category.map_or(true, |wanted| wanted == category)
            && self.status.matches(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemFilter, StatusFilter};
    use crate::model::common::{Category, Priority};
    use crate::model::task::{Task, TaskDraft};
    use chrono::NaiveDate;

    fn task(priority: Priority, category: Category, completed: bool) -> Task {
        let created = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut draft = TaskDraft::new("t");
        draft.priority = priority;
        draft.category = category;
        let mut task = Task::from_draft("user-1", draft, created);
        task.completed = completed;
        task
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = ItemFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches_task(&task(Priority::Low, Category::Work, true)));
        assert!(filter.matches_task(&task(Priority::High, Category::Sport, false)));
    }

    #[test]
    fn filter_fields_are_conjunctive() {
        let filter = ItemFilter {
            priority: Some(Priority::High),
            category: Some(Category::Work),
            status: StatusFilter::Pending,
        };
        assert!(filter.matches_task(&task(Priority::High, Category::Work, false)));
        assert!(!filter.matches_task(&task(Priority::High, Category::Work, true)));
        assert!(!filter.matches_task(&task(Priority::Low, Category::Work, false)));
        assert!(!filter.matches_task(&task(Priority::High, Category::Study, false)));
    }
}
