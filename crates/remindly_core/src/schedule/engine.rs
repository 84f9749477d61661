//! Recurrence engine: due-state predicates and successor derivation.
//!
//! # Responsibility
//! - Decide whether an occurrence is imminently due or overdue.
//! - Derive the next occurrence of a recurring series.
//!
//! # Invariants
//! - Pure functions: no I/O, inputs are never mutated.
//! - The next instant is always `base + interval * period`. Weekday and
//!   day-of-month hints on the rule do not steer the chosen date.
//! - A successor's `original_id` always names the series root.

use crate::model::recurrence::{Recurrence, RecurrenceRule};
use crate::model::reminder::Reminder;
use chrono::{Days, Duration, Months, NaiveDateTime, NaiveTime};
use uuid::Uuid;

/// Default advance-notification window.
pub const IMMINENT_WINDOW_SECS: i64 = 60;

/// True iff incomplete and `0 < datetime - now <= 60s`.
pub fn is_imminently_due(reminder: &Reminder, now: NaiveDateTime) -> bool {
    is_imminently_due_within(reminder, now, Duration::seconds(IMMINENT_WINDOW_SECS))
}

/// Variant of [`is_imminently_due`] with a caller-defined window.
pub fn is_imminently_due_within(
    reminder: &Reminder,
    now: NaiveDateTime,
    lookahead: Duration,
) -> bool {
    if reminder.completed {
        return false;
    }
    let remaining = reminder.datetime - now;
    remaining > Duration::zero() && remaining <= lookahead
}

/// True iff incomplete and scheduled strictly before `now`.
pub fn is_overdue(reminder: &Reminder, now: NaiveDateTime) -> bool {
    !reminder.completed && reminder.datetime < now
}

/// Adds `interval` periods of the rule to `base`.
///
/// Month steps clamp to the last day of the target month. Returns `None`
/// only when the result leaves chrono's representable range.
pub fn next_occurrence_datetime(rule: &RecurrenceRule, base: NaiveDateTime) -> Option<NaiveDateTime> {
    match &rule.pattern {
        Recurrence::Daily { interval } => base.checked_add_days(Days::new(u64::from(*interval))),
        Recurrence::Weekly { interval, .. } => {
            base.checked_add_days(Days::new(u64::from(*interval) * 7))
        }
        Recurrence::Monthly { interval, .. } => base.checked_add_months(Months::new(*interval)),
    }
}

/// Derives the next occurrence of a recurring reminder.
///
/// Returns `None` when the reminder has no recurrence, when date arithmetic
/// overflows, or when the next instant lies after the start of the rule's
/// `end_date`. Only an occurrence exactly at midnight of the end date is
/// still produced.
pub fn compute_next_occurrence(reminder: &Reminder) -> Option<Reminder> {
    let rule = reminder.recurrence.as_ref()?;
    let next = next_occurrence_datetime(rule, reminder.datetime)?;

    if let Some(end_date) = rule.end_date {
        if next > end_date.and_time(NaiveTime::MIN) {
            return None;
        }
    }

    Some(Reminder {
        id: Uuid::new_v4(),
        title: reminder.title.clone(),
        description: reminder.description.clone(),
        datetime: next,
        completed: false,
        priority: reminder.priority,
        category: reminder.category,
        recurrence: reminder.recurrence.clone(),
        original_id: Some(reminder.series_id()),
        user_id: reminder.user_id.clone(),
    })
}
