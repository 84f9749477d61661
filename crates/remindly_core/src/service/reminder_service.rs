//! Reminder lifecycle controller.
//!
//! # Responsibility
//! - Orchestrate the recurrence engine against the record store and the
//!   notification dispatcher for one signed-in owner.
//! - Keep an in-memory working set of the owner's reminders.
//! - Own the cancellable one-shot notification timers.
//!
//! # Invariants
//! - Without a signed-in owner every operation is a no-op.
//! - Store writes inside one operation are independent; a failed write is
//!   never compensated.
//! - A completed occurrence is never reopened by the due-check.
//! - One completion yields at most one successor: an existing series member
//!   at the successor instant suppresses the insert.
//! - The working set stays sorted by `datetime ASC, id ASC`.

use crate::config::SchedulerConfig;
use crate::model::common::OwnerId;
use crate::model::reminder::{Reminder, ReminderDraft, ReminderId, ReminderValidationError};
use crate::notify::{dispatch_best_effort, Notification, NotificationDispatcher};
use crate::repo::reminder_repo::{ReminderListQuery, ReminderRepository};
use crate::repo::RepoError;
use crate::schedule::engine::{compute_next_occurrence, is_imminently_due_within, is_overdue};
use crate::schedule::timers::NotificationTimers;
use crate::service::filter::ItemFilter;
use chrono::NaiveDateTime;
use log::{error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Service error for reminder lifecycle operations.
#[derive(Debug)]
pub enum ReminderServiceError {
    /// Input did not pass reminder validation.
    Validation(ReminderValidationError),
    /// Record store failure; sibling writes already issued stay applied.
    Store(RepoError),
}

impl ReminderServiceError {
    /// Generic, user-facing retry message.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "The reminder is invalid. Please check the fields.",
            Self::Store(_) => "Something went wrong while saving. Please try again.",
        }
    }
}

impl Display for ReminderServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReminderServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<RepoError> for ReminderServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidReminder(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

impl From<ReminderValidationError> for ReminderServiceError {
    fn from(value: ReminderValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type ReminderServiceResult<T> = Result<T, ReminderServiceError>;

/// What happened to the successor of a completed occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuccessorOutcome {
    /// Not a false→true transition of a recurring occurrence.
    NotApplicable,
    /// The rule's end date stops the series here.
    SeriesEnded,
    Created(Reminder),
    /// The series already holds an occurrence at the successor instant.
    AlreadyExists(Reminder),
}

impl SuccessorOutcome {
    pub fn created(&self) -> Option<&Reminder> {
        match self {
            Self::Created(reminder) => Some(reminder),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// The toggled occurrence after the flip.
    pub reminder: Reminder,
    pub successor: SuccessorOutcome,
}

/// Caller decision for deleting a member of a recurring series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesDeleteChoice {
    All,
    One,
}

/// Path taken by `delete_reminder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    Single,
    SeriesAll,
    SeriesOne,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub mode: DeleteMode,
    pub removed: Vec<ReminderId>,
}

/// Summary of one due-check pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DueCheckReport {
    pub notified: Vec<ReminderId>,
    pub auto_completed: Vec<ReminderId>,
    pub successors: Vec<ReminderId>,
    pub failed_writes: usize,
}

impl DueCheckReport {
    pub fn is_idle(&self) -> bool {
        self.notified.is_empty() && self.auto_completed.is_empty() && self.failed_writes == 0
    }
}

/// Reminder lifecycle controller over a repository implementation.
pub struct ReminderService<R: ReminderRepository> {
    repo: R,
    dispatcher: Arc<dyn NotificationDispatcher>,
    config: SchedulerConfig,
    owner: Option<OwnerId>,
    reminders: Vec<Reminder>,
    notified: HashSet<ReminderId>,
    timers: NotificationTimers,
}

impl<R: ReminderRepository> ReminderService<R> {
    /// Creates a signed-out controller.
    pub fn new(
        repo: R,
        dispatcher: Arc<dyn NotificationDispatcher>,
        config: SchedulerConfig,
    ) -> Self {
        let timers = NotificationTimers::new(Arc::clone(&dispatcher));
        Self {
            repo,
            dispatcher,
            config,
            owner: None,
            reminders: Vec::new(),
            notified: HashSet::new(),
            timers,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// In-memory working set, sorted by `datetime`.
    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn reminder(&self, id: ReminderId) -> Option<&Reminder> {
        self.reminders.iter().find(|reminder| reminder.id == id)
    }

    /// Working-set view restricted by `filter`, sorted by `datetime`.
    pub fn filtered_reminders(&self, filter: &ItemFilter) -> Vec<Reminder> {
        self.reminders
            .iter()
            .filter(|reminder| filter.matches_reminder(reminder))
            .cloned()
            .collect()
    }

    pub fn armed_timer_count(&self) -> usize {
        self.timers.armed_count()
    }

    pub fn is_timer_armed(&self, id: ReminderId) -> bool {
        self.timers.is_armed(id)
    }

    /// Activates the controller for `owner` and loads the working set.
    ///
    /// On a load failure the owner stays signed in with an empty working set.
    pub fn sign_in(&mut self, owner: impl Into<OwnerId>) -> ReminderServiceResult<usize> {
        self.sign_out();
        self.owner = Some(owner.into());
        self.reload()
    }

    /// Deactivates the controller and cancels every armed timer.
    pub fn sign_out(&mut self) {
        self.timers.cancel_all();
        self.notified.clear();
        self.reminders.clear();
        self.owner = None;
    }

    /// Replaces the working set with the owner's rows from the store.
    pub fn reload(&mut self) -> ReminderServiceResult<usize> {
        let Some(owner) = self.owner.clone() else {
            return Ok(0);
        };

        match self
            .repo
            .list_reminders(&owner, &ReminderListQuery::default())
        {
            Ok(reminders) => {
                self.reminders = reminders;
                info!(
                    "event=reminders_load module=service status=ok count={}",
                    self.reminders.len()
                );
                Ok(self.reminders.len())
            }
            Err(err) => {
                self.reminders.clear();
                error!("event=reminders_load module=service status=error error={err}");
                Err(err.into())
            }
        }
    }

    /// Creates a new series root (or one-off reminder) for the owner.
    ///
    /// When `datetime` is after `now`, a one-shot notification is armed for
    /// that instant.
    pub fn add_reminder(
        &mut self,
        draft: ReminderDraft,
        now: NaiveDateTime,
    ) -> ReminderServiceResult<Option<Reminder>> {
        let Some(owner) = self.owner.clone() else {
            return Ok(None);
        };

        let reminder = Reminder::from_draft(owner, draft);
        reminder.validate()?;

        if let Err(err) = self.repo.insert_reminder(&reminder) {
            error!("event=reminder_create module=service status=error error={err}");
            return Err(err.into());
        }
        self.insert_sorted(reminder.clone());

        if reminder.datetime > now {
            if let Ok(delay) = (reminder.datetime - now).to_std() {
                let notification = Notification::for_reminder(&reminder, &self.config);
                self.timers.arm(reminder.id, delay, notification);
            }
        }

        info!(
            "event=reminder_create module=service status=ok recurring={}",
            reminder.is_recurring()
        );
        Ok(Some(reminder))
    }

    /// Flips `completed` of one occurrence.
    ///
    /// A false→true flip of a recurring occurrence persists its successor
    /// before returning. A true→false flip never generates anything.
    pub fn toggle_reminder_completion(
        &mut self,
        id: ReminderId,
    ) -> ReminderServiceResult<Option<ToggleOutcome>> {
        let Some(owner) = self.owner.clone() else {
            return Ok(None);
        };
        let Some(index) = self.position(id) else {
            return Ok(None);
        };

        let completed = !self.reminders[index].completed;
        if let Err(err) = self.repo.set_reminder_completed(&owner, id, completed) {
            error!("event=reminder_toggle module=service status=error error={err}");
            return Err(err.into());
        }
        self.reminders[index].completed = completed;
        let updated = self.reminders[index].clone();

        let successor = if completed {
            self.timers.cancel(id);
            self.notified.remove(&id);
            if updated.is_recurring() {
                self.spawn_successor(&owner, &updated).map_err(|err| {
                    error!("event=reminder_successor module=service status=error error={err}");
                    ReminderServiceError::from(err)
                })?
            } else {
                SuccessorOutcome::NotApplicable
            }
        } else {
            SuccessorOutcome::NotApplicable
        };

        info!(
            "event=reminder_toggle module=service status=ok completed={} successor={}",
            completed,
            successor.created().is_some()
        );
        Ok(Some(ToggleOutcome {
            reminder: updated,
            successor,
        }))
    }

    /// Deletes one occurrence or its whole series.
    ///
    /// `decide` is consulted only for recurring occurrences.
    pub fn delete_reminder<F>(
        &mut self,
        id: ReminderId,
        decide: F,
    ) -> ReminderServiceResult<Option<DeleteOutcome>>
    where
        F: FnOnce(&Reminder) -> SeriesDeleteChoice,
    {
        let Some(owner) = self.owner.clone() else {
            return Ok(None);
        };
        let Some(target) = self.lookup(&owner, id)? else {
            return Ok(None);
        };

        let (mode, removed) = if !target.is_recurring() {
            (DeleteMode::Single, self.delete_one(&owner, id)?)
        } else {
            let series_id = target.series_id();
            match decide(&target) {
                SeriesDeleteChoice::All => {
                    let removed = self.repo.delete_series(&owner, series_id).map_err(|err| {
                        error!("event=reminder_delete module=service status=error mode=series_all error={err}");
                        ReminderServiceError::from(err)
                    })?;
                    self.reminders
                        .retain(|reminder| reminder.series_id() != series_id);
                    (DeleteMode::SeriesAll, removed)
                }
                SeriesDeleteChoice::One => (DeleteMode::SeriesOne, self.delete_one(&owner, id)?),
            }
        };

        for removed_id in &removed {
            self.timers.cancel(*removed_id);
            self.notified.remove(removed_id);
        }
        self.reminders
            .retain(|reminder| !removed.contains(&reminder.id));

        info!(
            "event=reminder_delete module=service status=ok mode={:?} removed={}",
            mode,
            removed.len()
        );
        Ok(Some(DeleteOutcome { mode, removed }))
    }

    /// Runs one due-check pass over the working set.
    ///
    /// Imminent occurrences are notified at most once per lookahead window.
    /// Overdue recurring occurrences are completed and rolled forward by one
    /// period; each store write is attempted independently.
    pub fn run_due_check(&mut self, now: NaiveDateTime) -> DueCheckReport {
        let mut report = DueCheckReport::default();
        let Some(owner) = self.owner.clone() else {
            return report;
        };

        let lookahead = self.config.lookahead_delta();
        let reminders = &self.reminders;
        self.notified.retain(|id| {
            reminders
                .iter()
                .any(|reminder| reminder.id == *id && is_imminently_due_within(reminder, now, lookahead))
        });

        let pending = self
            .reminders
            .iter()
            .filter(|reminder| !reminder.completed)
            .cloned()
            .collect::<Vec<_>>();

        for reminder in pending {
            if is_imminently_due_within(&reminder, now, lookahead)
                && self.notified.insert(reminder.id)
            {
                let notification = Notification::for_reminder(&reminder, &self.config);
                if dispatch_best_effort(self.dispatcher.as_ref(), &notification) {
                    report.notified.push(reminder.id);
                }
            }

            if !(is_overdue(&reminder, now) && reminder.is_recurring()) {
                continue;
            }

            if let Some(index) = self.position(reminder.id) {
                self.reminders[index].completed = true;
            }
            self.timers.cancel(reminder.id);
            report.auto_completed.push(reminder.id);

            let mut completed = reminder.clone();
            completed.completed = true;
            match self.spawn_successor(&owner, &completed) {
                Ok(SuccessorOutcome::Created(next)) => report.successors.push(next.id),
                Ok(_) => {}
                Err(err) => {
                    report.failed_writes += 1;
                    error!("event=due_check module=service status=error step=insert_successor error={err}");
                }
            }

            if let Err(err) = self.repo.set_reminder_completed(&owner, reminder.id, true) {
                report.failed_writes += 1;
                error!("event=due_check module=service status=error step=mark_completed error={err}");
            }
        }

        if !report.is_idle() {
            info!(
                "event=due_check module=service status=ok notified={} auto_completed={} successors={} failed_writes={}",
                report.notified.len(),
                report.auto_completed.len(),
                report.successors.len(),
                report.failed_writes
            );
        }
        report
    }

    fn spawn_successor(
        &mut self,
        owner: &str,
        completed: &Reminder,
    ) -> Result<SuccessorOutcome, RepoError> {
        let Some(next) = compute_next_occurrence(completed) else {
            return Ok(SuccessorOutcome::SeriesEnded);
        };

        if let Some(existing) =
            self.repo
                .find_series_occurrence(owner, next.series_id(), next.datetime)?
        {
            warn!("event=reminder_successor module=service status=skipped reason=already_exists");
            if self.position(existing.id).is_none() {
                self.insert_sorted(existing.clone());
            }
            return Ok(SuccessorOutcome::AlreadyExists(existing));
        }

        self.repo.insert_reminder(&next)?;
        self.insert_sorted(next.clone());
        Ok(SuccessorOutcome::Created(next))
    }

    fn delete_one(&mut self, owner: &str, id: ReminderId) -> ReminderServiceResult<Vec<ReminderId>> {
        match self.repo.delete_reminder(owner, id) {
            Ok(0) => Ok(Vec::new()),
            Ok(_) => Ok(vec![id]),
            Err(err) => {
                error!("event=reminder_delete module=service status=error mode=single error={err}");
                Err(err.into())
            }
        }
    }

    fn lookup(&self, owner: &str, id: ReminderId) -> ReminderServiceResult<Option<Reminder>> {
        if let Some(reminder) = self.reminder(id) {
            return Ok(Some(reminder.clone()));
        }
        Ok(self.repo.get_reminder(owner, id)?)
    }

    fn position(&self, id: ReminderId) -> Option<usize> {
        self.reminders.iter().position(|reminder| reminder.id == id)
    }

    fn insert_sorted(&mut self, reminder: Reminder) {
        let key = (reminder.datetime, reminder.id);
        let index = self
            .reminders
            .partition_point(|existing| (existing.datetime, existing.id) <= key);
        self.reminders.insert(index, reminder);
    }
}
