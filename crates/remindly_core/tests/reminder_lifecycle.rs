use chrono::{NaiveDate, NaiveDateTime};
use remindly_core::db::open_db_in_memory;
use remindly_core::repo::reminder_repo::{
    ReminderListQuery, ReminderRepository, SqliteReminderRepository,
};
use remindly_core::{
    DeleteMode, DispatchError, Notification, NotificationDispatcher, RecordingDispatcher,
    RecurrenceRule, Reminder, ReminderDraft, ReminderId, ReminderService, ReminderServiceError,
    RepoError, RepoResult, SchedulerConfig, SeriesDeleteChoice, SuccessorOutcome,
};
use rusqlite::Connection;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const OWNER: &str = "user-1";

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn service(
    conn: &Connection,
) -> (
    ReminderService<SqliteReminderRepository<&Connection>>,
    Arc<RecordingDispatcher>,
) {
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let shared: Arc<dyn NotificationDispatcher> = dispatcher.clone();
    let mut service = ReminderService::new(
        SqliteReminderRepository::new(conn),
        shared,
        SchedulerConfig::default(),
    );
    service.sign_in(OWNER).unwrap();
    (service, dispatcher)
}

fn stored(conn: &Connection) -> Vec<Reminder> {
    SqliteReminderRepository::new(conn)
        .list_reminders(OWNER, &ReminderListQuery::default())
        .unwrap()
}

fn add<R: ReminderRepository>(
    service: &mut ReminderService<R>,
    datetime: NaiveDateTime,
    rule: Option<RecurrenceRule>,
) -> Reminder {
    let mut draft = ReminderDraft::new("take vitamins", datetime);
    draft.recurrence = rule;
    service
        .add_reminder(draft, at(2023, 12, 31, 0, 0))
        .unwrap()
        .unwrap()
}

#[test]
fn completing_one_off_reminder_creates_nothing() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, _) = service(&conn);
    let reminder = add(&mut service, at(2024, 1, 1, 10, 0), None);

    let outcome = service
        .toggle_reminder_completion(reminder.id)
        .unwrap()
        .unwrap();

    assert!(outcome.reminder.completed);
    assert_eq!(outcome.successor, SuccessorOutcome::NotApplicable);
    let rows = stored(&conn);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].completed);
}

#[test]
fn completing_recurring_reminder_persists_exactly_one_successor() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, _) = service(&conn);
    let reminder = add(&mut service, at(2024, 1, 1, 10, 0), Some(RecurrenceRule::daily(2)));

    let outcome = service
        .toggle_reminder_completion(reminder.id)
        .unwrap()
        .unwrap();

    let successor = outcome.successor.created().cloned().unwrap();
    assert_eq!(successor.datetime, at(2024, 1, 3, 10, 0));
    assert_eq!(successor.original_id, Some(reminder.id));

    let rows = stored(&conn);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|row| row.id == successor.id && !row.completed));
    assert_eq!(service.reminders().len(), 2);
}

#[test]
fn end_date_stops_successor_on_completion() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, _) = service(&conn);
    let rule = RecurrenceRule::daily(2).with_end_date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    let reminder = add(&mut service, at(2024, 1, 1, 10, 0), Some(rule));

    let outcome = service
        .toggle_reminder_completion(reminder.id)
        .unwrap()
        .unwrap();

    assert_eq!(outcome.successor, SuccessorOutcome::SeriesEnded);
    assert_eq!(stored(&conn).len(), 1);
}

#[test]
fn repeated_toggling_never_duplicates_successor() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, _) = service(&conn);
    let reminder = add(&mut service, at(2024, 1, 1, 10, 0), Some(RecurrenceRule::daily(1)));

    let first = service
        .toggle_reminder_completion(reminder.id)
        .unwrap()
        .unwrap();
    let undo = service
        .toggle_reminder_completion(reminder.id)
        .unwrap()
        .unwrap();
    let again = service
        .toggle_reminder_completion(reminder.id)
        .unwrap()
        .unwrap();

    let created = first.successor.created().cloned().unwrap();
    assert!(!undo.reminder.completed);
    assert_eq!(undo.successor, SuccessorOutcome::NotApplicable);
    assert_eq!(again.successor, SuccessorOutcome::AlreadyExists(created));
    assert_eq!(stored(&conn).len(), 2);
    assert_eq!(service.reminders().len(), 2);
}

#[test]
fn deleting_series_root_with_all_removes_every_member() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, _) = service(&conn);
    let root = add(&mut service, at(2024, 1, 1, 8, 0), Some(RecurrenceRule::daily(1)));
    let c1 = service
        .toggle_reminder_completion(root.id)
        .unwrap()
        .unwrap()
        .successor
        .created()
        .cloned()
        .unwrap();
    let c2 = service
        .toggle_reminder_completion(c1.id)
        .unwrap()
        .unwrap()
        .successor
        .created()
        .cloned()
        .unwrap();
    assert_eq!(c2.original_id, Some(root.id));

    let outcome = service
        .delete_reminder(root.id, |_| SeriesDeleteChoice::All)
        .unwrap()
        .unwrap();

    assert_eq!(outcome.mode, DeleteMode::SeriesAll);
    let mut removed = outcome.removed.clone();
    removed.sort();
    let mut expected: Vec<ReminderId> = vec![root.id, c1.id, c2.id];
    expected.sort();
    assert_eq!(removed, expected);
    assert!(stored(&conn).is_empty());
    assert!(service.reminders().is_empty());
}

#[test]
fn deleting_series_member_from_a_child_removes_whole_series() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, _) = service(&conn);
    let root = add(&mut service, at(2024, 1, 1, 8, 0), Some(RecurrenceRule::daily(1)));
    let child = service
        .toggle_reminder_completion(root.id)
        .unwrap()
        .unwrap()
        .successor
        .created()
        .cloned()
        .unwrap();

    let outcome = service
        .delete_reminder(child.id, |_| SeriesDeleteChoice::All)
        .unwrap()
        .unwrap();

    assert_eq!(outcome.removed.len(), 2);
    assert!(stored(&conn).is_empty());
}

#[test]
fn deleting_one_occurrence_keeps_the_rest_of_the_series() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, _) = service(&conn);
    let root = add(&mut service, at(2024, 1, 1, 8, 0), Some(RecurrenceRule::daily(1)));
    let child = service
        .toggle_reminder_completion(root.id)
        .unwrap()
        .unwrap()
        .successor
        .created()
        .cloned()
        .unwrap();

    let outcome = service
        .delete_reminder(child.id, |_| SeriesDeleteChoice::One)
        .unwrap()
        .unwrap();

    assert_eq!(outcome.mode, DeleteMode::SeriesOne);
    assert_eq!(outcome.removed, vec![child.id]);
    let rows = stored(&conn);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, root.id);
}

#[test]
fn deleting_one_off_reminder_never_asks_for_series_choice() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, _) = service(&conn);
    let reminder = add(&mut service, at(2024, 1, 1, 8, 0), None);

    let outcome = service
        .delete_reminder(reminder.id, |_| -> SeriesDeleteChoice {
            panic!("one-off reminders have no series")
        })
        .unwrap()
        .unwrap();

    assert_eq!(outcome.mode, DeleteMode::Single);
    assert_eq!(outcome.removed, vec![reminder.id]);
}

#[test]
fn signed_out_controller_ignores_every_operation() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, dispatcher) = service(&conn);
    let reminder = add(&mut service, at(2024, 1, 1, 10, 0), Some(RecurrenceRule::daily(1)));
    service.sign_out();

    assert!(service
        .add_reminder(ReminderDraft::new("x", at(2024, 1, 2, 0, 0)), at(2024, 1, 1, 0, 0))
        .unwrap()
        .is_none());
    assert!(service
        .toggle_reminder_completion(reminder.id)
        .unwrap()
        .is_none());
    assert!(service
        .delete_reminder(reminder.id, |_| SeriesDeleteChoice::All)
        .unwrap()
        .is_none());
    assert!(service.run_due_check(at(2024, 1, 9, 0, 0)).is_idle());
    assert!(dispatcher.sent().is_empty());
    assert_eq!(stored(&conn).len(), 1);
}

#[test]
fn sign_in_loads_only_the_owners_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteReminderRepository::new(&conn);
    repo.insert_reminder(&Reminder::from_draft(
        "someone-else",
        ReminderDraft::new("not mine", at(2024, 1, 1, 9, 0)),
    ))
    .unwrap();
    let (mut service, _) = service(&conn);
    add(&mut service, at(2024, 1, 1, 9, 0), None);

    assert_eq!(service.reload().unwrap(), 1);
    assert_eq!(service.sign_in("someone-else").unwrap(), 1);
    assert_eq!(service.reminders()[0].title, "not mine");
}

#[test]
fn unknown_ids_are_not_errors() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, _) = service(&conn);
    let missing = uuid::Uuid::new_v4();

    assert!(service.toggle_reminder_completion(missing).unwrap().is_none());
    assert!(service
        .delete_reminder(missing, |_| SeriesDeleteChoice::All)
        .unwrap()
        .is_none());
}

#[test]
fn invalid_draft_is_a_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, _) = service(&conn);

    let err = service
        .add_reminder(
            ReminderDraft::new("   ", at(2024, 1, 1, 9, 0)),
            at(2024, 1, 1, 0, 0),
        )
        .unwrap_err();
    assert!(matches!(err, ReminderServiceError::Validation(_)));

    let err = service
        .add_reminder(
            ReminderDraft::new("zero", at(2024, 1, 1, 9, 0))
                .with_recurrence(RecurrenceRule::daily(0)),
            at(2024, 1, 1, 0, 0),
        )
        .unwrap_err();
    assert!(matches!(err, ReminderServiceError::Validation(_)));
    assert!(stored(&conn).is_empty());
}

#[test]
fn due_check_auto_completes_overdue_weekly_and_rolls_forward() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, _) = service(&conn);
    let weekly = add(
        &mut service,
        at(2024, 1, 1, 10, 0),
        Some(RecurrenceRule::weekly(1, Vec::new())),
    );

    let report = service.run_due_check(at(2024, 1, 1, 10, 5));

    assert_eq!(report.auto_completed, vec![weekly.id]);
    assert_eq!(report.successors.len(), 1);
    assert_eq!(report.failed_writes, 0);

    let rows = stored(&conn);
    assert_eq!(rows.len(), 2);
    assert!(rows[0].completed);
    assert_eq!(rows[1].datetime, at(2024, 1, 8, 10, 0));
    assert_eq!(rows[1].original_id, Some(weekly.id));
    assert!(!rows[1].completed);

    let second = service.run_due_check(at(2024, 1, 1, 10, 6));
    assert!(second.is_idle());
    assert_eq!(stored(&conn).len(), 2);
}

#[test]
fn due_check_rolls_forward_one_period_per_pass() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, _) = service(&conn);
    add(&mut service, at(2024, 1, 1, 8, 0), Some(RecurrenceRule::daily(1)));
    let now = at(2024, 1, 4, 12, 0);

    service.run_due_check(now);
    assert_eq!(stored(&conn).len(), 2);
    service.run_due_check(now);
    service.run_due_check(now);
    let rows = stored(&conn);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3].datetime, at(2024, 1, 4, 8, 0));
    assert!(rows[..3].iter().all(|row| row.completed));

    service.run_due_check(now);
    let rows = stored(&conn);
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[4].datetime, at(2024, 1, 5, 8, 0));
    assert!(!rows[4].completed);
}

#[test]
fn due_check_leaves_overdue_one_off_reminders_pending() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, _) = service(&conn);
    add(&mut service, at(2024, 1, 1, 8, 0), None);

    let report = service.run_due_check(at(2024, 1, 2, 8, 0));

    assert!(report.auto_completed.is_empty());
    assert!(!stored(&conn)[0].completed);
}

#[test]
fn due_check_notifies_once_per_window() {
    let conn = open_db_in_memory().unwrap();
    let (mut service, dispatcher) = service(&conn);
    let soon = at(2024, 1, 1, 10, 0) + chrono::Duration::seconds(30);
    let draft = ReminderDraft::new("call mom", soon).with_description("it's her birthday");
    service.add_reminder(draft, at(2023, 12, 31, 0, 0)).unwrap();

    let first = service.run_due_check(at(2024, 1, 1, 10, 0));
    let second = service.run_due_check(at(2024, 1, 1, 10, 0) + chrono::Duration::seconds(10));

    assert_eq!(first.notified.len(), 1);
    assert!(second.notified.is_empty());
    let sent = dispatcher.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "call mom");
    assert_eq!(sent[0].body, "it's her birthday");
}

/// Dispatcher that refuses every notification.
#[derive(Default)]
struct DeniedDispatcher {
    attempts: AtomicUsize,
}

impl NotificationDispatcher for DeniedDispatcher {
    fn notify(&self, _notification: &Notification) -> Result<(), DispatchError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(DispatchError::PermissionDenied)
    }
}

#[test]
fn denied_notifications_leave_reminder_state_alone() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = Arc::new(DeniedDispatcher::default());
    let shared: Arc<dyn NotificationDispatcher> = dispatcher.clone();
    let mut service = ReminderService::new(
        SqliteReminderRepository::new(&conn),
        shared,
        SchedulerConfig::default(),
    );
    service.sign_in(OWNER).unwrap();

    let now = at(2024, 1, 1, 10, 0);
    let soon = add(&mut service, now + chrono::Duration::seconds(30), None);
    let daily = add(
        &mut service,
        at(2024, 1, 1, 9, 0),
        Some(RecurrenceRule::daily(1)),
    );

    let report = service.run_due_check(now);

    assert_eq!(dispatcher.attempts.load(Ordering::SeqCst), 1);
    assert!(report.notified.is_empty());
    assert_eq!(report.auto_completed, vec![daily.id]);
    assert_eq!(report.successors.len(), 1);
    assert_eq!(report.failed_writes, 0);

    let rows = stored(&conn);
    assert_eq!(rows.len(), 3);
    assert!(!rows.iter().find(|row| row.id == soon.id).unwrap().completed);
    assert!(rows.iter().find(|row| row.id == daily.id).unwrap().completed);
    assert!(rows
        .iter()
        .any(|row| row.original_id == Some(daily.id) && row.datetime == at(2024, 1, 2, 9, 0)));
    assert!(!service.reminder(soon.id).unwrap().completed);
}

/// Reminder store whose completion writes can be switched to fail.
struct FlakyCompletionRepo<'a> {
    inner: SqliteReminderRepository<&'a Connection>,
    fail_completion: Rc<Cell<bool>>,
}

impl ReminderRepository for FlakyCompletionRepo<'_> {
    fn insert_reminder(&self, reminder: &Reminder) -> RepoResult<ReminderId> {
        self.inner.insert_reminder(reminder)
    }

    fn set_reminder_completed(&self, owner: &str, id: ReminderId, completed: bool) -> RepoResult<()> {
        if self.fail_completion.get() {
            return Err(RepoError::InvalidData("simulated write failure".to_string()));
        }
        self.inner.set_reminder_completed(owner, id, completed)
    }

    fn get_reminder(&self, owner: &str, id: ReminderId) -> RepoResult<Option<Reminder>> {
        self.inner.get_reminder(owner, id)
    }

    fn list_reminders(&self, owner: &str, query: &ReminderListQuery) -> RepoResult<Vec<Reminder>> {
        self.inner.list_reminders(owner, query)
    }

    fn find_series_occurrence(
        &self,
        owner: &str,
        series_id: ReminderId,
        datetime: NaiveDateTime,
    ) -> RepoResult<Option<Reminder>> {
        self.inner.find_series_occurrence(owner, series_id, datetime)
    }

    fn delete_reminder(&self, owner: &str, id: ReminderId) -> RepoResult<usize> {
        self.inner.delete_reminder(owner, id)
    }

    fn delete_series(&self, owner: &str, series_id: ReminderId) -> RepoResult<Vec<ReminderId>> {
        self.inner.delete_series(owner, series_id)
    }
}

#[test]
fn due_check_keeps_successor_when_completion_write_fails() {
    let conn = open_db_in_memory().unwrap();
    let fail = Rc::new(Cell::new(false));
    let mut service = ReminderService::new(
        FlakyCompletionRepo {
            inner: SqliteReminderRepository::new(&conn),
            fail_completion: Rc::clone(&fail),
        },
        Arc::new(RecordingDispatcher::new()),
        SchedulerConfig::default(),
    );
    service.sign_in(OWNER).unwrap();
    let root = add(&mut service, at(2024, 1, 1, 8, 0), Some(RecurrenceRule::daily(1)));
    fail.set(true);

    let report = service.run_due_check(at(2024, 1, 1, 9, 0));

    assert_eq!(report.failed_writes, 1);
    assert_eq!(report.successors.len(), 1);
    assert!(service.reminder(root.id).unwrap().completed);
    let rows = stored(&conn);
    assert_eq!(rows.len(), 2);
    assert!(!rows[0].completed, "failed completion write is not retried");
}

#[test]
fn toggle_surfaces_store_failure_without_touching_working_set() {
    let conn = open_db_in_memory().unwrap();
    let fail = Rc::new(Cell::new(false));
    let mut service = ReminderService::new(
        FlakyCompletionRepo {
            inner: SqliteReminderRepository::new(&conn),
            fail_completion: Rc::clone(&fail),
        },
        Arc::new(RecordingDispatcher::new()),
        SchedulerConfig::default(),
    );
    service.sign_in(OWNER).unwrap();
    let root = add(&mut service, at(2024, 1, 1, 8, 0), Some(RecurrenceRule::daily(1)));
    fail.set(true);

    let err = service.toggle_reminder_completion(root.id).unwrap_err();

    assert!(matches!(err, ReminderServiceError::Store(_)));
    assert!(!err.user_message().is_empty());
    assert!(!service.reminder(root.id).unwrap().completed);
    assert_eq!(stored(&conn).len(), 1);
}
