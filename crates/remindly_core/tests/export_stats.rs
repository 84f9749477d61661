use chrono::{NaiveDate, NaiveDateTime};
use remindly_core::{
    export, export_csv, export_json, Category, ExportFormat, Priority, RecurrenceRule, Reminder,
    ReminderDraft, Statistics, Task, TaskDraft,
};
use serde_json::Value;

fn at(d: u32, h: u32) -> NaiveDateTime {
    // 2024-01-07 is a Sunday.
    NaiveDate::from_ymd_opt(2024, 1, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn task(title: &str, priority: Priority, category: Category, created: NaiveDateTime, done: bool) -> Task {
    let mut draft = TaskDraft::new(title);
    draft.priority = priority;
    draft.category = category;
    let mut task = Task::from_draft("user-1", draft, created);
    task.completed = done;
    task
}

fn sample() -> (Vec<Task>, Vec<Reminder>) {
    let tasks = vec![
        task("write, then review", Priority::High, Category::Work, at(7, 9), true),
        task("say \"hi\"", Priority::High, Category::Work, at(8, 9), true),
        task("gym", Priority::Low, Category::Sport, at(8, 18), false),
    ];
    let daily = Reminder::from_draft(
        "user-1",
        ReminderDraft::new("pills", at(9, 8)).with_recurrence(RecurrenceRule::daily(1)),
    );
    let mut once = Reminder::from_draft("user-1", ReminderDraft::new("dentist", at(10, 14)));
    once.completed = true;
    (tasks, vec![daily, once])
}

#[test]
fn json_export_groups_tasks_and_reminders_in_camel_case() {
    let (tasks, reminders) = sample();

    let json: Value = serde_json::from_str(&export_json(&tasks, &reminders).unwrap()).unwrap();

    assert_eq!(json["tasks"].as_array().unwrap().len(), 3);
    assert_eq!(json["reminders"].as_array().unwrap().len(), 2);
    assert_eq!(json["tasks"][0]["createdAt"], "2024-01-07T09:00:00");
    assert_eq!(json["tasks"][0]["priority"], "high");
    assert_eq!(json["reminders"][0]["recurrence"]["type"], "daily");
    assert_eq!(json["reminders"][0]["recurrence"]["interval"], 1);
    assert!(json["reminders"][0]["originalId"].is_null());
    assert!(json["reminders"][1]["recurrence"].is_null());
}

#[test]
fn csv_export_has_fixed_header_and_escapes_fields() {
    let (tasks, reminders) = sample();

    let csv = export_csv(&tasks, &reminders);
    let lines = csv.lines().collect::<Vec<_>>();

    assert_eq!(
        lines[0],
        "id,title,description,completed,createdAt,dueDate,priority,category,datetime,recurrence"
    );
    assert_eq!(lines.len(), 6);
    assert!(lines[1].contains(",\"write, then review\","));
    assert!(lines[1].contains(",1,2024-01-07T09:00:00,,high,work,,"));
    assert!(lines[2].contains(",\"say \"\"hi\"\"\","));
    assert!(lines[4].contains(",0,,,medium,other,2024-01-09T08:00:00,"));
    assert!(lines[4].ends_with("\"{\"\"type\"\":\"\"daily\"\",\"\"interval\"\":1}\""));
    assert!(lines[5].ends_with(",1,,,medium,other,2024-01-10T14:00:00,"));
}

#[test]
fn export_dispatches_on_format() {
    let (tasks, reminders) = sample();

    assert!(export(ExportFormat::Csv, &tasks, &reminders)
        .unwrap()
        .starts_with("id,title"));
    assert!(export(ExportFormat::Json, &tasks, &reminders)
        .unwrap()
        .starts_with('{'));
    assert_eq!(ExportFormat::parse(" CSV "), Some(ExportFormat::Csv));
    assert_eq!(ExportFormat::parse("xml"), None);
}

#[test]
fn statistics_count_rates_and_buckets() {
    let (tasks, reminders) = sample();

    let stats = Statistics::compute(&tasks, &reminders);

    assert_eq!(stats.total_tasks, 3);
    assert_eq!(stats.completed_tasks, 2);
    assert_eq!(stats.pending_tasks, 1);
    assert_eq!(stats.task_completion_rate, 67);
    assert_eq!(stats.total_reminders, 2);
    assert_eq!(stats.completed_reminders, 1);
    assert_eq!(stats.reminder_completion_rate, 50);
    assert_eq!(stats.recurring_reminders, 1);
    assert_eq!(
        stats.tasks_by_category,
        vec![(Category::Work, 2), (Category::Sport, 1)]
    );
    assert_eq!(
        stats.tasks_by_priority,
        vec![(Priority::Low, 1), (Priority::High, 2)]
    );
    assert_eq!(stats.completed_by_weekday, [1, 1, 0, 0, 0, 0, 0]);
}

#[test]
fn statistics_of_nothing_are_zero() {
    let stats = Statistics::compute(&[], &[]);

    assert_eq!(stats.task_completion_rate, 0);
    assert_eq!(stats.reminder_completion_rate, 0);
    assert!(stats.tasks_by_category.is_empty());
    assert!(stats.tasks_by_priority.is_empty());
    assert_eq!(stats.completed_by_weekday, [0; 7]);
}
