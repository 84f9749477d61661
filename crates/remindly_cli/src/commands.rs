//! Subcommand handlers.

use crate::{AddCommands, Cli, Commands, FilterArgs, ItemKind, RepeatArgs, RepeatKind};
use chrono::{Local, NaiveDateTime};
use log::info;
use remindly_core::model::recurrence::weekday_from_sunday_index;
use remindly_core::{
    export, open_db, DeleteMode, DispatchError, DueCheckScheduler, ExportFormat, ItemFilter,
    LogDispatcher, Notification, NotificationDispatcher, RecurrenceRule, Reminder, ReminderDraft,
    ReminderRepository, ReminderService, SchedulerConfig, SeriesDeleteChoice,
    SqliteReminderRepository, SqliteTaskRepository, Statistics, SuccessorOutcome, Task, TaskDraft,
    TaskService,
};
use std::error::Error;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Prints notifications to the terminal while `watch` runs.
struct TerminalDispatcher;

impl NotificationDispatcher for TerminalDispatcher {
    fn notify(&self, notification: &Notification) -> Result<(), DispatchError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "[{}] {}: {}", now().format("%H:%M"), notification.title, notification.body)
            .map_err(|err| DispatchError::Failed(err.to_string()))
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub async fn run(cli: Cli) -> CliResult<()> {
    let owner = cli.owner.trim().to_string();
    if owner.is_empty() {
        return Err("owner must not be empty".into());
    }

    if let Commands::Watch { interval_secs } = cli.command {
        return watch(&cli.db_path, owner, interval_secs).await;
    }

    let conn = open_db(&cli.db_path)?;
    let tasks = TaskService::new(SqliteTaskRepository::new(&conn));
    let mut reminders = ReminderService::new(
        SqliteReminderRepository::new(&conn),
        Arc::new(LogDispatcher),
        SchedulerConfig::default(),
    );
    reminders.sign_in(owner.as_str())?;

    match cli.command {
        Commands::Add { item } => match item {
            AddCommands::Task {
                title,
                description,
                due,
                priority,
                category,
            } => {
                let mut draft = TaskDraft::new(title);
                draft.description = description;
                draft.due_date = due;
                draft.priority = priority;
                draft.category = category;
                let task = tasks.create_task(&owner, draft, now())?;
                println!("created task {}", task.id);
            }
            AddCommands::Reminder {
                title,
                at,
                description,
                priority,
                category,
                repeat,
            } => {
                let mut draft = ReminderDraft::new(title, at);
                draft.description = description;
                draft.priority = priority;
                draft.category = category;
                draft.recurrence = recurrence_from_args(repeat)?;
                if let Some(reminder) = reminders.add_reminder(draft, now())? {
                    println!("created reminder {}", reminder.id);
                }
            }
        },
        Commands::List { kind, filter } => {
            let filter = item_filter(filter);
            match kind {
                ItemKind::Task => {
                    for task in tasks.list_tasks(&owner, &filter)? {
                        println!("{}", task_line(&task));
                    }
                }
                ItemKind::Reminder => {
                    for reminder in reminders.filtered_reminders(&filter) {
                        println!("{}", reminder_line(&reminder));
                    }
                }
            }
        }
        Commands::Complete { kind, id } => match kind {
            ItemKind::Task => match tasks.toggle_task_completion(&owner, id)? {
                Some(task) => println!("{}", task_line(&task)),
                None => println!("no task {id}"),
            },
            ItemKind::Reminder => match reminders.toggle_reminder_completion(id)? {
                Some(outcome) => {
                    println!("{}", reminder_line(&outcome.reminder));
                    match outcome.successor {
                        SuccessorOutcome::Created(next) => {
                            println!("next occurrence {}", reminder_line(&next))
                        }
                        SuccessorOutcome::AlreadyExists(next) => {
                            println!("next occurrence already scheduled {}", next.id)
                        }
                        SuccessorOutcome::SeriesEnded => println!("series has ended"),
                        SuccessorOutcome::NotApplicable => {}
                    }
                }
                None => println!("no reminder {id}"),
            },
        },
        Commands::Delete {
            kind,
            id,
            all_series,
            only_this,
        } => match kind {
            ItemKind::Task => {
                if tasks.delete_task(&owner, id)? {
                    println!("deleted task {id}");
                } else {
                    println!("no task {id}");
                }
            }
            ItemKind::Reminder => {
                let decide = |reminder: &Reminder| {
                    if all_series {
                        SeriesDeleteChoice::All
                    } else if only_this {
                        SeriesDeleteChoice::One
                    } else {
                        ask_series_choice(reminder)
                    }
                };
                match reminders.delete_reminder(id, decide)? {
                    Some(outcome) => {
                        let label = match outcome.mode {
                            DeleteMode::Single => "reminder",
                            DeleteMode::SeriesAll => "series",
                            DeleteMode::SeriesOne => "occurrence",
                        };
                        println!("deleted {label} ({} rows)", outcome.removed.len());
                    }
                    None => println!("no reminder {id}"),
                }
            }
        },
        Commands::Export { format, output } => {
            let all_tasks = tasks.list_tasks(&owner, &ItemFilter::default())?;
            let document = export(format, &all_tasks, reminders.reminders())?;
            match export_path(format, output) {
                Some(path) => {
                    std::fs::write(&path, document)?;
                    info!("event=export module=cli status=ok format={:?}", format);
                    println!("wrote {}", path.display());
                }
                None => println!("{document}"),
            }
        }
        Commands::Stats => {
            let all_tasks = tasks.list_tasks(&owner, &ItemFilter::default())?;
            print_stats(&Statistics::compute(&all_tasks, reminders.reminders()));
        }
        Commands::Watch { .. } => {}
    }

    Ok(())
}

async fn watch(db_path: &std::path::Path, owner: String, interval_secs: u64) -> CliResult<()> {
    let config = SchedulerConfig {
        due_check_interval: Duration::from_secs(interval_secs),
        ..SchedulerConfig::default()
    };
    let mut service = ReminderService::new(
        SqliteReminderRepository::new(open_db(db_path)?),
        Arc::new(TerminalDispatcher),
        config.clone(),
    );
    let loaded = service.sign_in(owner)?;
    catch_up_overdue(&mut service);

    let shared = Arc::new(Mutex::new(service));
    let scheduler = DueCheckScheduler::start(Arc::clone(&shared), &config)?;
    println!("watching {loaded} reminders, Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    scheduler.stop();
    shared.lock().await.sign_out();
    Ok(())
}

/// Runs one pass right away so overdue series roll forward before the first tick.
fn catch_up_overdue<R: ReminderRepository>(service: &mut ReminderService<R>) {
    let report = service.run_due_check(now());
    if !report.auto_completed.is_empty() {
        println!("rolled forward {} overdue occurrences", report.auto_completed.len());
    }
}

fn recurrence_from_args(args: RepeatArgs) -> CliResult<Option<RecurrenceRule>> {
    let Some(kind) = args.repeat else {
        return Ok(None);
    };
    let rule = match kind {
        RepeatKind::Daily => RecurrenceRule::daily(args.every),
        RepeatKind::Weekly => {
            let days = args
                .days
                .iter()
                .map(|index| {
                    weekday_from_sunday_index(*index)
                        .ok_or_else(|| format!("weekday index must be 0..=6, got {index}"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            RecurrenceRule::weekly(args.every, days)
        }
        RepeatKind::Monthly => RecurrenceRule::monthly(args.every, args.day_of_month),
    };
    Ok(Some(match args.until {
        Some(until) => rule.with_end_date(until),
        None => rule,
    }))
}

/// Target file of an export, or `None` for stdout (`-o -`).
pub(crate) fn export_path(format: ExportFormat, output: Option<PathBuf>) -> Option<PathBuf> {
    match output {
        Some(path) if path.as_os_str() == "-" => None,
        Some(path) => Some(path),
        None => Some(PathBuf::from(format.file_name())),
    }
}

fn item_filter(args: FilterArgs) -> ItemFilter {
    ItemFilter {
        priority: args.priority,
        category: args.category,
        status: args.status,
    }
}

fn ask_series_choice(reminder: &Reminder) -> SeriesDeleteChoice {
    print!(
        "\"{}\" repeats. Delete all occurrences? [y/N] ",
        reminder.title
    );
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) if matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") => {
            SeriesDeleteChoice::All
        }
        _ => SeriesDeleteChoice::One,
    }
}

fn task_line(task: &Task) -> String {
    format!(
        "{} [{}] {:<6} {:<8} {}{}",
        task.id,
        if task.completed { "x" } else { " " },
        task.priority.as_str(),
        task.category.as_str(),
        task.title,
        task.due_date
            .map(|due| format!(" (due {due})"))
            .unwrap_or_default()
    )
}

fn reminder_line(reminder: &Reminder) -> String {
    format!(
        "{} [{}] {} {:<6} {:<8} {}{}",
        reminder.id,
        if reminder.completed { "x" } else { " " },
        reminder.datetime.format("%Y-%m-%d %H:%M"),
        reminder.priority.as_str(),
        reminder.category.as_str(),
        reminder.title,
        reminder
            .recurrence
            .as_ref()
            .map(|rule| format!(" (every {} {:?})", rule.interval(), rule.kind()).to_lowercase())
            .unwrap_or_default()
    )
}

fn print_stats(stats: &Statistics) {
    println!(
        "tasks: {} total, {} done, {} pending ({}%)",
        stats.total_tasks, stats.completed_tasks, stats.pending_tasks, stats.task_completion_rate
    );
    println!(
        "reminders: {} total, {} done, {} pending ({}%), {} recurring",
        stats.total_reminders,
        stats.completed_reminders,
        stats.pending_reminders,
        stats.reminder_completion_rate,
        stats.recurring_reminders
    );
    for (category, count) in &stats.tasks_by_category {
        println!("  {:<8} {}", category.as_str(), count);
    }
    for (priority, count) in &stats.tasks_by_priority {
        println!("  {:<8} {}", priority.as_str(), count);
    }
    let labels = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    let week = labels
        .iter()
        .zip(stats.completed_by_weekday.iter())
        .map(|(label, count)| format!("{label} {count}"))
        .collect::<Vec<_>>()
        .join("  ");
    println!("completed by weekday: {week}");
}
