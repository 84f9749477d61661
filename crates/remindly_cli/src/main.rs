//! Remindly command-line entry point.
//!
//! # Responsibility
//! - Parse flags/subcommands and open the owner's database.
//! - Hand every operation to `remindly_core`; no business rules live here.

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use chrono::{NaiveDate, NaiveDateTime};
use remindly_core::{Category, ExportFormat, Priority, StatusFilter};
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "remindly")]
#[command(about = "Tasks and recurring reminders from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database file
    #[arg(long, env = "REMINDLY_DB_PATH", default_value = "remindly.db", global = true)]
    db_path: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "REMINDLY_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error (defaults by build mode)
    #[arg(long, env = "REMINDLY_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Owner id every record is scoped to
    #[arg(long, env = "REMINDLY_OWNER", default_value = "local", global = true)]
    owner: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a task or reminder
    Add {
        #[command(subcommand)]
        item: AddCommands,
    },
    /// List tasks or reminders
    List {
        kind: ItemKind,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Toggle the completion flag of one item
    Complete { kind: ItemKind, id: Uuid },
    /// Delete one item (or a whole reminder series)
    Delete {
        kind: ItemKind,
        id: Uuid,
        /// Delete every occurrence of the reminder's series without asking
        #[arg(long, conflicts_with = "only_this")]
        all_series: bool,
        /// Delete only this occurrence without asking
        #[arg(long)]
        only_this: bool,
    },
    /// Export all tasks and reminders
    Export {
        #[arg(long, value_parser = parse_format, default_value = "json")]
        format: ExportFormat,
        /// Output file, `-` for stdout; defaults to the format's file name
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Print completion statistics
    Stats,
    /// Run the periodic due-check until Ctrl-C
    Watch {
        /// Seconds between due-checks
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
    },
}

#[derive(Subcommand)]
enum AddCommands {
    Task {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Due date, YYYY-MM-DD
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long, value_parser = parse_priority, default_value = "medium")]
        priority: Priority,
        #[arg(long, value_parser = parse_category, default_value = "other")]
        category: Category,
    },
    Reminder {
        title: String,
        /// Scheduled local time, YYYY-MM-DDTHH:MM[:SS]
        #[arg(long, value_parser = parse_datetime)]
        at: NaiveDateTime,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_priority, default_value = "medium")]
        priority: Priority,
        #[arg(long, value_parser = parse_category, default_value = "other")]
        category: Category,
        #[command(flatten)]
        repeat: RepeatArgs,
    },
}

#[derive(Args)]
struct RepeatArgs {
    #[arg(long, value_enum)]
    repeat: Option<RepeatKind>,
    /// Periods between occurrences
    #[arg(long, default_value_t = 1, requires = "repeat")]
    every: u32,
    /// Weekday indexes for weekly rules, 0 = Sunday
    #[arg(long, value_delimiter = ',', requires = "repeat")]
    days: Vec<u8>,
    #[arg(long, requires = "repeat")]
    day_of_month: Option<u32>,
    /// Series ends at the start of this date
    #[arg(long, requires = "repeat")]
    until: Option<NaiveDate>,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long, value_parser = parse_priority)]
    priority: Option<Priority>,
    #[arg(long, value_parser = parse_category)]
    category: Option<Category>,
    #[arg(long, value_parser = parse_status, default_value = "all")]
    status: StatusFilter,
}

#[derive(Clone, Copy, ValueEnum)]
enum ItemKind {
    Task,
    Reminder,
}

#[derive(Clone, Copy, ValueEnum)]
enum RepeatKind {
    Daily,
    Weekly,
    Monthly,
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    Priority::parse(value).ok_or_else(|| format!("unknown priority `{value}`"))
}

fn parse_category(value: &str) -> Result<Category, String> {
    Category::parse(value).ok_or_else(|| format!("unknown category `{value}`"))
}

fn parse_format(value: &str) -> Result<ExportFormat, String> {
    ExportFormat::parse(value).ok_or_else(|| format!("unknown export format `{value}`"))
}

fn parse_status(value: &str) -> Result<StatusFilter, String> {
    StatusFilter::parse(value).ok_or_else(|| format!("unknown status `{value}`"))
}

fn parse_datetime(value: &str) -> Result<NaiveDateTime, String> {
    let trimmed = value.trim();
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DDTHH:MM[:SS], got `{value}`"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli
            .log_level
            .clone()
            .unwrap_or_else(|| remindly_core::default_log_level().to_string());
        if let Err(err) = remindly_core::init_logging(&level, &log_dir.to_string_lossy()) {
            eprintln!("logging disabled: {err}");
        }
    }

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
