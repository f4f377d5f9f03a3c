//! Terminal front end for the daily reflection journal.
//!
//! # Responsibility
//! - Drive the core journal and reminder use-cases from a shell.
//! - Run launch reconciliation before every command, like the mobile shell.
//!
//! # Invariants
//! - One SQLite connection per invocation.
//! - Reminder triggers land in the SQLite notification queue; nothing is
//!   delivered from this process.

use anyhow::{anyhow, Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use dailyreflect_core::db::open_db;
use dailyreflect_core::{
    init_logging_from_config, AppConfig, AppContext, DateKey, EntryStore, JournalEntry,
    ReminderDraft, ReminderTime, SqliteKvStore, SqliteNotificationQueue, DAILY_QUESTION,
};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dailyreflect")]
#[command(about = "One positive thing, every day", long_about = None)]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "DAILYREFLECT_DB_PATH", value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show today's question and answer
    Today,

    /// Save an answer (today unless --date is given)
    Write {
        /// Answer text
        answer: String,

        /// Day to write, YYYY-MM-DD
        #[arg(short, long, value_name = "DATE")]
        date: Option<String>,
    },

    /// Show the entry for one day
    Show {
        /// Day to show, YYYY-MM-DD
        date: String,
    },

    /// List past entries, newest first
    History,

    /// Inspect or change the daily reminder
    Reminder {
        #[command(subcommand)]
        action: ReminderAction,
    },

    /// Run launch reconciliation and print what changed
    Launch,
}

#[derive(Subcommand, Debug)]
enum ReminderAction {
    /// Show the saved reminder settings and pending trigger
    Status,

    /// Enable the reminder, optionally at a new time (HH:MM)
    On {
        #[arg(value_name = "HH:MM")]
        time: Option<String>,
    },

    /// Disable the reminder
    Off,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("warning: logging disabled: {err}");
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    let mut context = AppContext::from_connection(&conn);
    let report = context.launch();
    info!(
        "event=cli_launch module=cli status=ok repaired={}",
        report.repaired_day.is_some()
    );

    match cli.command {
        Commands::Today => {
            let today = EntryStore::<SqliteKvStore<'static>>::today_key(&Local::now());
            println!("{today}  {DAILY_QUESTION}");
            match context.entries().get_entry(&today) {
                Some(entry) => println!("{}", entry.answer),
                None => println!("(no answer yet)"),
            }
        }
        Commands::Write { answer, date } => {
            let key = match date {
                Some(raw) => DateKey::parse(&raw)?,
                None => EntryStore::<SqliteKvStore<'static>>::today_key(&Local::now()),
            };
            let entry = context.entries().save_entry(key, &answer, Utc::now())?;
            println!("Saved entry for {}.", entry.date_key);
        }
        Commands::Show { date } => {
            let key = DateKey::parse(&date)?;
            let entry = context
                .entries()
                .get_entry(&key)
                .ok_or_else(|| anyhow!("no entry for {key}"))?;
            print_entry(&entry);
        }
        Commands::History => {
            let entries = context.entries().list_entries();
            if entries.is_empty() {
                println!("No entries yet.");
            }
            for entry in &entries {
                print_entry(entry);
            }
        }
        Commands::Reminder { action } => run_reminder(&mut context, action)?,
        Commands::Launch => {
            match report.repaired_day {
                Some(day) => println!("Repaired day index: {day}"),
                None => println!("Day index consistent."),
            }
            match report.reminder {
                Some(outcome) => println!(
                    "Reminder {} (scheduled: {})",
                    if outcome.state.is_enabled() { "on" } else { "off" },
                    outcome.scheduled()
                ),
                None => println!("Reminder settings could not be saved."),
            }
        }
    }

    context.shutdown();
    Ok(())
}

fn run_reminder(
    context: &mut AppContext<SqliteKvStore<'_>, SqliteNotificationQueue<'_>>,
    action: ReminderAction,
) -> Result<()> {
    let reminders = context.reminders_mut();
    let mut draft = ReminderDraft::from_config(&reminders.load_config());

    match action {
        ReminderAction::Status => {
            println!(
                "Reminder {} at {}",
                if draft.enabled() { "on" } else { "off" },
                draft.time()
            );
            println!("Permission granted: {}", reminders.check_permission());
            for pending in reminders.scheduled_diagnostics() {
                println!(
                    "pending {} daily at {} -> {}",
                    pending.id,
                    pending.trigger,
                    pending.payload.target_screen.as_str()
                );
            }
            return Ok(());
        }
        ReminderAction::On { time } => {
            if let Some(raw) = time {
                draft.set_time(ReminderTime::parse(&raw)?);
            }
            draft.set_enabled(true);
            reminders.ensure_permission();
        }
        ReminderAction::Off => draft.set_enabled(false),
    }

    let outcome = draft.save(reminders)?;
    if outcome.state.is_enabled() && !outcome.scheduled() {
        println!("Reminder saved, but no trigger could be scheduled.");
    } else {
        println!("Settings saved successfully.");
    }
    Ok(())
}

fn print_entry(entry: &JournalEntry) {
    println!(
        "{}  ({})\n  {}",
        entry.date_key,
        entry.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        entry.answer
    );
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, ReminderAction};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_write_with_date() {
        let cli = Cli::parse_from([
            "dailyreflect",
            "write",
            "Sunny walk",
            "--date",
            "2024-01-01",
        ]);
        match cli.command {
            Commands::Write { answer, date } => {
                assert_eq!(answer, "Sunny walk");
                assert_eq!(date.as_deref(), Some("2024-01-01"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_reminder_on_with_time() {
        let cli = Cli::parse_from([
            "dailyreflect",
            "--db",
            "/tmp/x.sqlite3",
            "reminder",
            "on",
            "09:30",
        ]);
        assert!(cli.db.is_some());
        assert!(matches!(
            cli.command,
            Commands::Reminder {
                action: ReminderAction::On { time: Some(_) }
            }
        ));
    }
}
