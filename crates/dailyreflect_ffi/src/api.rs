//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose journal and reminder use-cases to Dart via FRB.
//! - Flatten core types into plain records the UI can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every call opens its own connection; no connection outlives a call.
//! - The Flutter shell mirrors `reminder_pending` into the native
//!   notification plugin after every `reminder_save` / `app_launch`.

use chrono::{Local, Utc};
use dailyreflect_core::db::open_db;
use dailyreflect_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, AppConfig,
    AppContext, DateKey, EntryStore, EntryStoreError, JournalEntry, PermissionStatus,
    ReminderDraft, ReminderTime, SqliteKvStore, SqliteNotificationQueue, DAILY_QUESTION,
};
use log::error;
use std::path::PathBuf;
use std::sync::OnceLock;

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

type CoreContext<'conn> = AppContext<SqliteKvStore<'conn>, SqliteNotificationQueue<'conn>>;

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory for rolling logs.
/// - Idempotent for the same arguments; returns empty string on success and
///   the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// The reflection question shown on the today screen.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_question() -> String {
    DAILY_QUESTION.to_owned()
}

/// One journal entry as rendered by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryItem {
    /// `YYYY-MM-DD`.
    pub date_key: String,
    /// RFC 3339 timestamp of the last write.
    pub date: String,
    pub answer: String,
}

/// Result envelope for entry writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryActionResponse {
    pub ok: bool,
    /// `true` when the failure is user-correctable (blank answer, bad date).
    pub validation_error: bool,
    pub entry: Option<EntryItem>,
    pub message: String,
}

impl EntryActionResponse {
    fn success(entry: &JournalEntry) -> Self {
        Self {
            ok: true,
            validation_error: false,
            entry: Some(to_entry_item(entry)),
            message: "Your journal entry has been saved!".to_string(),
        }
    }

    fn failure(validation_error: bool, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            validation_error,
            entry: None,
            message: message.into(),
        }
    }
}

/// Reminder settings as shown on the settings screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSettings {
    pub enabled: bool,
    pub hour: u32,
    pub minute: u32,
    pub permission_granted: bool,
}

/// Result envelope for reminder saves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderActionResponse {
    pub ok: bool,
    /// Whether a trigger is actually pending after the save.
    pub scheduled: bool,
    pub message: String,
}

/// Pending trigger the shell must register natively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReminderItem {
    pub id: String,
    pub hour: u32,
    pub minute: u32,
    pub title: String,
    pub body: String,
    /// Route opened when the notification is tapped.
    pub target_screen: String,
}

/// Launch reconciliation summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchResponse {
    pub repaired_day: Option<String>,
    pub reminder_enabled: bool,
    pub reminder_scheduled: bool,
    pub message: String,
}

/// Today's date key from device local time.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_today_key() -> String {
    EntryStore::<SqliteKvStore<'static>>::today_key(&Local::now()).to_string()
}

/// Gets one entry. `None` for missing, unreadable, or malformed keys.
pub fn entry_get(date_key: String) -> Option<EntryItem> {
    let key = DateKey::parse(&date_key).ok()?;
    with_context(|context| context.entries().get_entry(&key))
        .ok()
        .flatten()
        .map(|entry| to_entry_item(&entry))
}

/// Saves (or overwrites) today's entry.
pub fn entry_save_today(answer: String) -> EntryActionResponse {
    entry_save(entry_today_key(), answer)
}

/// Saves (or overwrites) the entry for `date_key`.
pub fn entry_save(date_key: String, answer: String) -> EntryActionResponse {
    let key = match DateKey::parse(&date_key) {
        Ok(key) => key,
        Err(err) => return EntryActionResponse::failure(true, err.to_string()),
    };

    match with_context(|context| context.entries().save_entry(key, &answer, Utc::now())) {
        Ok(Ok(entry)) => EntryActionResponse::success(&entry),
        Ok(Err(EntryStoreError::Validation(_))) => {
            EntryActionResponse::failure(true, "Please enter an answer")
        }
        Ok(Err(err @ EntryStoreError::SaveFailed(_))) => {
            EntryActionResponse::failure(false, format!("Failed to save your entry: {err}"))
        }
        Err(err) => EntryActionResponse::failure(false, err),
    }
}

/// All entries, newest first. Empty on any failure.
pub fn entry_list() -> Vec<EntryItem> {
    with_context(|context| context.entries().list_entries())
        .unwrap_or_default()
        .iter()
        .map(to_entry_item)
        .collect()
}

/// Persisted reminder settings for the settings screen.
pub fn reminder_load() -> ReminderSettings {
    with_context(|context| {
        let reminders = context.reminders();
        let draft = ReminderDraft::from_config(&reminders.load_config());
        ReminderSettings {
            enabled: draft.enabled(),
            hour: u32::from(draft.time().hour()),
            minute: u32::from(draft.time().minute()),
            permission_granted: reminders.check_permission(),
        }
    })
    .unwrap_or_else(|_| {
        let draft = ReminderDraft::from_config(&Default::default());
        ReminderSettings {
            enabled: false,
            hour: u32::from(draft.time().hour()),
            minute: u32::from(draft.time().minute()),
            permission_granted: false,
        }
    })
}

/// Applies the settings screen's save action.
///
/// Permission is requested when enabling but never blocks the save.
pub fn reminder_save(enabled: bool, hour: u32, minute: u32) -> ReminderActionResponse {
    let time = match ReminderTime::new(hour, minute) {
        Ok(time) => time,
        Err(err) => return reminder_failure(err.to_string()),
    };

    let result = with_context(|context| {
        let reminders = context.reminders_mut();
        let mut draft = ReminderDraft::from_config(&reminders.load_config());
        draft.set_enabled(enabled);
        draft.set_time(time);
        if enabled {
            reminders.ensure_permission();
        }
        draft.save(reminders)
    });

    match result {
        Ok(Ok(outcome)) => ReminderActionResponse {
            ok: true,
            scheduled: outcome.scheduled(),
            message: "Settings saved successfully".to_string(),
        },
        Ok(Err(err)) => reminder_failure(format!(
            "Failed to save settings. Please try again. ({err})"
        )),
        Err(err) => reminder_failure(err),
    }
}

/// Records the native permission prompt result from the shell.
pub fn reminder_set_permission(granted: bool) -> String {
    let status = if granted {
        PermissionStatus::Granted
    } else {
        PermissionStatus::Denied
    };
    match with_context(|context| context.reminders().platform().set_permission(status)) {
        Ok(Ok(())) => String::new(),
        Ok(Err(err)) => err.to_string(),
        Err(err) => err,
    }
}

/// Pending reminders to mirror into the native notification center.
pub fn reminder_pending() -> Vec<PendingReminderItem> {
    with_context(|context| context.reminders().scheduled_diagnostics())
        .unwrap_or_default()
        .into_iter()
        .map(|notification| PendingReminderItem {
            id: notification.id,
            hour: u32::from(notification.trigger.hour()),
            minute: u32::from(notification.trigger.minute()),
            title: notification.payload.title,
            body: notification.payload.body,
            target_screen: notification.payload.target_screen.as_str().to_string(),
        })
        .collect()
}

/// Runs launch reconciliation: index repair and reminder re-assertion.
pub fn app_launch() -> LaunchResponse {
    match with_context(|context| context.launch()) {
        Ok(report) => {
            let reminder_enabled = report
                .reminder
                .as_ref()
                .is_some_and(|outcome| outcome.state.is_enabled());
            let reminder_scheduled = report
                .reminder
                .as_ref()
                .is_some_and(|outcome| outcome.scheduled());
            LaunchResponse {
                repaired_day: report.repaired_day.map(|day| day.to_string()),
                reminder_enabled,
                reminder_scheduled,
                message: if report.reminder.is_some() {
                    "Launch reconciliation complete.".to_string()
                } else {
                    "Launch reconciliation could not save reminder settings.".to_string()
                },
            }
        }
        Err(err) => LaunchResponse {
            repaired_day: None,
            reminder_enabled: false,
            reminder_scheduled: false,
            message: err,
        },
    }
}

fn reminder_failure(message: impl Into<String>) -> ReminderActionResponse {
    ReminderActionResponse {
        ok: false,
        scheduled: false,
        message: message.into(),
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH.get_or_init(|| AppConfig::from_env().db_path).clone()
}

fn with_context<T>(f: impl FnOnce(&mut CoreContext<'_>) -> T) -> Result<T, String> {
    let db_path = resolve_db_path();
    let conn = open_db(&db_path).map_err(|err| {
        error!(
            "event=ffi_db_open module=ffi status=error path={} error={err}",
            db_path.display()
        );
        format!("journal DB open failed: {err}")
    })?;
    let mut context = AppContext::from_connection(&conn);
    Ok(f(&mut context))
}

fn to_entry_item(entry: &JournalEntry) -> EntryItem {
    EntryItem {
        date_key: entry.date_key.to_string(),
        date: entry.date.to_rfc3339(),
        answer: entry.answer.clone(),
    }
}
