//! Core domain logic for the daily reflection journal.
//! UI shells (Flutter via FFI, the CLI) call into this crate and hold no
//! business rules of their own.

pub mod app;
pub mod config;
pub mod db;
pub mod kv;
pub mod listeners;
pub mod logging;
pub mod model;
pub mod platform;
pub mod service;

pub use app::{AppContext, LaunchReport};
pub use config::AppConfig;
pub use kv::{KeyValueStore, KvError, KvResult, SqliteKvStore};
pub use listeners::{ForegroundPresentation, ListenerId, NotificationListeners, NotificationResponse};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::entry::{DateKey, DayIndex, EntryValidationError, JournalEntry};
pub use model::reminder::{
    ReminderConfig, ReminderState, ReminderTime, ReminderValidationError, DEFAULT_REMINDER_TIME,
};
pub use platform::{
    NotificationPayload, NotificationPlatform, PermissionStatus, PlatformError, PlatformResult,
    ScheduledNotification, SqliteNotificationQueue, TargetScreen,
};
pub use service::entry_store::{EntryStore, EntryStoreError};
pub use service::reminder_scheduler::{
    ReminderDraft, ReminderError, ReminderOutcome, ReminderScheduler,
};

/// The one reflection question asked each day.
pub const DAILY_QUESTION: &str = "Was there something positive today?";

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
