//! Local notification platform contract.
//!
//! # Responsibility
//! - Define what the reminder scheduler needs from the OS notification
//!   service: register/cancel/list recurring daily triggers and permissions.
//! - Provide a SQLite-backed queue implementation for hosts that mirror
//!   pending reminders into their native notification API.
//!
//! # Invariants
//! - `schedule_recurring_daily` returns an id unique among pending triggers.
//! - `cancel_all` on an empty queue succeeds.

use crate::db::DbError;
use crate::model::reminder::ReminderTime;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite_queue;

pub use sqlite_queue::SqliteNotificationQueue;

pub type PlatformResult<T> = Result<T, PlatformError>;

/// Notification scheduling or permission failure.
#[derive(Debug)]
pub enum PlatformError {
    /// Platform refused to register the trigger.
    Rejected(String),
    /// Backing queue storage failed.
    Storage(DbError),
    /// Queue row could not be mapped back to a notification.
    InvalidData(String),
}

impl Display for PlatformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "notification rejected: {reason}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid queued notification: {message}"),
        }
    }
}

impl Error for PlatformError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Rejected(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for PlatformError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(DbError::Sqlite(value))
    }
}

/// Notification permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Undetermined => "undetermined",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "granted" => Some(Self::Granted),
            "denied" => Some(Self::Denied),
            "undetermined" => Some(Self::Undetermined),
            _ => None,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Screen the UI navigates to when a notification is tapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetScreen {
    Today,
    Journal,
    Settings,
}

impl TargetScreen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Journal => "journal",
            Self::Settings => "settings",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "today" => Some(Self::Today),
            "journal" => Some(Self::Journal),
            "settings" => Some(Self::Settings),
            _ => None,
        }
    }
}

/// Content delivered with a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub target_screen: TargetScreen,
}

impl NotificationPayload {
    /// The daily reflection prompt, opening the today screen.
    pub fn daily_reflection() -> Self {
        Self {
            title: "Daily Reflection".to_string(),
            body: "Take a moment to reflect on your day. What positive thing happened today?"
                .to_string(),
            target_screen: TargetScreen::Today,
        }
    }
}

/// One pending recurring trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledNotification {
    pub id: String,
    pub trigger: ReminderTime,
    pub payload: NotificationPayload,
}

/// OS local-notification service.
pub trait NotificationPlatform {
    fn schedule_recurring_daily(
        &self,
        time: ReminderTime,
        payload: &NotificationPayload,
    ) -> PlatformResult<String>;
    fn cancel_all(&self) -> PlatformResult<()>;
    fn list_scheduled(&self) -> PlatformResult<Vec<ScheduledNotification>>;
    fn permission_status(&self) -> PlatformResult<PermissionStatus>;
    fn request_permission(&self) -> PlatformResult<PermissionStatus>;
}

impl<T: NotificationPlatform + ?Sized> NotificationPlatform for &T {
    fn schedule_recurring_daily(
        &self,
        time: ReminderTime,
        payload: &NotificationPayload,
    ) -> PlatformResult<String> {
        (**self).schedule_recurring_daily(time, payload)
    }

    fn cancel_all(&self) -> PlatformResult<()> {
        (**self).cancel_all()
    }

    fn list_scheduled(&self) -> PlatformResult<Vec<ScheduledNotification>> {
        (**self).list_scheduled()
    }

    fn permission_status(&self) -> PlatformResult<PermissionStatus> {
        (**self).permission_status()
    }

    fn request_permission(&self) -> PlatformResult<PermissionStatus> {
        (**self).request_permission()
    }
}
