//! Application context owning the core services.
//!
//! # Responsibility
//! - Construct the entry store, reminder scheduler and notification
//!   listeners over one persistence backend.
//! - Run the launch-time reconciliation passes.
//! - Tear down listener subscriptions deterministically.
//!
//! # Invariants
//! - Listeners live exactly as long as the context; `shutdown` and drop both
//!   clear them.
//! - `launch` never fails: each pass logs its own errors.

use crate::kv::{KeyValueStore, SqliteKvStore};
use crate::listeners::NotificationListeners;
use crate::model::entry::DateKey;
use crate::platform::{NotificationPlatform, SqliteNotificationQueue};
use crate::service::entry_store::EntryStore;
use crate::service::reminder_scheduler::{ReminderOutcome, ReminderScheduler};
use log::{error, info};
use rusqlite::Connection;

/// What the launch passes did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    /// Day re-added to the index from a pending intent.
    pub repaired_day: Option<DateKey>,
    /// Reminder re-assertion result; `None` when it failed to persist.
    pub reminder: Option<ReminderOutcome>,
}

pub struct AppContext<S, P>
where
    S: KeyValueStore + Clone,
    P: NotificationPlatform,
{
    entries: EntryStore<S>,
    reminders: ReminderScheduler<S, P>,
    listeners: NotificationListeners,
}

impl<S, P> AppContext<S, P>
where
    S: KeyValueStore + Clone,
    P: NotificationPlatform,
{
    pub fn new(store: S, platform: P) -> Self {
        Self {
            entries: EntryStore::new(store.clone()),
            reminders: ReminderScheduler::new(store, platform),
            listeners: NotificationListeners::new(),
        }
    }

    /// Repairs the day index, then re-asserts the persisted reminder state.
    pub fn launch(&mut self) -> LaunchReport {
        let repaired_day = match self.entries.repair_index() {
            Ok(day) => day,
            Err(err) => {
                error!("event=app_launch module=app status=error step=index_repair error={err}");
                None
            }
        };

        let reminder = match self.reminders.reconcile_on_launch() {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                error!("event=app_launch module=app status=error step=reminder_reconcile error={err}");
                None
            }
        };

        info!(
            "event=app_launch module=app status=ok index_repaired={} reminder_enabled={} reminder_scheduled={}",
            repaired_day.is_some(),
            reminder
                .as_ref()
                .is_some_and(|outcome| outcome.state.is_enabled()),
            reminder.as_ref().is_some_and(ReminderOutcome::scheduled)
        );

        LaunchReport {
            repaired_day,
            reminder,
        }
    }

    pub fn entries(&self) -> &EntryStore<S> {
        &self.entries
    }

    pub fn reminders(&self) -> &ReminderScheduler<S, P> {
        &self.reminders
    }

    pub fn reminders_mut(&mut self) -> &mut ReminderScheduler<S, P> {
        &mut self.reminders
    }

    pub fn listeners(&self) -> &NotificationListeners {
        &self.listeners
    }

    pub fn listeners_mut(&mut self) -> &mut NotificationListeners {
        &mut self.listeners
    }

    /// Drops all listener subscriptions. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.listeners.clear();
    }
}

impl<'conn> AppContext<SqliteKvStore<'conn>, SqliteNotificationQueue<'conn>> {
    /// Context over one migrated SQLite connection.
    pub fn from_connection(conn: &'conn Connection) -> Self {
        Self::new(
            SqliteKvStore::new(conn),
            SqliteNotificationQueue::new(conn),
        )
    }
}

impl<S, P> Drop for AppContext<S, P>
where
    S: KeyValueStore + Clone,
    P: NotificationPlatform,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}
