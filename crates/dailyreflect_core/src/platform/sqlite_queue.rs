//! Pending-notification queue persisted in SQLite.
//!
//! Hosts without direct OS bindings (the CLI, or a Flutter shell that owns
//! the native plugin) read this queue and mirror it into the real
//! notification center. Permission is recorded in a single-row table.

use super::{
    NotificationPayload, NotificationPlatform, PermissionStatus, PlatformError, PlatformResult,
    ScheduledNotification, TargetScreen,
};
use crate::model::reminder::ReminderTime;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

#[derive(Clone, Copy)]
pub struct SqliteNotificationQueue<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationQueue<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Records the host's answer to a permission prompt.
    pub fn set_permission(&self, status: PermissionStatus) -> PlatformResult<()> {
        self.conn.execute(
            "UPDATE notification_permission SET status = ?1 WHERE id = 1;",
            [status.as_str()],
        )?;
        Ok(())
    }
}

impl NotificationPlatform for SqliteNotificationQueue<'_> {
    fn schedule_recurring_daily(
        &self,
        time: ReminderTime,
        payload: &NotificationPayload,
    ) -> PlatformResult<String> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO scheduled_notifications (id, hour, minute, title, body, target_screen)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id,
                i64::from(time.hour()),
                i64::from(time.minute()),
                payload.title,
                payload.body,
                payload.target_screen.as_str(),
            ],
        )?;
        Ok(id)
    }

    fn cancel_all(&self) -> PlatformResult<()> {
        self.conn
            .execute("DELETE FROM scheduled_notifications;", [])?;
        Ok(())
    }

    fn list_scheduled(&self) -> PlatformResult<Vec<ScheduledNotification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, hour, minute, title, body, target_screen
             FROM scheduled_notifications
             ORDER BY created_at ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut scheduled = Vec::new();
        while let Some(row) = rows.next()? {
            scheduled.push(parse_notification_row(row)?);
        }
        Ok(scheduled)
    }

    fn permission_status(&self) -> PlatformResult<PermissionStatus> {
        let status: String = self.conn.query_row(
            "SELECT status FROM notification_permission WHERE id = 1;",
            [],
            |row| row.get(0),
        )?;
        PermissionStatus::parse(&status).ok_or_else(|| {
            PlatformError::InvalidData(format!("invalid permission status `{status}`"))
        })
    }

    fn request_permission(&self) -> PlatformResult<PermissionStatus> {
        // No interactive prompt exists for a local queue; an undecided
        // permission is granted, an explicit denial sticks.
        match self.permission_status()? {
            PermissionStatus::Undetermined => {
                self.set_permission(PermissionStatus::Granted)?;
                Ok(PermissionStatus::Granted)
            }
            decided => Ok(decided),
        }
    }
}

fn parse_notification_row(row: &Row<'_>) -> PlatformResult<ScheduledNotification> {
    let id: String = row.get("id")?;
    let hour: i64 = row.get("hour")?;
    let minute: i64 = row.get("minute")?;
    let trigger = u32::try_from(hour)
        .ok()
        .zip(u32::try_from(minute).ok())
        .and_then(|(hour, minute)| ReminderTime::new(hour, minute).ok())
        .ok_or_else(|| {
            PlatformError::InvalidData(format!("invalid trigger {hour}:{minute} for `{id}`"))
        })?;

    let screen: String = row.get("target_screen")?;
    let target_screen = TargetScreen::parse(&screen).ok_or_else(|| {
        PlatformError::InvalidData(format!("invalid target screen `{screen}` for `{id}`"))
    })?;

    Ok(ScheduledNotification {
        id,
        trigger,
        payload: NotificationPayload {
            title: row.get("title")?,
            body: row.get("body")?,
            target_screen,
        },
    })
}
