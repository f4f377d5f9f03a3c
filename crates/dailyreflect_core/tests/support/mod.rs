#![allow(dead_code)]

use dailyreflect_core::db::DbError;
use dailyreflect_core::{
    KeyValueStore, KvError, KvResult, NotificationPayload, NotificationPlatform,
    PermissionStatus, PlatformError, PlatformResult, ReminderTime, ScheduledNotification,
};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};

/// In-memory key-value store with per-key read/write failure injection.
#[derive(Default)]
pub struct FlakyKv {
    values: RefCell<BTreeMap<String, String>>,
    failing_gets: RefCell<HashSet<String>>,
    failing_sets: RefCell<HashSet<String>>,
}

impl FlakyKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_get(&self, key: &str) {
        self.failing_gets.borrow_mut().insert(key.to_string());
    }

    pub fn fail_set(&self, key: &str) {
        self.failing_sets.borrow_mut().insert(key.to_string());
    }

    pub fn heal(&self) {
        self.failing_gets.borrow_mut().clear();
        self.failing_sets.borrow_mut().clear();
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }
}

fn injected(key: &str) -> KvError {
    KvError::Db(DbError::Sqlite(rusqlite::Error::InvalidParameterName(
        format!("injected failure for {key}"),
    )))
}

impl KeyValueStore for FlakyKv {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        if self.failing_gets.borrow().contains(key) {
            return Err(injected(key));
        }
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> KvResult<()> {
        if self.failing_sets.borrow().contains(key) {
            return Err(injected(key));
        }
        self.put_raw(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> KvResult<()> {
        if self.failing_sets.borrow().contains(key) {
            return Err(injected(key));
        }
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

/// Notification platform double that can reject registrations.
pub struct FakePlatform {
    pending: RefCell<Vec<ScheduledNotification>>,
    next_id: Cell<u32>,
    reject_schedule: Cell<bool>,
    fail_cancel: Cell<bool>,
    permission: Cell<PermissionStatus>,
    grant_on_request: Cell<bool>,
    pub cancel_calls: Cell<u32>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            pending: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            reject_schedule: Cell::new(false),
            fail_cancel: Cell::new(false),
            permission: Cell::new(PermissionStatus::Granted),
            grant_on_request: Cell::new(true),
            cancel_calls: Cell::new(0),
        }
    }
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_schedules(&self, reject: bool) {
        self.reject_schedule.set(reject);
    }

    /// Makes `cancel_all` fail and leave pending triggers in place.
    pub fn fail_cancel(&self, fail: bool) {
        self.fail_cancel.set(fail);
    }

    pub fn set_permission(&self, status: PermissionStatus, grant_on_request: bool) {
        self.permission.set(status);
        self.grant_on_request.set(grant_on_request);
    }

    /// Simulates the OS silently dropping every pending trigger.
    pub fn drop_all_silently(&self) {
        self.pending.borrow_mut().clear();
    }

    /// Registers a trigger behind the scheduler's back.
    pub fn inject(&self, hour: u32, minute: u32) {
        let id = self.allocate_id();
        self.pending.borrow_mut().push(ScheduledNotification {
            id,
            trigger: ReminderTime::new(hour, minute).unwrap(),
            payload: NotificationPayload::daily_reflection(),
        });
    }

    pub fn pending(&self) -> Vec<ScheduledNotification> {
        self.pending.borrow().clone()
    }

    fn allocate_id(&self) -> String {
        self.next_id.set(self.next_id.get() + 1);
        format!("fake-{}", self.next_id.get())
    }
}

impl NotificationPlatform for FakePlatform {
    fn schedule_recurring_daily(
        &self,
        time: ReminderTime,
        payload: &NotificationPayload,
    ) -> PlatformResult<String> {
        if self.reject_schedule.get() {
            return Err(PlatformError::Rejected("permission not granted".to_string()));
        }
        let id = self.allocate_id();
        self.pending.borrow_mut().push(ScheduledNotification {
            id: id.clone(),
            trigger: time,
            payload: payload.clone(),
        });
        Ok(id)
    }

    fn cancel_all(&self) -> PlatformResult<()> {
        self.cancel_calls.set(self.cancel_calls.get() + 1);
        if self.fail_cancel.get() {
            return Err(PlatformError::Rejected("cancel failed".to_string()));
        }
        self.pending.borrow_mut().clear();
        Ok(())
    }

    fn list_scheduled(&self) -> PlatformResult<Vec<ScheduledNotification>> {
        Ok(self.pending())
    }

    fn permission_status(&self) -> PlatformResult<PermissionStatus> {
        Ok(self.permission.get())
    }

    fn request_permission(&self) -> PlatformResult<PermissionStatus> {
        let status = if self.grant_on_request.get() {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        self.permission.set(status);
        Ok(status)
    }
}
