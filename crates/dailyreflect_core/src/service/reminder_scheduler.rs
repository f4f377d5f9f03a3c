//! Daily reminder use-case service.
//!
//! # Responsibility
//! - Persist the reminder settings (`enabled`, `time`) and the last
//!   notification id.
//! - Apply `Disabled | Enabled(time)` transitions against the notification
//!   platform, and re-assert the persisted state on launch.
//!
//! # Invariants
//! - Every transition cancels all pending notifications before registering,
//!   so at most one daily reminder is ever pending. A failed cancel blocks
//!   registration for that transition.
//! - `NOTIFICATION_ID_KEY` holds the id of the live trigger or is absent.
//! - Platform failures are logged and swallowed; the desired settings are
//!   persisted regardless (`ReminderOutcome::scheduled` reports the truth).
//! - Persistence write failures surface as `ReminderError::SaveFailed` and do
//!   not undo platform calls already made.
//! - Transitions take `&mut self`; one scheduler cannot interleave two
//!   cancel/register pairs.

use crate::kv::{get_json, set_json, KeyValueStore, KvError};
use crate::model::reminder::{ReminderConfig, ReminderState, ReminderTime};
use crate::platform::{
    NotificationPayload, NotificationPlatform, PermissionStatus, PlatformResult,
    ScheduledNotification,
};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const REMINDER_ENABLED_KEY: &str = "@notification_enabled";
pub const REMINDER_TIME_KEY: &str = "@notification_time";
pub const NOTIFICATION_ID_KEY: &str = "@notification_id";

/// Error surfaced by reminder transitions.
#[derive(Debug)]
pub enum ReminderError {
    SaveFailed(KvError),
}

impl Display for ReminderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SaveFailed(err) => write!(f, "failed to save reminder settings: {err}"),
        }
    }
}

impl Error for ReminderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SaveFailed(err) => Some(err),
        }
    }
}

/// Result of one applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderOutcome {
    /// State that was persisted.
    pub state: ReminderState,
    /// Id of the registered trigger; `None` when disabled, rejected, or
    /// skipped because old triggers could not be cancelled.
    pub notification_id: Option<String>,
    /// Permission observed before registering, when it could be read.
    pub permission: Option<PermissionStatus>,
}

impl ReminderOutcome {
    /// Whether a trigger is actually pending for an enabled state.
    pub fn scheduled(&self) -> bool {
        self.notification_id.is_some()
    }
}

/// Reminder state machine over a key-value store and notification platform.
pub struct ReminderScheduler<S: KeyValueStore, P: NotificationPlatform> {
    store: S,
    platform: P,
    last_applied: Option<ReminderState>,
}

impl<S: KeyValueStore, P: NotificationPlatform> ReminderScheduler<S, P> {
    pub fn new(store: S, platform: P) -> Self {
        Self {
            store,
            platform,
            last_applied: None,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// State applied by the most recent successful transition in this process.
    pub fn last_applied(&self) -> Option<ReminderState> {
        self.last_applied
    }

    /// Reads persisted settings. Unreadable fields fall back to disabled /
    /// no time.
    pub fn load_config(&self) -> ReminderConfig {
        let enabled = match get_json::<bool, _>(&self.store, REMINDER_ENABLED_KEY) {
            Ok(value) => value.unwrap_or(false),
            Err(err) => {
                error!("event=reminder_load module=reminder status=error field=enabled error={err}");
                false
            }
        };

        let time = match get_json::<String, _>(&self.store, REMINDER_TIME_KEY) {
            Ok(Some(raw)) => match ReminderTime::parse(&raw) {
                Ok(time) => Some(time),
                Err(err) => {
                    warn!("event=reminder_load module=reminder status=invalid field=time error={err}");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                error!("event=reminder_load module=reminder status=error field=time error={err}");
                None
            }
        };

        ReminderConfig { enabled, time }
    }

    /// Applies `desired` against the platform and persists it.
    pub fn apply(&mut self, desired: ReminderState) -> Result<ReminderOutcome, ReminderError> {
        let cancelled = self.cancel_pending();

        let outcome = match desired {
            ReminderState::Disabled => {
                self.persist(REMINDER_ENABLED_KEY, &false)?;
                self.forget_notification_id()?;
                info!("event=reminder_apply module=reminder status=ok state=disabled");
                ReminderOutcome {
                    state: desired,
                    notification_id: None,
                    permission: None,
                }
            }
            ReminderState::Enabled(time) => self.enable(time, cancelled)?,
        };

        self.last_applied = Some(outcome.state);
        Ok(outcome)
    }

    /// Re-applies the persisted state unconditionally.
    ///
    /// Launch is treated as a re-assertion: the platform may have dropped the
    /// trigger (reinstall, revoked permission) without telling us.
    pub fn reconcile_on_launch(&mut self) -> Result<ReminderOutcome, ReminderError> {
        let config = self.load_config();
        debug!(
            "event=reminder_reconcile module=reminder status=start enabled={} time={}",
            config.enabled,
            config
                .time
                .map_or_else(|| "none".to_string(), |time| time.to_string())
        );
        self.apply(config.desired_state())
    }

    /// Returns the permission, prompting once if not yet granted.
    pub fn ensure_permission(&self) -> PermissionStatus {
        let current = match self.platform.permission_status() {
            Ok(status) => status,
            Err(err) => {
                error!("event=reminder_permission module=reminder status=error step=query error={err}");
                return PermissionStatus::Denied;
            }
        };
        if current.is_granted() {
            return current;
        }

        match self.platform.request_permission() {
            Ok(status) => {
                info!(
                    "event=reminder_permission module=reminder status=ok previous={} result={}",
                    current.as_str(),
                    status.as_str()
                );
                status
            }
            Err(err) => {
                error!("event=reminder_permission module=reminder status=error step=request error={err}");
                PermissionStatus::Denied
            }
        }
    }

    /// Whether notification permission is granted; errors read as `false`.
    pub fn check_permission(&self) -> bool {
        match self.platform.permission_status() {
            Ok(status) => status.is_granted(),
            Err(err) => {
                error!("event=reminder_permission module=reminder status=error step=query error={err}");
                false
            }
        }
    }

    /// Pending notifications as the platform reports them.
    pub fn scheduled_diagnostics(&self) -> Vec<ScheduledNotification> {
        match self.platform.list_scheduled() {
            Ok(scheduled) => scheduled,
            Err(err) => {
                error!("event=reminder_list module=reminder status=error error={err}");
                Vec::new()
            }
        }
    }

    fn enable(
        &self,
        time: ReminderTime,
        cancelled: PlatformResult<()>,
    ) -> Result<ReminderOutcome, ReminderError> {
        let permission = match self.platform.permission_status() {
            Ok(status) => Some(status),
            Err(err) => {
                warn!("event=reminder_apply module=reminder status=permission_unknown error={err}");
                None
            }
        };
        if let Some(status) = permission.filter(|status| !status.is_granted()) {
            warn!(
                "event=reminder_apply module=reminder status=permission_missing permission={}",
                status.as_str()
            );
        }

        let notification_id = match cancelled {
            // An old trigger may still be pending; a second one would double
            // the daily alert.
            Err(err) => {
                warn!(
                    "event=reminder_apply module=reminder status=schedule_skipped reason=cancel_failed time={time} error={err}"
                );
                None
            }
            Ok(()) => self.register(time),
        };

        match &notification_id {
            Some(id) => self.persist(NOTIFICATION_ID_KEY, id)?,
            None => self.forget_notification_id()?,
        }
        self.persist(REMINDER_ENABLED_KEY, &true)?;
        self.persist(REMINDER_TIME_KEY, &time.storage_value())?;

        self.log_pending();
        info!(
            "event=reminder_apply module=reminder status=ok state=enabled time={time} scheduled={}",
            notification_id.is_some()
        );
        Ok(ReminderOutcome {
            state: ReminderState::Enabled(time),
            notification_id,
            permission,
        })
    }

    fn register(&self, time: ReminderTime) -> Option<String> {
        let payload = NotificationPayload::daily_reflection();
        match self.platform.schedule_recurring_daily(time, &payload) {
            Ok(id) => Some(id),
            Err(err) => {
                error!(
                    "event=reminder_apply module=reminder status=platform_error time={time} error={err}"
                );
                None
            }
        }
    }

    fn cancel_pending(&self) -> PlatformResult<()> {
        self.platform.cancel_all().map_err(|err| {
            error!("event=reminder_cancel module=reminder status=error error={err}");
            err
        })
    }

    fn forget_notification_id(&self) -> Result<(), ReminderError> {
        self.store.remove(NOTIFICATION_ID_KEY).map_err(|err| {
            error!(
                "event=reminder_save module=reminder status=error key={NOTIFICATION_ID_KEY} error={err}"
            );
            ReminderError::SaveFailed(err)
        })
    }

    fn log_pending(&self) {
        let pending = self.scheduled_diagnostics();
        debug!(
            "event=reminder_pending module=reminder count={}",
            pending.len()
        );
        for notification in &pending {
            debug!(
                "event=reminder_pending module=reminder id={} trigger={} screen={}",
                notification.id,
                notification.trigger,
                notification.payload.target_screen.as_str()
            );
        }
    }

    fn persist<T: serde::Serialize + ?Sized>(
        &self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ReminderError> {
        set_json(&self.store, key, value).map_err(|err| {
            error!("event=reminder_save module=reminder status=error key={key} error={err}");
            ReminderError::SaveFailed(err)
        })
    }
}

/// In-memory settings intent edited by the settings screen.
///
/// Toggling or picking a time only changes the draft; nothing reaches the
/// store or platform until `save`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderDraft {
    enabled: bool,
    time: ReminderTime,
}

impl ReminderDraft {
    pub fn from_config(config: &ReminderConfig) -> Self {
        Self {
            enabled: config.enabled,
            time: config.effective_time(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn time(&self) -> ReminderTime {
        self.time
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_time(&mut self, time: ReminderTime) {
        self.time = time;
    }

    pub fn desired_state(&self) -> ReminderState {
        if self.enabled {
            ReminderState::Enabled(self.time)
        } else {
            ReminderState::Disabled
        }
    }

    /// Whether saving would change what is persisted.
    pub fn differs_from(&self, persisted: &ReminderConfig) -> bool {
        self.desired_state() != persisted.desired_state()
    }

    pub fn save<S: KeyValueStore, P: NotificationPlatform>(
        &self,
        scheduler: &mut ReminderScheduler<S, P>,
    ) -> Result<ReminderOutcome, ReminderError> {
        scheduler.apply(self.desired_state())
    }
}
