mod support;

use dailyreflect_core::db::open_db_in_memory;
use dailyreflect_core::service::reminder_scheduler::{
    NOTIFICATION_ID_KEY, REMINDER_ENABLED_KEY, REMINDER_TIME_KEY,
};
use dailyreflect_core::{
    NotificationPlatform, PermissionStatus, ReminderConfig, ReminderDraft, ReminderError,
    ReminderScheduler, ReminderState, ReminderTime, SqliteKvStore, SqliteNotificationQueue,
    TargetScreen, DEFAULT_REMINDER_TIME,
};
use support::{FakePlatform, FlakyKv};

fn time(hour: u32, minute: u32) -> ReminderTime {
    ReminderTime::new(hour, minute).unwrap()
}

#[test]
fn enabling_leaves_exactly_one_trigger_at_requested_time() {
    let kv = FlakyKv::new();
    let platform = FakePlatform::new();
    platform.inject(7, 0);
    platform.inject(21, 15);
    let mut scheduler = ReminderScheduler::new(&kv, &platform);

    let outcome = scheduler
        .apply(ReminderState::Enabled(time(9, 30)))
        .unwrap();

    let pending = platform.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].trigger.hour(), 9);
    assert_eq!(pending[0].trigger.minute(), 30);
    assert_eq!(pending[0].payload.target_screen, TargetScreen::Today);
    assert!(outcome.scheduled());
    assert_eq!(outcome.notification_id.as_deref(), Some(pending[0].id.as_str()));

    assert_eq!(kv.raw(REMINDER_ENABLED_KEY).as_deref(), Some("true"));
    assert_eq!(kv.raw(REMINDER_TIME_KEY).as_deref(), Some("\"9:30\""));
    assert_eq!(
        kv.raw(NOTIFICATION_ID_KEY),
        Some(format!("\"{}\"", pending[0].id))
    );
}

#[test]
fn changing_time_replaces_the_trigger() {
    let kv = FlakyKv::new();
    let platform = FakePlatform::new();
    let mut scheduler = ReminderScheduler::new(&kv, &platform);

    scheduler.apply(ReminderState::Enabled(time(9, 30))).unwrap();
    scheduler.apply(ReminderState::Enabled(time(20, 5))).unwrap();

    let pending = platform.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].trigger, time(20, 5));
}

#[test]
fn disabling_is_idempotent_and_clears_triggers() {
    let kv = FlakyKv::new();
    let platform = FakePlatform::new();
    let mut scheduler = ReminderScheduler::new(&kv, &platform);

    scheduler.apply(ReminderState::Enabled(time(9, 30))).unwrap();
    for _ in 0..2 {
        let outcome = scheduler.apply(ReminderState::Disabled).unwrap();
        assert_eq!(outcome.state, ReminderState::Disabled);
        assert!(!outcome.scheduled());
        assert!(platform.pending().is_empty());
        assert_eq!(kv.raw(REMINDER_ENABLED_KEY).as_deref(), Some("false"));
    }
    assert_eq!(platform.cancel_calls.get(), 3);
}

#[test]
fn disabling_from_fresh_install_persists_false() {
    let kv = FlakyKv::new();
    let platform = FakePlatform::new();
    let mut scheduler = ReminderScheduler::new(&kv, &platform);

    scheduler.apply(ReminderState::Disabled).unwrap();

    assert!(platform.pending().is_empty());
    assert_eq!(kv.raw(REMINDER_ENABLED_KEY).as_deref(), Some("false"));
    assert_eq!(kv.raw(REMINDER_TIME_KEY), None);
}

#[test]
fn platform_rejection_still_persists_enabled() {
    let kv = FlakyKv::new();
    let platform = FakePlatform::new();
    platform.set_permission(PermissionStatus::Denied, false);
    platform.reject_schedules(true);
    let mut scheduler = ReminderScheduler::new(&kv, &platform);

    let outcome = scheduler
        .apply(ReminderState::Enabled(time(9, 30)))
        .unwrap();

    assert!(!outcome.scheduled());
    assert_eq!(outcome.permission, Some(PermissionStatus::Denied));
    assert!(platform.pending().is_empty());
    assert_eq!(kv.raw(REMINDER_ENABLED_KEY).as_deref(), Some("true"));
    assert_eq!(kv.raw(NOTIFICATION_ID_KEY), None);
    assert_eq!(
        scheduler.load_config(),
        ReminderConfig {
            enabled: true,
            time: Some(time(9, 30)),
        }
    );
}

#[test]
fn failed_cancel_never_stacks_a_second_trigger() {
    let kv = FlakyKv::new();
    let platform = FakePlatform::new();
    let mut scheduler = ReminderScheduler::new(&kv, &platform);
    scheduler.apply(ReminderState::Enabled(time(9, 30))).unwrap();

    platform.fail_cancel(true);
    let outcome = scheduler
        .apply(ReminderState::Enabled(time(20, 0)))
        .unwrap();

    assert!(!outcome.scheduled());
    let pending = platform.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].trigger, time(9, 30));
    assert_eq!(kv.raw(NOTIFICATION_ID_KEY), None);
    assert_eq!(
        scheduler.load_config(),
        ReminderConfig {
            enabled: true,
            time: Some(time(20, 0)),
        }
    );

    platform.fail_cancel(false);
    let outcome = scheduler.reconcile_on_launch().unwrap();
    assert!(outcome.scheduled());
    let pending = platform.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].trigger, time(20, 0));
}

#[test]
fn notification_id_is_cleared_when_no_trigger_is_live() {
    let kv = FlakyKv::new();
    let platform = FakePlatform::new();
    let mut scheduler = ReminderScheduler::new(&kv, &platform);

    scheduler.apply(ReminderState::Enabled(time(9, 30))).unwrap();
    assert!(kv.raw(NOTIFICATION_ID_KEY).is_some());
    scheduler.apply(ReminderState::Disabled).unwrap();
    assert_eq!(kv.raw(NOTIFICATION_ID_KEY), None);

    scheduler.apply(ReminderState::Enabled(time(9, 30))).unwrap();
    platform.reject_schedules(true);
    let outcome = scheduler
        .apply(ReminderState::Enabled(time(10, 0)))
        .unwrap();
    assert!(!outcome.scheduled());
    assert_eq!(kv.raw(NOTIFICATION_ID_KEY), None);
}

#[test]
fn persistence_failure_reports_save_failed_without_unscheduling() {
    let kv = FlakyKv::new();
    kv.fail_set(REMINDER_TIME_KEY);
    let platform = FakePlatform::new();
    let mut scheduler = ReminderScheduler::new(&kv, &platform);

    let err = scheduler
        .apply(ReminderState::Enabled(time(9, 30)))
        .unwrap_err();

    assert!(matches!(err, ReminderError::SaveFailed(_)));
    assert_eq!(platform.pending().len(), 1);
    assert_eq!(scheduler.last_applied(), None);
}

#[test]
fn launch_reconciliation_reschedules_dropped_trigger() {
    let kv = FlakyKv::new();
    let platform = FakePlatform::new();
    let mut scheduler = ReminderScheduler::new(&kv, &platform);
    scheduler.apply(ReminderState::Enabled(time(9, 30))).unwrap();

    platform.drop_all_silently();
    let outcome = scheduler.reconcile_on_launch().unwrap();

    assert_eq!(outcome.state, ReminderState::Enabled(time(9, 30)));
    let pending = platform.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].trigger, time(9, 30));
}

#[test]
fn launch_reconciliation_with_nothing_stored_stays_disabled() {
    let kv = FlakyKv::new();
    let platform = FakePlatform::new();
    platform.inject(6, 0);
    let mut scheduler = ReminderScheduler::new(&kv, &platform);

    let outcome = scheduler.reconcile_on_launch().unwrap();

    assert_eq!(outcome.state, ReminderState::Disabled);
    assert!(platform.pending().is_empty());
}

#[test]
fn enabled_without_stored_time_uses_default() {
    let kv = FlakyKv::new();
    kv.put_raw(REMINDER_ENABLED_KEY, "true");
    let platform = FakePlatform::new();
    let mut scheduler = ReminderScheduler::new(&kv, &platform);

    scheduler.reconcile_on_launch().unwrap();

    assert_eq!(platform.pending()[0].trigger, DEFAULT_REMINDER_TIME);
}

#[test]
fn unreadable_settings_load_as_disabled() {
    let kv = FlakyKv::new();
    kv.put_raw(REMINDER_ENABLED_KEY, "true");
    kv.fail_get(REMINDER_ENABLED_KEY);
    let platform = FakePlatform::new();
    let scheduler = ReminderScheduler::new(&kv, &platform);

    assert_eq!(scheduler.load_config(), ReminderConfig::default());
}

#[test]
fn ensure_permission_requests_once_when_undetermined() {
    let kv = FlakyKv::new();
    let platform = FakePlatform::new();
    platform.set_permission(PermissionStatus::Undetermined, true);
    let scheduler = ReminderScheduler::new(&kv, &platform);

    assert!(!scheduler.check_permission());
    assert_eq!(scheduler.ensure_permission(), PermissionStatus::Granted);
    assert!(scheduler.check_permission());

    platform.set_permission(PermissionStatus::Undetermined, false);
    assert_eq!(scheduler.ensure_permission(), PermissionStatus::Denied);
}

#[test]
fn draft_only_applies_on_save() {
    let kv = FlakyKv::new();
    let platform = FakePlatform::new();
    let mut scheduler = ReminderScheduler::new(&kv, &platform);

    let mut draft = ReminderDraft::from_config(&scheduler.load_config());
    assert!(!draft.enabled());
    assert_eq!(draft.time(), DEFAULT_REMINDER_TIME);

    draft.set_enabled(true);
    draft.set_enabled(false);
    draft.set_enabled(true);
    assert!(platform.pending().is_empty());
    assert_eq!(kv.len(), 0);

    draft.save(&mut scheduler).unwrap();
    assert_eq!(platform.pending().len(), 1);
    assert_eq!(
        scheduler.last_applied(),
        Some(ReminderState::Enabled(DEFAULT_REMINDER_TIME))
    );
}

#[test]
fn sqlite_queue_backs_a_full_cycle() {
    let conn = open_db_in_memory().unwrap();
    let queue = SqliteNotificationQueue::new(&conn);
    let mut scheduler = ReminderScheduler::new(SqliteKvStore::new(&conn), queue);

    assert_eq!(scheduler.ensure_permission(), PermissionStatus::Granted);
    scheduler.apply(ReminderState::Enabled(time(9, 30))).unwrap();
    scheduler.apply(ReminderState::Enabled(time(9, 45))).unwrap();

    let pending = queue.list_scheduled().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].trigger, time(9, 45));
    assert_eq!(scheduler.scheduled_diagnostics(), pending);

    scheduler.apply(ReminderState::Disabled).unwrap();
    assert!(queue.list_scheduled().unwrap().is_empty());
}
