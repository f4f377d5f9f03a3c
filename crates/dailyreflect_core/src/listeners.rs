//! Notification listener subscriptions.
//!
//! # Responsibility
//! - Hold the received/response handlers registered by the UI shell.
//! - Route a tapped notification to the screen named in its payload.
//!
//! # Invariants
//! - Listeners are owned by one `AppContext`; there is no process-wide
//!   default handler.
//! - A removed or cleared listener is never invoked again.
//! - Handlers run in registration order.

use crate::platform::{ScheduledNotification, TargetScreen};
use log::debug;
use std::collections::BTreeMap;

pub type ListenerId = u64;

type ReceivedHandler = Box<dyn Fn(&ScheduledNotification)>;
type ResponseHandler = Box<dyn Fn(&NotificationResponse)>;

/// User interaction with a delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationResponse {
    pub notification: ScheduledNotification,
}

impl NotificationResponse {
    pub fn target_screen(&self) -> TargetScreen {
        self.notification.payload.target_screen
    }
}

/// How a notification is presented while the app is in the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForegroundPresentation {
    pub show_alert: bool,
    pub play_sound: bool,
    pub set_badge: bool,
}

impl Default for ForegroundPresentation {
    fn default() -> Self {
        Self {
            show_alert: true,
            play_sound: true,
            set_badge: false,
        }
    }
}

/// Subscription set for notification events.
#[derive(Default)]
pub struct NotificationListeners {
    next_id: ListenerId,
    received: BTreeMap<ListenerId, ReceivedHandler>,
    responses: BTreeMap<ListenerId, ResponseHandler>,
    presentation: ForegroundPresentation,
}

impl NotificationListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presentation(&self) -> ForegroundPresentation {
        self.presentation
    }

    pub fn set_presentation(&mut self, presentation: ForegroundPresentation) {
        self.presentation = presentation;
    }

    /// Registers a handler for notifications delivered while foregrounded.
    pub fn on_received(&mut self, handler: impl Fn(&ScheduledNotification) + 'static) -> ListenerId {
        let id = self.allocate_id();
        self.received.insert(id, Box::new(handler));
        id
    }

    /// Registers a handler for taps on a delivered notification.
    pub fn on_response(&mut self, handler: impl Fn(&NotificationResponse) + 'static) -> ListenerId {
        let id = self.allocate_id();
        self.responses.insert(id, Box::new(handler));
        id
    }

    /// Removes one listener of either kind. Returns whether it existed.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        self.received.remove(&id).is_some() || self.responses.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.received.len() + self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every listener.
    pub fn clear(&mut self) {
        let removed = self.len();
        self.received.clear();
        self.responses.clear();
        if removed > 0 {
            debug!("event=listeners_clear module=listeners removed={removed}");
        }
    }

    pub fn dispatch_received(&self, notification: &ScheduledNotification) {
        for handler in self.received.values() {
            handler(notification);
        }
    }

    /// Notifies response listeners and returns where the UI should navigate.
    pub fn dispatch_response(&self, response: &NotificationResponse) -> TargetScreen {
        for handler in self.responses.values() {
            handler(response);
        }
        let target = response.target_screen();
        debug!(
            "event=notification_response module=listeners id={} target={}",
            response.notification.id,
            target.as_str()
        );
        target
    }

    fn allocate_id(&mut self) -> ListenerId {
        self.next_id += 1;
        self.next_id
    }
}
