//! Reminder settings domain model.
//!
//! # Responsibility
//! - Represent the daily reminder wall-clock time and enabled flag.
//! - Map persisted settings onto the `Disabled | Enabled(time)` state machine.
//!
//! # Invariants
//! - `ReminderTime` is timezone-naive and reused every day.
//! - An enabled config without a usable time resolves to 18:00.

use chrono::Timelike;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fallback reminder time when none was stored.
pub const DEFAULT_REMINDER_TIME: ReminderTime = ReminderTime {
    hour: 18,
    minute: 0,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderValidationError {
    OutOfRange { hour: u32, minute: u32 },
    Malformed(String),
}

impl Display for ReminderValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { hour, minute } => {
                write!(f, "reminder time {hour}:{minute} is out of range")
            }
            Self::Malformed(value) => {
                write!(f, "invalid reminder time `{value}`; expected H:M")
            }
        }
    }
}

impl Error for ReminderValidationError {}

/// Local hour and minute at which the daily reminder fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReminderTime {
    hour: u8,
    minute: u8,
}

impl ReminderTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ReminderValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ReminderValidationError::OutOfRange { hour, minute });
        }
        // Bounds checked above.
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    /// Takes hour and minute from any wall-clock value, dropping seconds.
    pub fn from_time(time: &impl Timelike) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    /// Parses `H:M`, accepting both `9:5` and `09:05`.
    pub fn parse(value: &str) -> Result<Self, ReminderValidationError> {
        let malformed = || ReminderValidationError::Malformed(value.to_string());
        let (hour, minute) = value.trim().split_once(':').ok_or_else(malformed)?;
        let hour = parse_component(hour).ok_or_else(malformed)?;
        let minute = parse_component(minute).ok_or_else(malformed)?;
        Self::new(hour, minute)
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Unpadded `H:M` form written to `@notification_time`.
    pub fn storage_value(&self) -> String {
        format!("{}:{}", self.hour, self.minute)
    }
}

impl Display for ReminderTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

fn parse_component(value: &str) -> Option<u32> {
    if value.is_empty() || value.len() > 2 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Desired reminder state applied by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    Disabled,
    Enabled(ReminderTime),
}

impl ReminderState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }
}

/// Persisted reminder settings as two independent fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderConfig {
    pub enabled: bool,
    pub time: Option<ReminderTime>,
}

impl ReminderConfig {
    pub fn desired_state(&self) -> ReminderState {
        if self.enabled {
            ReminderState::Enabled(self.time.unwrap_or(DEFAULT_REMINDER_TIME))
        } else {
            ReminderState::Disabled
        }
    }

    /// Time shown in settings, falling back to the default.
    pub fn effective_time(&self) -> ReminderTime {
        self.time.unwrap_or(DEFAULT_REMINDER_TIME)
    }
}
