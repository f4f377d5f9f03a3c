//! Domain model for journal entries and reminder settings.
//!
//! # Responsibility
//! - Define the canonical shapes persisted through the key-value store.
//! - Own input validation so services cannot persist malformed values.
//!
//! # Invariants
//! - A `DateKey` is always a real calendar day in canonical `YYYY-MM-DD` form.
//! - A `JournalEntry` answer is trimmed and non-empty.
//! - A `ReminderTime` is a valid wall-clock hour/minute.

pub mod entry;
pub mod reminder;
