//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate key-value and platform calls into the operations screens
//!   invoke.
//! - Keep UI/FFI layers free of persistence and scheduling details.

pub mod entry_store;
pub mod reminder_scheduler;
