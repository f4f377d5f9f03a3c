//! Journal entry domain model.
//!
//! # Responsibility
//! - Define the one-answer-per-day entry record and its natural key.
//! - Define the day index used to enumerate entries without scanning storage.
//!
//! # Invariants
//! - `DateKey` display form is exactly `YYYY-MM-DD`.
//! - `JournalEntry::answer` is stored trimmed and is never empty.
//! - `DayIndex` holds each key at most once, in append order.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Validation failures for journal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    /// Answer is empty after trimming.
    EmptyAnswer,
    /// Date key is not a canonical `YYYY-MM-DD` calendar day.
    InvalidDateKey(String),
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyAnswer => write!(f, "answer must not be empty"),
            Self::InvalidDateKey(value) => {
                write!(f, "invalid date key `{value}`; expected YYYY-MM-DD")
            }
        }
    }
}

impl Error for EntryValidationError {}

/// Calendar-day identifier for one journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Parses a canonical `YYYY-MM-DD` key.
    ///
    /// Non-padded (`2024-1-1`) and impossible (`2024-02-30`) dates are
    /// rejected so that one day can never map to two storage keys.
    pub fn parse(value: &str) -> Result<Self, EntryValidationError> {
        let trimmed = value.trim();
        let date = NaiveDate::parse_from_str(trimmed, DATE_KEY_FORMAT)
            .map_err(|_| EntryValidationError::InvalidDateKey(value.to_string()))?;
        let key = Self(date);
        if key.to_string() != trimmed {
            return Err(EntryValidationError::InvalidDateKey(value.to_string()));
        }
        Ok(key)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Local calendar day of `reference` in its own time zone.
    ///
    /// Pass `chrono::Local::now()` for the device day; any other zone gives
    /// that zone's wall-clock day.
    pub fn for_time<Tz: TimeZone>(reference: &DateTime<Tz>) -> Self {
        Self(reference.date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl Display for DateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl TryFrom<String> for DateKey {
    type Error = EntryValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DateKey> for String {
    fn from(value: DateKey) -> Self {
        value.to_string()
    }
}

/// One day's reflection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// Natural key; not part of the persisted payload.
    pub date_key: DateKey,
    /// Timestamp of the last write.
    pub date: DateTime<Utc>,
    /// Trimmed answer text.
    pub answer: String,
}

impl JournalEntry {
    /// Builds a validated entry, trimming the answer.
    pub fn new(
        date_key: DateKey,
        answer: &str,
        date: DateTime<Utc>,
    ) -> Result<Self, EntryValidationError> {
        let answer = normalize_answer(answer)?;
        Ok(Self {
            date_key,
            date,
            answer,
        })
    }

    pub(crate) fn from_payload(date_key: DateKey, payload: EntryPayload) -> Self {
        Self {
            date_key,
            date: payload.date,
            answer: payload.answer,
        }
    }

    pub(crate) fn to_payload(&self) -> EntryPayload {
        EntryPayload {
            date: self.date,
            answer: self.answer.clone(),
        }
    }
}

/// Persisted JSON shape: `{"date": "...", "answer": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct EntryPayload {
    pub date: DateTime<Utc>,
    pub answer: String,
}

/// Returns the trimmed answer, rejecting blank input.
pub fn normalize_answer(answer: &str) -> Result<String, EntryValidationError> {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        return Err(EntryValidationError::EmptyAnswer);
    }
    Ok(trimmed.to_string())
}

/// Append-only set of days known to have an entry.
///
/// Stored as a JSON array of day strings. Decoding goes through
/// `from_stored` so one bad element cannot discard the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DayIndex {
    days: Vec<DateKey>,
}

impl DayIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from stored day strings.
    ///
    /// Returns the index of every canonical key (first occurrence kept) and
    /// the elements that were not canonical keys.
    pub fn from_stored(raw: Vec<String>) -> (Self, Vec<String>) {
        let mut index = Self::new();
        let mut skipped = Vec::new();
        for value in raw {
            match DateKey::parse(&value) {
                Ok(key) => {
                    index.insert(key);
                }
                Err(_) => skipped.push(value),
            }
        }
        (index, skipped)
    }

    pub fn contains(&self, key: &DateKey) -> bool {
        self.days.contains(key)
    }

    /// Appends `key` unless already present. Returns whether it was added.
    pub fn insert(&mut self, key: DateKey) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.days.push(key);
        true
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DateKey> {
        self.days.iter()
    }
}

impl FromIterator<DateKey> for DayIndex {
    fn from_iter<I: IntoIterator<Item = DateKey>>(iter: I) -> Self {
        let mut index = Self::new();
        for key in iter {
            index.insert(key);
        }
        index
    }
}
