//! Journal entry use-case service.
//!
//! # Responsibility
//! - Create, overwrite, look up and enumerate one entry per calendar day.
//! - Maintain the day index that enumeration walks.
//! - Replay an interrupted index update on launch.
//!
//! # Invariants
//! - At most one entry exists per `DateKey`; a second save overwrites.
//! - Every key produced by a successful save is in the day index before
//!   `save_entry` returns.
//! - Read failures never reach the caller: they are logged and read as
//!   absent/empty.
//! - The entry-then-index write is not transactional; an interrupted save
//!   leaves `PENDING_INDEX_KEY` behind for `repair_index`.

use crate::kv::{get_json, set_json, KeyValueStore, KvError, KvResult};
use crate::model::entry::{DateKey, DayIndex, EntryPayload, EntryValidationError, JournalEntry};
use chrono::{DateTime, TimeZone, Utc};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Prefix of the per-day payload key, followed by the `DateKey`.
pub const ENTRY_KEY_PREFIX: &str = "@journal_";
/// JSON array of every indexed `DateKey`.
pub const DAY_INDEX_KEY: &str = "@journal_days";
/// `DateKey` of a save whose index update has not been confirmed.
pub const PENDING_INDEX_KEY: &str = "@journal_pending_index";

/// Storage key of one day's payload.
pub fn entry_key(date_key: &DateKey) -> String {
    format!("{ENTRY_KEY_PREFIX}{date_key}")
}

/// Errors surfaced by entry writes.
#[derive(Debug)]
pub enum EntryStoreError {
    /// Input must be corrected by the user.
    Validation(EntryValidationError),
    /// A persistence write failed; earlier steps are not rolled back.
    SaveFailed(KvError),
}

impl Display for EntryStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::SaveFailed(err) => write!(f, "failed to save entry: {err}"),
        }
    }
}

impl Error for EntryStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::SaveFailed(err) => Some(err),
        }
    }
}

impl From<EntryValidationError> for EntryStoreError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Entry service over a key-value store.
pub struct EntryStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> EntryStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Local calendar day of `reference`.
    pub fn today_key<Tz: TimeZone>(reference: &DateTime<Tz>) -> DateKey {
        DateKey::for_time(reference)
    }

    /// Returns the entry for `date_key`, or `None` when it is missing or
    /// could not be read.
    pub fn get_entry(&self, date_key: &DateKey) -> Option<JournalEntry> {
        let key = entry_key(date_key);
        match get_json::<EntryPayload, _>(&self.store, &key) {
            Ok(Some(payload)) if payload.answer.trim().is_empty() => {
                warn!(
                    "event=entry_get module=entry_store status=invalid date_key={date_key} reason=empty_answer"
                );
                None
            }
            Ok(Some(payload)) => Some(JournalEntry::from_payload(*date_key, payload)),
            Ok(None) => None,
            Err(err) => {
                error!(
                    "event=entry_get module=entry_store status=error date_key={date_key} error={err}"
                );
                None
            }
        }
    }

    /// Validates and writes one day's entry, then makes sure the day is indexed.
    ///
    /// # Errors
    /// - `Validation` for a blank answer; nothing is written.
    /// - `SaveFailed` when any write (or the index read it depends on) fails.
    ///   A payload already written is kept.
    pub fn save_entry(
        &self,
        date_key: DateKey,
        answer: &str,
        now: DateTime<Utc>,
    ) -> Result<JournalEntry, EntryStoreError> {
        let entry = JournalEntry::new(date_key, answer, now)?;

        self.write_step("intent", &date_key, || {
            set_json(&self.store, PENDING_INDEX_KEY, &date_key)
        })?;
        self.write_step("payload", &date_key, || {
            set_json(&self.store, &entry_key(&date_key), &entry.to_payload())
        })?;

        let mut index = self.index_for_write(&date_key)?;
        let appended = index.insert(date_key);
        if appended {
            self.write_step("index", &date_key, || {
                set_json(&self.store, DAY_INDEX_KEY, &index)
            })?;
        }

        if let Err(err) = self.store.remove(PENDING_INDEX_KEY) {
            // Entry and index are durable; a stale intent only costs one
            // idempotent repair on next launch.
            warn!(
                "event=entry_save module=entry_store status=intent_not_cleared date_key={date_key} error={err}"
            );
        }

        info!(
            "event=entry_save module=entry_store status=ok date_key={date_key} index_appended={appended} answer_chars={}",
            entry.answer.chars().count()
        );
        Ok(entry)
    }

    /// All readable entries, newest `date` first.
    ///
    /// Indexed days whose payload is missing or unreadable are skipped.
    pub fn list_entries(&self) -> Vec<JournalEntry> {
        let index = self.day_index();
        let mut entries = index
            .iter()
            .filter_map(|date_key| self.get_entry(date_key))
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries
    }

    /// Current day index; unreadable or absent reads as empty.
    pub fn day_index(&self) -> DayIndex {
        match self.read_index() {
            Ok(index) => index.unwrap_or_default(),
            Err(err) => {
                error!("event=day_index_read module=entry_store status=error error={err}");
                DayIndex::new()
            }
        }
    }

    /// Replays an interrupted save's index update.
    ///
    /// Returns the day that was added to the index, if any. A pending intent
    /// whose payload never landed is simply discarded.
    pub fn repair_index(&self) -> Result<Option<DateKey>, EntryStoreError> {
        let pending = match get_json::<DateKey, _>(&self.store, PENDING_INDEX_KEY) {
            Ok(Some(date_key)) => date_key,
            Ok(None) => return Ok(None),
            Err(err @ KvError::Decode { .. }) => {
                warn!("event=index_repair module=entry_store status=invalid_intent error={err}");
                self.clear_intent()?;
                return Ok(None);
            }
            Err(err) => {
                error!("event=index_repair module=entry_store status=error error={err}");
                return Ok(None);
            }
        };

        let payload_exists = match self.store.get(&entry_key(&pending)) {
            Ok(value) => value.is_some(),
            Err(err) => {
                error!(
                    "event=index_repair module=entry_store status=error date_key={pending} error={err}"
                );
                return Ok(None);
            }
        };

        let mut repaired = None;
        if payload_exists {
            let mut index = self.index_for_write(&pending)?;
            if index.insert(pending) {
                self.write_step("index", &pending, || {
                    set_json(&self.store, DAY_INDEX_KEY, &index)
                })?;
                repaired = Some(pending);
            }
        }

        self.clear_intent()?;
        info!(
            "event=index_repair module=entry_store status=ok date_key={pending} payload_exists={payload_exists} repaired={}",
            repaired.is_some()
        );
        Ok(repaired)
    }

    /// Reads the stored index, dropping elements that are not canonical days.
    ///
    /// Only unparseable JSON is a decode error; a bad element costs that
    /// element alone.
    fn read_index(&self) -> KvResult<Option<DayIndex>> {
        let raw = match get_json::<Vec<String>, _>(&self.store, DAY_INDEX_KEY)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let (index, skipped) = DayIndex::from_stored(raw);
        if !skipped.is_empty() {
            warn!(
                "event=day_index_read module=entry_store status=invalid_days kept={} skipped={:?}",
                index.len(),
                skipped
            );
        }
        Ok(Some(index))
    }

    /// Reads the index for an append. Transport failures abort the write so a
    /// failed read can never overwrite a populated index; an index that is not
    /// a JSON array at all is rebuilt.
    fn index_for_write(&self, date_key: &DateKey) -> Result<DayIndex, EntryStoreError> {
        match self.read_index() {
            Ok(index) => Ok(index.unwrap_or_default()),
            Err(err @ KvError::Decode { .. }) => {
                warn!(
                    "event=entry_save module=entry_store status=index_rebuilt date_key={date_key} error={err}"
                );
                Ok(DayIndex::new())
            }
            Err(err) => {
                error!(
                    "event=entry_save module=entry_store status=error step=index_read date_key={date_key} error={err}"
                );
                Err(EntryStoreError::SaveFailed(err))
            }
        }
    }

    fn write_step(
        &self,
        step: &'static str,
        date_key: &DateKey,
        write: impl FnOnce() -> Result<(), KvError>,
    ) -> Result<(), EntryStoreError> {
        write().map_err(|err| {
            error!(
                "event=entry_save module=entry_store status=error step={step} date_key={date_key} error={err}"
            );
            EntryStoreError::SaveFailed(err)
        })
    }

    fn clear_intent(&self) -> Result<(), EntryStoreError> {
        self.store
            .remove(PENDING_INDEX_KEY)
            .map_err(EntryStoreError::SaveFailed)
    }
}
