//! Key-value persistence contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the string-keyed, UTF-8 valued store that journal and reminder
//!   services persist through.
//! - Provide JSON encode/decode helpers so services never hand-format
//!   structured values.
//!
//! # Invariants
//! - `set` on an existing key overwrites in place.
//! - `get` of a missing key is `Ok(None)`, never an error.
//! - Decoding failures are reported as `KvError::Decode`, distinct from
//!   transport failures, so callers can choose to treat them as absent.

use crate::db::DbError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite_kv;

pub use sqlite_kv::SqliteKvStore;

pub type KvResult<T> = Result<T, KvError>;

/// Persistence error for key-value reads and writes.
#[derive(Debug)]
pub enum KvError {
    /// SQLite transport failure.
    Db(DbError),
    /// Value could not be serialized before `set`.
    Encode { key: String, message: String },
    /// Stored value could not be deserialized after `get`.
    Decode { key: String, message: String },
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode { key, message } => {
                write!(f, "failed to encode value for `{key}`: {message}")
            }
            Self::Decode { key, message } => {
                write!(f, "failed to decode value stored at `{key}`: {message}")
            }
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode { .. } | Self::Decode { .. } => None,
        }
    }
}

impl From<DbError> for KvError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for KvError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable string-keyed store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> KvResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> KvResult<()>;
    fn remove(&self, key: &str) -> KvResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> KvResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> KvResult<()> {
        (**self).remove(key)
    }
}

/// Reads and decodes a JSON value.
pub fn get_json<T, S>(store: &S, key: &str) -> KvResult<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| KvError::Decode {
                key: key.to_string(),
                message: err.to_string(),
            }),
        None => Ok(None),
    }
}

/// Encodes a value as JSON and writes it.
pub fn set_json<T, S>(store: &S, key: &str, value: &T) -> KvResult<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let encoded = serde_json::to_string(value).map_err(|err| KvError::Encode {
        key: key.to_string(),
        message: err.to_string(),
    })?;
    store.set(key, &encoded)
}

#[cfg(test)]
mod tests {
    use super::{get_json, set_json, KeyValueStore, KvError, SqliteKvStore};
    use crate::db::open_db_in_memory;

    #[test]
    fn json_helpers_roundtrip_vectors() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::new(&conn);

        set_json(&store, "@days", &vec!["2024-01-01", "2024-01-02"]).unwrap();
        let days: Option<Vec<String>> = get_json(&store, "@days").unwrap();
        assert_eq!(
            days,
            Some(vec!["2024-01-01".to_string(), "2024-01-02".to_string()])
        );
    }

    #[test]
    fn get_json_reports_decode_errors_with_key() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::new(&conn);
        store.set("@broken", "{not json").unwrap();

        let err = get_json::<bool, _>(&store, "@broken").unwrap_err();
        assert!(matches!(err, KvError::Decode { ref key, .. } if key == "@broken"));
    }

    #[test]
    fn get_json_missing_key_is_none() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::new(&conn);
        assert_eq!(get_json::<bool, _>(&store, "@missing").unwrap(), None);
    }
}
