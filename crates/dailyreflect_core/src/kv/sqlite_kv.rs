//! SQLite-backed key-value store over the `kv_entries` table.

use super::{KeyValueStore, KvResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Key-value store borrowing one migrated connection.
#[derive(Clone, Copy)]
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Returns every stored key in ascending order.
    ///
    /// Diagnostics helper; services never scan the store.
    pub fn keys(&self) -> KvResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_entries ORDER BY key ASC;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl KeyValueStore for SqliteKvStore<'_> {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> KvResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> KvResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteKvStore;
    use crate::db::open_db_in_memory;
    use crate::kv::KeyValueStore;

    #[test]
    fn set_overwrites_existing_value() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::new(&conn);

        store.set("@k", "one").unwrap();
        store.set("@k", "two").unwrap();

        assert_eq!(store.get("@k").unwrap().as_deref(), Some("two"));
        assert_eq!(store.keys().unwrap(), vec!["@k".to_string()]);
    }

    #[test]
    fn remove_missing_key_is_noop() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::new(&conn);

        store.remove("@nothing").unwrap();
        assert_eq!(store.get("@nothing").unwrap(), None);
    }
}
