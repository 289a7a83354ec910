use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::path::Path;

/// The slot that holds the serialized workout history.
pub const WORKOUTS_KEY: &str = "workouts";

/// String slots, read whole and overwritten whole.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Key/value slots in a local SQLite file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let display = path.display();
        let conn =
            Connection::open(path).with_context(|| format!("Opening SQLite store: {display}"))?;
        Self::from_connection(conn)
    }

    /// Private to the process, gone on drop. Used by tests and by sessions
    /// that should not leave a file behind.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Opening in-memory SQLite store")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS slots (
                key    TEXT PRIMARY KEY,
                value  TEXT NOT NULL
            );",
        )
        .context("Ensuring slots table")?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Reading slot: {key}"))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO slots (key, value) VALUES (?1, ?2)
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .with_context(|| format!("Writing slot: {key}"))?;
        Ok(())
    }
}

/// Plain map for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_gets_what_was_set() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("workouts").unwrap(), None);
        store.set("workouts", "[]").unwrap();
        assert_eq!(store.get("workouts").unwrap().as_deref(), Some("[]"));
        store.set("workouts", "[1]").unwrap();
        assert_eq!(store.get("workouts").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn sqlite_store_overwrites_in_place() {
        let mut store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.get("workouts").unwrap(), None);
        store.set("workouts", "first").unwrap();
        store.set("workouts", "second").unwrap();
        assert_eq!(store.get("workouts").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn sqlite_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waymark.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set("workouts", "[\"kept\"]").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.get("workouts").unwrap().as_deref(),
            Some("[\"kept\"]")
        );
    }

    #[test]
    fn slots_do_not_leak_into_each_other() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.set("workouts", "a").unwrap();
        store.set("settings", "b").unwrap();
        assert_eq!(store.get("workouts").unwrap().as_deref(), Some("a"));
        assert_eq!(store.get("settings").unwrap().as_deref(), Some("b"));
    }
}
