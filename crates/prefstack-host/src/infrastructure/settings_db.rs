//! Structured settings store backed by SQLite.
//!
//! Two tables, created on open:
//!
//! ```sql
//! settings(key TEXT PRIMARY KEY, value INTEGER NOT NULL)  -- ints and bools
//! strings (key TEXT PRIMARY KEY, value TEXT    NOT NULL)
//! ```
//!
//! Booleans are stored as 0/1 and any non-zero integer reads as `true`.
//! Writing an empty string deletes the row, so an empty string and an absent
//! row are the same observable state.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use prefstack_core::{Store, StoreError};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS settings (key TEXT PRIMARY KEY, value INTEGER NOT NULL);
CREATE TABLE IF NOT EXISTS strings  (key TEXT PRIMARY KEY, value TEXT NOT NULL);
";

fn backend_err(e: rusqlite::Error) -> StoreError {
    StoreError::Backend {
        backend: "settings",
        source: Box::new(e),
    }
}

/// Settings store over one SQLite connection.
pub struct SettingsDb {
    conn: Mutex<Connection>,
}

impl SettingsDb {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path).map_err(backend_err)?;
        debug!(path = %path.display(), "settings database opened");
        Self::with_connection(conn)
    }

    /// A private, non-persistent database.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory().map_err(backend_err)?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA).map_err(backend_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self, table: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let sql = format!("SELECT value FROM {table} WHERE key = ?1");
        self.conn()
            .query_row(&sql, params![key], |row| row.get::<_, Value>(0))
            .optional()
            .map_err(backend_err)
    }

    fn int_value(&self, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(match self.read("settings", key)? {
            Some(Value::Integer(n)) => Some(n),
            None => None,
            Some(other) => {
                warn!(key, found = ?other.data_type(), "expected an integer setting; using default");
                None
            }
        })
    }
}

impl Store for SettingsDb {
    fn name(&self) -> &'static str {
        "settings"
    }

    fn get_string(&self, key: &str, default: &str) -> Result<String, StoreError> {
        Ok(match self.read("strings", key)? {
            Some(Value::Text(s)) => s,
            _ => default.to_string(),
        })
    }

    fn get_int(&self, key: &str, default: i32) -> Result<i32, StoreError> {
        Ok(self
            .int_value(key)?
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(default))
    }

    fn get_bool(&self, key: &str, default: bool) -> Result<bool, StoreError> {
        Ok(self.int_value(key)?.map_or(default, |n| n != 0))
    }

    fn put_string(&self, key: &str, value: &str) -> Result<(), StoreError> {
        debug!(key, "settings write");
        let conn = self.conn();
        let result = if value.is_empty() {
            conn.execute("DELETE FROM strings WHERE key = ?1", params![key])
        } else {
            conn.execute(
                "INSERT OR REPLACE INTO strings (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
        };
        result.map(|_| ()).map_err(backend_err)
    }

    fn put_int(&self, key: &str, value: i32) -> Result<(), StoreError> {
        debug!(key, value, "settings write");
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map(|_| ())
            .map_err(backend_err)
    }

    fn put_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.put_int(key, i32::from(value))
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.read("settings", key)?.is_some() || self.read("strings", key)?.is_some())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction().map_err(backend_err)?;
        tx.execute("DELETE FROM settings WHERE key = ?1", params![key])
            .map_err(backend_err)?;
        tx.execute("DELETE FROM strings WHERE key = ?1", params![key])
            .map_err(backend_err)?;
        tx.commit().map_err(backend_err)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
