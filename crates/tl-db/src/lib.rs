//! Local preference storage for the time log dashboard.
//!
//! Log entries live in the remote store; this crate only keeps small local
//! preferences (such as tag colors) in a SQLite file using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! Preferences are stored as opaque JSON text keyed by name. `updated_at`
//! holds an ISO 8601 UTC timestamp (e.g., `2025-01-15T10:30:00Z`).

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tl_core::TagColors;

/// Preference key holding the tag color map.
pub const TAG_COLORS_KEY: &str = "tag_colors";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored preference could not be decoded or encoded.
    #[error("invalid preference {key}: {source}")]
    InvalidPreference {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Returns the raw JSON stored under `key`.
    pub fn get_preference(&self, key: &str) -> Result<Option<Value>, DbError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|text| {
            serde_json::from_str(&text).map_err(|source| DbError::InvalidPreference {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set_preference(&self, key: &str, value: &Value) -> Result<(), DbError> {
        let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.conn.execute(
            "
            INSERT INTO preferences (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value.to_string(), updated_at],
        )?;
        tracing::debug!(key, "stored preference");
        Ok(())
    }

    /// Removes `key`. Returns whether anything was removed.
    pub fn delete_preference(&self, key: &str) -> Result<bool, DbError> {
        let removed = self
            .conn
            .execute("DELETE FROM preferences WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }


    /// Loads the tag color map, empty if none was saved.
    pub fn tag_colors(&self) -> Result<TagColors, DbError> {
        Ok(self.get_typed(TAG_COLORS_KEY)?.unwrap_or_default())
    }

    /// Forgets every tag color. Returns whether any were saved.
    pub fn reset_tag_colors(&self) -> Result<bool, DbError> {
        self.delete_preference(TAG_COLORS_KEY)
    }

    /// Saves the whole tag color map.
    pub fn save_tag_colors(&self, colors: &TagColors) -> Result<(), DbError> {
        self.set_typed(TAG_COLORS_KEY, colors)
    }

    fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DbError> {
        self.get_preference(key)?
            .map(|value| {
                serde_json::from_value(value).map_err(|source| DbError::InvalidPreference {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    fn set_typed<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DbError> {
        let value = serde_json::to_value(value).map_err(|source| DbError::InvalidPreference {
            key: key.to_string(),
            source,
        })?;
        self.set_preference(key, &value)
    }
}
