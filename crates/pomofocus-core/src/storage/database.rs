//! SQLite-backed key-value store.
//!
//! Every persistent collection lives in its own named [`Slot`] holding a
//! JSON document:
//! - active and archived tasks, templates
//! - session, skipped-session and distraction logs
//! - daily reviews and journal entries
//! - the active task id, the last-session snapshot and the pending undo record
//! - the idle timer position and the date of the last end-of-day prompt
//!
//! Slots are independent. A missing or unreadable slot loads as its default.

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use super::data_dir;
use crate::error::DatabaseError;

/// Named persistent slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Tasks,
    ArchivedTasks,
    Templates,
    SessionLogs,
    SkippedLogs,
    DistractionLogs,
    DailyReviews,
    JournalEntries,
    ActiveTaskId,
    LastSession,
    LastDeleted,
    TimerPosition,
    ReviewPromptedOn,
}

impl Slot {
    pub fn key(self) -> &'static str {
        match self {
            Slot::Tasks => "tasks_v4",
            Slot::ArchivedTasks => "archived_tasks_v2",
            Slot::Templates => "templates_v4",
            Slot::SessionLogs => "session_logs_v4",
            Slot::SkippedLogs => "skipped_logs_v4",
            Slot::DistractionLogs => "distraction_logs_v1",
            Slot::DailyReviews => "daily_reviews_v4",
            Slot::JournalEntries => "journal_entries_v1",
            Slot::ActiveTaskId => "active_task_id_v4",
            Slot::LastSession => "last_session_v4",
            Slot::LastDeleted => "last_deleted_v1",
            Slot::TimerPosition => "timer_position_v1",
            Slot::ReviewPromptedOn => "review_prompted_on_v1",
        }
    }
}

/// SQLite database holding the slot documents.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/pomofocus.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the
    /// database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir().map_err(|e| DatabaseError::DataDir(e.to_string()))?;
        Self::open_at(&dir.join("pomofocus.db"))
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a raw value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a raw value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Load a slot, falling back to `T::default()` when it is absent or
    /// cannot be decoded.
    pub fn load_slot<T: DeserializeOwned + Default>(&self, slot: Slot) -> T {
        match self.kv_get(slot.key()) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(slot = slot.key(), error = %e, "discarding undecodable slot");
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!(slot = slot.key(), error = %e, "slot load failed");
                T::default()
            }
        }
    }

    /// Encode `value` as JSON and store it in `slot`.
    pub fn save_slot<T: Serialize + ?Sized>(&self, slot: Slot, value: &T) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(value).map_err(|e| DatabaseError::Encode {
            slot: slot.key().to_string(),
            message: e.to_string(),
        })?;
        self.kv_set(slot.key(), &json)
    }
}
