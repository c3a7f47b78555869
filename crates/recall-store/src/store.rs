use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use recall_core::Vectorizer;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::schema;

/// Name under which the working snapshot is kept.
pub const DEFAULT_SNAPSHOT: &str = "default";

/// Summary row for a stored snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotInfo {
    pub name: String,
    pub dimension: usize,
    pub words: usize,
    pub saved_at: u64,
}

/// SQLite-backed holder of opaque vectorizer snapshots.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        tracing::info!("opened snapshot store at {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Snapshots ---

    /// Serialize `vectorizer` and store it under `name`, replacing any previous one.
    pub fn save_snapshot(&self, name: &str, vectorizer: &Vectorizer) -> Result<()> {
        let payload = vectorizer.serialize()?;
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshots (name, payload, dimension, words, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                name,
                payload,
                vectorizer.dimension() as i64,
                vectorizer.word_cache().len() as i64,
                now_unix_secs() as i64,
            ],
        )?;
        tracing::debug!(name, bytes = payload.len(), "saved snapshot");
        Ok(())
    }

    /// Raw payload for `name`, if stored.
    pub fn load_payload(&self, name: &str) -> Result<Option<String>> {
        let payload = self
            .conn
            .query_row("SELECT payload FROM snapshots WHERE name = ?1", [name], |row| row.get(0))
            .optional()?;
        Ok(payload)
    }

    /// Restore the snapshot stored under `name`.
    pub fn load_snapshot(&self, name: &str) -> Result<Option<Vectorizer>> {
        match self.load_payload(name)? {
            Some(payload) => Ok(Some(recall_core::import_snapshot(&payload)?)),
            None => Ok(None),
        }
    }

    /// Restore `name` into `vectorizer`; returns false when no such snapshot.
    /// A corrupt payload leaves `vectorizer` untouched.
    pub fn restore_into(&self, name: &str, vectorizer: &mut Vectorizer) -> Result<bool> {
        match self.load_payload(name)? {
            Some(payload) => {
                vectorizer.deserialize(&payload)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn list_snapshots(&self) -> Result<Vec<SnapshotInfo>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, dimension, words, saved_at FROM snapshots ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(SnapshotInfo {
                name: row.get(0)?,
                dimension: row.get::<_, i64>(1)? as usize,
                words: row.get::<_, i64>(2)? as usize,
                saved_at: row.get::<_, i64>(3)? as u64,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_snapshot(&self, name: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM snapshots WHERE name = ?1", [name])?;
        Ok(changed > 0)
    }
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
