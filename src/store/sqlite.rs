use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use tracing::debug;

use super::{Record, RemoteStore, StoreError, parse_timestamp};
use crate::score::Score;

/// SQLite-backed record store for running without a hosted backend.
///
/// Assigns ids and timestamps itself, the same way the hosted table does.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: String,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS records (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                nombre     TEXT NOT NULL,
                puntuacion INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS records_created_at ON records (created_at);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_string(),
        })
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:")
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RemoteStore for SqliteStore {
    fn is_available(&self) -> bool {
        true
    }

    async fn insert(&self, name: &str, score: Score) -> Result<(), StoreError> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        self.conn().execute(
            "INSERT INTO records (created_at, nombre, puntuacion) VALUES (?1, ?2, ?3)",
            rusqlite::params![created_at, name, score.value()],
        )?;
        debug!(name, score = score.value(), "record inserted locally");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, created_at, nombre, puntuacion FROM records
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, created_at, name, score)| -> Result<Record, StoreError> {
                Ok(Record {
                    id: id.into(),
                    name,
                    score,
                    created_at: parse_timestamp(&created_at)?,
                    coach_comment: None,
                })
            })
            .collect()
    }

    fn table(&self) -> Option<&str> {
        Some("records")
    }

    fn describe(&self) -> String {
        if self.path == ":memory:" {
            "local (ephemeral)".to_string()
        } else {
            format!("local ({})", self.path)
        }
    }
}
