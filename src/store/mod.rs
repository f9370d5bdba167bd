pub mod sqlite;
pub mod supabase;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::score::Score;

/// Store-assigned identifier. Integer keys and uuid/text keys both occur.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// One persisted rating entry, as returned by [`RemoteStore::list`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "puntuacion")]
    pub score: i64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach_comment: Option<String>,
}

impl Record {
    /// The stored score, clamped in case the table holds something odd.
    pub fn score(&self) -> Score {
        Score::clamped(self.score)
    }
}

/// Why a store call failed.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store not configured")]
    NotConfigured,
    #[error("store request failed: {0}")]
    Transport(String),
    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected store response: {0}")]
    Decode(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("unexpected store failure: {0}")]
    Unexpected(String),
}

/// RFC 3339, or a bare `timestamp` column value read as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|t| t.and_utc())
        .map_err(|e| StoreError::Decode(format!("bad created_at {raw:?}: {e}")))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// Durable home of the leaderboard. Errors are classified, never thrown.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Whether calls can be attempted at all (endpoint and credentials present).
    fn is_available(&self) -> bool;

    /// Persist one record. The created row is not echoed back; re-`list` to see it.
    async fn insert(&self, name: &str, score: Score) -> Result<(), StoreError>;

    /// Every record, newest first.
    async fn list(&self) -> Result<Vec<Record>, StoreError>;

    /// Table name used in user-facing hints, if the backend has one.
    fn table(&self) -> Option<&str> {
        None
    }

    /// Short label for the startup banner.
    fn describe(&self) -> String;
}
