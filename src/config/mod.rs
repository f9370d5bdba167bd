//! Persistent key-value settings plus resolution into runtime [`Settings`].
//!
//! The `config` table shares a database with
//! [`SqliteStore`](crate::store::sqlite::SqliteStore); pass the same path
//! to both. Values resolve with priority environment variable, then stored
//! key, then built-in default.

use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use rusqlite::Connection;

use crate::consts::{
    DEFAULT_ANTHROPIC_MODEL, DEFAULT_GEMINI_MODEL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_TOKENS,
    DEFAULT_TABLE, DEFAULT_TEMPERATURE,
};

pub const STORE_BACKEND: &str = "store.backend";
pub const STORE_URL: &str = "store.url";
pub const STORE_KEY: &str = "store.key";
pub const STORE_TABLE: &str = "store.table";
pub const COACH_PROVIDER: &str = "coach.provider";
pub const COACH_MODEL: &str = "coach.model";
pub const COACH_API_KEY: &str = "coach.api_key";
pub const COACH_TEMPERATURE: &str = "coach.temperature";
pub const COACH_MAX_TOKENS: &str = "coach.max_tokens";
pub const HTTP_TIMEOUT_SECS: &str = "http.timeout_secs";

/// Every key `rater config` accepts.
pub const KNOWN_KEYS: &[&str] = &[
    STORE_BACKEND,
    STORE_URL,
    STORE_KEY,
    STORE_TABLE,
    COACH_PROVIDER,
    COACH_MODEL,
    COACH_API_KEY,
    COACH_TEMPERATURE,
    COACH_MAX_TOKENS,
    HTTP_TIMEOUT_SECS,
];

/// Persistent key-value configuration store.
pub struct Config {
    conn: Mutex<Connection>,
}

impl Config {
    /// Open or create the config table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open config database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create config table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a config value by key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT value FROM config WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Set a config value (upsert). Unknown keys are rejected.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        if !KNOWN_KEYS.contains(&key) {
            bail!("unknown config key: {key} (known: {})", KNOWN_KEYS.join(", "));
        }
        self.conn().execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    /// Remove a config key.
    pub fn remove(&self, key: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM config WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// Where records are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Hosted PostgREST endpoint (Supabase).
    Supabase,
    /// SQLite table next to the settings.
    Local,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" | "remote" => Ok(Self::Supabase),
            "local" | "sqlite" => Ok(Self::Local),
            other => bail!("unknown store backend: {other}"),
        }
    }
}

/// Text generation service used for coach comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoachProvider {
    Gemini,
    Anthropic,
}

impl CoachProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => DEFAULT_GEMINI_MODEL,
            Self::Anthropic => DEFAULT_ANTHROPIC_MODEL,
        }
    }

    /// Environment variables checked for the API key, in order.
    pub fn key_env_vars(self) -> &'static [&'static str] {
        match self {
            Self::Gemini => &["GEMINI_API_KEY", "API_KEY"],
            Self::Anthropic => &["ANTHROPIC_API_KEY"],
        }
    }
}

impl FromStr for CoachProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => bail!("unknown coach provider: {other}"),
        }
    }
}

/// Endpoint and credentials for the hosted store.
#[derive(Debug, Clone)]
pub struct SupabaseSettings {
    pub url: String,
    pub key: String,
    pub table: String,
}

#[derive(Debug, Clone)]
pub struct CoachSettings {
    pub provider: CoachProvider,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Everything the clients need, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub backend: StoreBackend,
    /// `None` when the URL or key is missing; the store then reports itself unavailable.
    pub supabase: Option<SupabaseSettings>,
    pub coach: CoachSettings,
    pub http_timeout: Duration,
}

impl Settings {
    /// Resolve from the process environment and the stored config.
    pub fn resolve(config: &Config) -> Result<Self> {
        Self::resolve_with(config, |var| std::env::var(var).ok())
    }

    /// Resolve with an injectable environment lookup.
    pub fn resolve_with(config: &Config, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str, vars: &[&str]| -> Result<Option<String>> {
            for var in vars {
                if let Some(value) = env(var)
                    && !value.trim().is_empty()
                {
                    return Ok(Some(value.trim().to_string()));
                }
            }
            Ok(config.get(key)?.filter(|v| !v.trim().is_empty()))
        };

        let backend = match lookup(STORE_BACKEND, &["RATER_STORE"])? {
            Some(raw) => raw.parse()?,
            None => StoreBackend::Supabase,
        };

        let url = lookup(STORE_URL, &["RATER_STORE_URL", "SUPABASE_URL"])?;
        let key = lookup(STORE_KEY, &["RATER_STORE_KEY", "SUPABASE_KEY"])?;
        let table = lookup(STORE_TABLE, &["RATER_STORE_TABLE"])?
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());
        let supabase = match (url, key) {
            (Some(url), Some(key)) => Some(SupabaseSettings {
                url: url.trim_end_matches('/').to_string(),
                key,
                table,
            }),
            _ => None,
        };

        let provider = match lookup(COACH_PROVIDER, &["RATER_COACH"])? {
            Some(raw) => raw.parse()?,
            None => CoachProvider::Gemini,
        };
        let model = lookup(COACH_MODEL, &["RATER_COACH_MODEL"])?
            .unwrap_or_else(|| provider.default_model().to_string());
        let api_key = lookup(COACH_API_KEY, provider.key_env_vars())?;
        let temperature = match lookup(COACH_TEMPERATURE, &["RATER_COACH_TEMPERATURE"])? {
            Some(raw) => raw
                .parse::<f32>()
                .with_context(|| format!("invalid {COACH_TEMPERATURE}: {raw}"))?,
            None => DEFAULT_TEMPERATURE,
        };
        let max_tokens = match lookup(COACH_MAX_TOKENS, &["RATER_COACH_MAX_TOKENS"])? {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("invalid {COACH_MAX_TOKENS}: {raw}"))?,
            None => DEFAULT_MAX_TOKENS,
        };
        let timeout_secs = match lookup(HTTP_TIMEOUT_SECS, &["RATER_HTTP_TIMEOUT_SECS"])? {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("invalid {HTTP_TIMEOUT_SECS}: {raw}"))?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            backend,
            supabase,
            coach: CoachSettings {
                provider,
                model,
                api_key,
                temperature,
                max_tokens,
            },
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
