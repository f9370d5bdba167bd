//! Project-wide constants.

use std::path::PathBuf;

use anyhow::{Context, Result};

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Score the input form resets to after a successful submission.
pub const DEFAULT_SCORE: u8 = 50;

/// Highest score a record can carry.
pub const MAX_SCORE: u8 = 100;

/// Remote table holding the leaderboard.
pub const DEFAULT_TABLE: &str = "clasificacion";

/// Default Gemini model for coach comments.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Default Anthropic model for coach comments.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Sampling temperature for coach comments.
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Output cap for coach comments, sized for a single sentence.
pub const DEFAULT_MAX_TOKENS: u32 = 50;

/// Transport timeout for every remote call.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;

/// Default database path: `~/.rater/rater.db`.
/// Holds both the settings table and the local record store.
pub fn default_db_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".rater").join("rater.db"))
}

/// Emoji for the 20-point band a score falls into.
pub fn emoji_for_score(score: u8) -> &'static str {
    match score {
        0..20 => "😫",
        20..40 => "😕",
        40..60 => "🙂",
        60..80 => "🚀",
        _ => "🔥",
    }
}
