use std::fmt;

use crate::consts::{MAX_SCORE, emoji_for_score};

/// A performance score, always within `0..=100`.
///
/// Out-of-range input is clamped rather than rejected, so any integer the
/// user types becomes a valid score before a remote call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u8);

impl Score {
    pub fn clamped(raw: i64) -> Self {
        Self(raw.clamp(0, MAX_SCORE as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn emoji(self) -> &'static str {
        emoji_for_score(self.0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
