//! Coach comments: a short motivational line per submission.
//!
//! A [`Coach`] talks to a text-generation service and may fail. The
//! [`FeedbackGenerator`] wrapping it never does: every failure collapses to
//! a canned phrase, so a comment is always available for display.

pub mod anthropic;
pub mod gemini;
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, error};

use crate::config::{CoachProvider, CoachSettings};
use crate::score::Score;

/// Shown when the service answers with nothing usable.
pub const EMPTY_RESPONSE_FALLBACK: &str = "¡Buen trabajo, sigue entrenando!";

/// Shown when the call itself fails.
pub const FAILURE_FALLBACK: &str = "¡A tope! Sigue dándolo todo.";

/// A text generator that comments on a score. Could be an LLM or a test script.
#[async_trait]
pub trait Coach: Send + Sync {
    /// Raw generated text. May be blank.
    async fn comment(&self, name: &str, score: Score) -> Result<String>;

    /// Short label for the startup banner.
    fn describe(&self) -> String;
}

/// Build the coach for the configured provider.
pub fn from_settings(settings: &CoachSettings, timeout: std::time::Duration) -> Result<Box<dyn Coach>> {
    Ok(match settings.provider {
        CoachProvider::Gemini => Box::new(gemini::GeminiCoach::new(settings, timeout)?),
        CoachProvider::Anthropic => Box::new(anthropic::AnthropicCoach::new(settings, timeout)?),
    })
}

/// What one generation attempt produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Generated(String),
    Empty,
    Failed(String),
}

impl Feedback {
    fn from_result(result: Result<String>) -> Self {
        match result {
            Ok(text) if text.trim().is_empty() => Self::Empty,
            Ok(text) => Self::Generated(text.trim().to_string()),
            Err(e) => Self::Failed(format!("{e:#}")),
        }
    }

    /// Collapse to display text, substituting the fallback phrases.
    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) => text,
            Self::Empty => EMPTY_RESPONSE_FALLBACK.to_string(),
            Self::Failed(_) => FAILURE_FALLBACK.to_string(),
        }
    }
}

/// Best-effort comment generation. Never fails from the caller's point of view.
pub struct FeedbackGenerator {
    coach: Box<dyn Coach>,
}

impl FeedbackGenerator {
    pub fn new(coach: Box<dyn Coach>) -> Self {
        Self { coach }
    }

    /// One attempt, no retries. Errors are logged and masked.
    pub async fn attempt(&self, name: &str, score: Score) -> Feedback {
        let feedback = Feedback::from_result(self.coach.comment(name, score).await);
        match &feedback {
            Feedback::Failed(reason) => error!("coach error: {reason}"),
            Feedback::Empty => debug!("coach returned an empty comment"),
            Feedback::Generated(_) => {}
        }
        feedback
    }

    pub async fn generate(&self, name: &str, score: Score) -> String {
        self.attempt(name, score).await.into_text()
    }

    pub fn describe(&self) -> String {
        self.coach.describe()
    }
}
