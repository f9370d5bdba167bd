use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use super::Coach;
use crate::score::Score;

/// A scripted coach for tests. Returns pre-defined results in order.
pub struct ScriptedCoach {
    script: Mutex<VecDeque<Result<String>>>,
    repeat: Option<String>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedCoach {
    pub fn new(script: Vec<Result<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            repeat: None,
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Answer every call with `text`.
    pub fn always(text: &str) -> Self {
        Self {
            repeat: Some(text.to_string()),
            ..Self::new(vec![])
        }
    }

    /// Sleep before answering, to simulate a slow service.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `comment` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Coach for ScriptedCoach {
    async fn comment(&self, _name: &str, _score: Score) -> Result<String> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(text) = &self.repeat {
            return Ok(text.clone());
        }
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Err(anyhow::anyhow!(
                    "ScriptedCoach: no more comments (called {} times)",
                    i + 1
                ))
            })
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
