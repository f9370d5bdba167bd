use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Coach;
use crate::config::CoachSettings;
use crate::prompts::coach::build_coach_prompt;
use crate::score::Score;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Coach backed by the Anthropic Messages API.
pub struct AnthropicCoach {
    client: reqwest::Client,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl AnthropicCoach {
    pub fn new(settings: &CoachSettings, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    /// Text blocks of the reply, joined.
    fn extract_text(resp: &ApiResponse) -> String {
        resp.content
            .iter()
            .filter_map(|block| {
                if block.content_type == "text" {
                    block.text.as_deref()
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[async_trait]
impl Coach for AnthropicCoach {
    async fn comment(&self, name: &str, score: Score) -> Result<String> {
        let Some(api_key) = &self.api_key else {
            bail!("no Anthropic API key. Set ANTHROPIC_API_KEY or `rater config set coach.api_key`.");
        };

        let prompt = build_coach_prompt(name, score);
        let messages = [Message {
            role: "user",
            content: &prompt,
        }];
        let body = ApiRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: &messages,
        };

        let resp = self
            .client
            .post(API_URL)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .header("x-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Anthropic API error ({}): {}", status, text);
        }

        let api_resp: ApiResponse = resp.json().await?;
        if let Some(usage) = &api_resp.usage {
            debug!(
                input = usage.input_tokens,
                output = usage.output_tokens,
                "coach token usage"
            );
        }

        Ok(Self::extract_text(&api_resp))
    }

    fn describe(&self) -> String {
        format!("anthropic ({})", self.model)
    }
}

// --- API types ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: &'a [Message<'a>],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}
