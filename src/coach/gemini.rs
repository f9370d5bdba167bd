use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Coach;
use crate::config::CoachSettings;
use crate::prompts::coach::build_coach_prompt;
use crate::score::Score;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Coach backed by the Gemini `generateContent` endpoint.
pub struct GeminiCoach {
    client: reqwest::Client,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl GeminiCoach {
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

    fn endpoint(&self) -> String {
        format!("{API_BASE}/{}:generateContent", self.model)
    }

    fn build_request(&self, prompt: &str) -> ApiRequest {
        ApiRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
            },
        }
    }

    /// Concatenated text of the first candidate. Blank if there is none.
    fn extract_text(resp: &ApiResponse) -> String {
        resp.candidates
            .iter()
            .flatten()
            .next()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Coach for GeminiCoach {
    async fn comment(&self, name: &str, score: Score) -> Result<String> {
        let Some(api_key) = &self.api_key else {
            bail!("no Gemini API key. Set GEMINI_API_KEY or `rater config set coach.api_key`.");
        };

        let body = self.build_request(&build_coach_prompt(name, score));
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Gemini API error ({}): {}", status, text);
        }

        let api_resp: ApiResponse = resp.json().await?;
        Ok(Self::extract_text(&api_resp))
    }

    fn describe(&self) -> String {
        format!("gemini ({})", self.model)
    }
}

// --- API types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct ApiResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}
