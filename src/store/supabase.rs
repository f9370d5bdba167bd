use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, warn};

use super::{Record, RemoteStore, StoreError};
use crate::config::SupabaseSettings;
use crate::score::Score;

/// Records table behind a Supabase (PostgREST) endpoint.
pub struct SupabaseStore {
    client: reqwest::Client,
    settings: Option<SupabaseSettings>,
}

#[derive(Serialize)]
struct NewRow<'a> {
    nombre: &'a str,
    puntuacion: u8,
}

impl SupabaseStore {
    /// `settings` is `None` when the endpoint or key is missing; every call
    /// then fails with [`StoreError::NotConfigured`] without touching the network.
    pub fn new(settings: Option<SupabaseSettings>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, settings })
    }

    fn table_url(settings: &SupabaseSettings) -> String {
        format!("{}/rest/v1/{}", settings.url, settings.table)
    }

    fn list_url(settings: &SupabaseSettings) -> String {
        format!(
            "{}?select=*&order=created_at.desc",
            Self::table_url(settings)
        )
    }

    fn configured(&self) -> Result<&SupabaseSettings, StoreError> {
        self.settings.as_ref().ok_or_else(|| {
            warn!("supabase not configured");
            StoreError::NotConfigured
        })
    }

    fn authorized(
        &self,
        req: reqwest::RequestBuilder,
        settings: &SupabaseSettings,
    ) -> reqwest::RequestBuilder {
        req.header("apikey", &settings.key)
            .header("authorization", format!("Bearer {}", settings.key))
    }

    async fn fetch(&self, settings: &SupabaseSettings) -> Result<Vec<Record>, StoreError> {
        let req = self.client.get(Self::list_url(settings));
        let resp = self
            .authorized(req, settings)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let text = Self::check(resp)
            .await?
            .text()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RemoteStore for SupabaseStore {
    fn is_available(&self) -> bool {
        self.settings.is_some()
    }

    async fn insert(&self, name: &str, score: Score) -> Result<(), StoreError> {
        let settings = self.configured()?;
        let rows = [NewRow {
            nombre: name,
            puntuacion: score.value(),
        }];

        let req = self
            .client
            .post(Self::table_url(settings))
            .header("content-type", "application/json")
            .header("prefer", "return=minimal")
            .json(&rows);

        let result = match self.authorized(req, settings).send().await {
            Ok(resp) => Self::check(resp).await.map(|_| ()),
            Err(e) => Err(StoreError::Transport(e.to_string())),
        };

        if let Err(e) = &result {
            error!("error saving rating: {e}");
            debug!(?e, table = %settings.table, "full store error");
        }
        result
    }

    async fn list(&self) -> Result<Vec<Record>, StoreError> {
        let settings = self.configured()?;
        let result = self.fetch(settings).await;
        if let Err(e) = &result {
            error!("error fetching ratings: {e}");
            debug!(?e, table = %settings.table, "full store error");
        }
        result
    }

    fn table(&self) -> Option<&str> {
        self.settings.as_ref().map(|s| s.table.as_str())
    }

    fn describe(&self) -> String {
        match &self.settings {
            Some(s) => format!("supabase ({}, table {})", s.url, s.table),
            None => "supabase (not configured)".to_string(),
        }
    }
}
