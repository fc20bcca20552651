//! Workspace content API client for database queries.
//!
//! This client runs filtered, read-only queries against the hosted workspace
//! databases (Notion wire format) and follows result-set pagination until the
//! server reports no further pages.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::config::WorkspaceConfig;

/// Workspace API client holding the integration token.
pub struct WorkspaceClient {
    token: String,
    base_url: String,
    api_version: String,
    page_size: u32,
    client: reqwest::Client,
}

impl WorkspaceClient {
    /// Create a new client from the workspace configuration.
    pub fn new(config: &WorkspaceConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Workspace token not configured"))?;
        Ok(Self {
            token,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            page_size: config.page_size,
            client: reqwest::Client::new(),
        })
    }

    /// Run a filtered query against one database, fetching all pages.
    pub async fn query_database(&self, database_id: &str, filter: &Value) -> Result<Vec<Page>> {
        let url = format!("{}/v1/databases/{}/query", self.base_url, database_id);

        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = serde_json::json!({
                "filter": filter,
                "page_size": self.page_size,
            });
            if let Some(ref c) = cursor {
                body["start_cursor"] = Value::String(c.clone());
            }

            let response = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.token))
                .header("Notion-Version", &self.api_version)
                .header("User-Agent", concat!("digestr/", env!("CARGO_PKG_VERSION")))
                .json(&body)
                .send()
                .await
                .context("Failed to reach the workspace API")?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("Workspace API error: {} - {}", status, body);
            }

            let batch: QueryResponse = response
                .json()
                .await
                .context("Failed to parse workspace query response")?;

            pages.extend(batch.results);

            match (batch.has_more, batch.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(pages)
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Page>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// One row of a database query: an opaque property map keyed by display name.
///
/// Property values are kept as raw JSON; the shapes vary per property kind and
/// are resolved field-by-field by the extraction layer.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}
