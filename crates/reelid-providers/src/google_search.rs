//! Google Custom Search client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use reelid_models::SearchResult;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::retry::{with_retry, RetryConfig};
use crate::traits::WebSearchProvider;

const PROVIDER: &str = "google";

/// Results requested per query (the API maximum).
const RESULTS_PER_QUERY: u32 = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    /// Absent when the query has no hits.
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

pub struct GoogleSearchClient {
    http: Client,
    api_key: String,
    engine_id: String,
    base_url: String,
    retry: RetryConfig,
}

impl GoogleSearchClient {
    pub fn new(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        config: &ProviderConfig,
    ) -> ProviderResult<Self> {
        Ok(Self {
            http: config.http_client()?,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            base_url: config.google_search_base_url.clone(),
            retry: RetryConfig::new("Google search", config.max_retries),
        })
    }

    /// Build from config; both the API key and the engine id are required.
    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        match (&config.google_search_api_key, &config.google_cse_id) {
            (Some(key), Some(cx)) => Self::new(key, cx, config),
            _ => Err(ProviderError::not_configured(
                "GOOGLE_SEARCH_API_KEY and GOOGLE_CSE_ID are required",
            )),
        }
    }
}

#[async_trait]
impl WebSearchProvider for GoogleSearchClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search(&self, query: &str) -> ProviderResult<Vec<SearchResult>> {
        debug!(query = %query, "Running web search");

        let num = RESULTS_PER_QUERY.to_string();
        let response: SearchResponse = with_retry(&self.retry, || async {
            let response = self
                .http
                .get(&self.base_url)
                .query(&[
                    ("key", self.api_key.as_str()),
                    ("cx", self.engine_id.as_str()),
                    ("q", query),
                    ("num", num.as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::from_status(PROVIDER, status, &body));
            }

            Ok(response.json::<SearchResponse>().await?)
        })
        .await?;

        Ok(response
            .items
            .into_iter()
            .map(|item| SearchResult::new(item.title, item.link, item.snippet))
            .collect())
    }
}
