//! TMDb film catalog client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use reelid_models::{FilmDetails, FilmSummary};

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::retry::{with_retry, RetryConfig};
use crate::traits::FilmDetailProvider;

const PROVIDER: &str = "tmdb";

/// Poster size used for completion payloads.
pub const POSTER_SIZE: &str = "w500";

#[derive(Debug, Deserialize)]
struct SearchMoviesResponse {
    #[serde(default)]
    results: Vec<FilmSummary>,
}

pub struct TmdbClient {
    http: Client,
    api_key: String,
    base_url: String,
    image_base_url: String,
    retry: RetryConfig,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, config: &ProviderConfig) -> ProviderResult<Self> {
        Ok(Self {
            http: config.http_client()?,
            api_key: api_key.into(),
            base_url: config.tmdb_base_url.trim_end_matches('/').to_string(),
            image_base_url: config.tmdb_image_base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::new("TMDb request", config.max_retries),
        })
    }

    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        let key = config
            .tmdb_api_key
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured("TMDB_API_KEY is required"))?;
        Self::new(key, config)
    }

    /// Absolute image URL for a catalog image path, `None` for empty paths.
    pub fn image_url(&self, path: &str, size: &str) -> Option<String> {
        if path.is_empty() {
            return None;
        }
        Some(format!("{}/{}{}", self.image_base_url, size, path))
    }

    /// Search the catalog by title.
    pub async fn search_movies(&self, query: &str) -> ProviderResult<Vec<FilmSummary>> {
        let url = format!("{}/search/movie", self.base_url);

        let response: SearchMoviesResponse = self
            .get_json(&url, &[("query", query), ("page", "1")])
            .await?;

        Ok(response.results)
    }

    async fn get_json<T>(&self, url: &str, params: &[(&str, &str)]) -> ProviderResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        with_retry(&self.retry, || async {
            let response = self
                .http
                .get(url)
                .query(&[("api_key", self.api_key.as_str())])
                .query(params)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(ProviderError::NotFound(url.to_string()));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::from_status(PROVIDER, status, &body));
            }

            Ok(response.json::<T>().await?)
        })
        .await
    }
}

#[async_trait]
impl FilmDetailProvider for TmdbClient {
    async fn get_film(&self, catalog_id: &str) -> ProviderResult<FilmDetails> {
        let url = format!("{}/movie/{}", self.base_url, catalog_id);
        debug!(catalog_id = %catalog_id, "Fetching film details");

        self.get_json(&url, &[("append_to_response", "credits")])
            .await
            .map_err(|e| match e {
                ProviderError::NotFound(_) => ProviderError::NotFound(format!("film {catalog_id}")),
                other => other,
            })
    }

    fn poster_url(&self, film: &FilmDetails) -> Option<String> {
        film.poster_path
            .as_deref()
            .and_then(|path| self.image_url(path, POSTER_SIZE))
    }
}
