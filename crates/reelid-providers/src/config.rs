//! Provider configuration.

use std::time::Duration;

use reqwest::Client;

use crate::error::{ProviderError, ProviderResult};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GOOGLE_VISION_BASE_URL: &str = "https://vision.googleapis.com/v1";
pub const DEFAULT_GOOGLE_SEARCH_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";
pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Credentials and endpoints for all external providers.
///
/// A provider whose key is missing is simply not constructed.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub google_vision_api_key: Option<String>,
    pub google_vision_base_url: String,
    pub google_search_api_key: Option<String>,
    pub google_cse_id: Option<String>,
    pub google_search_base_url: String,
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: String,
    pub tmdb_image_base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Max retries for retryable failures
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: "gpt-4o".to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            google_vision_api_key: None,
            google_vision_base_url: DEFAULT_GOOGLE_VISION_BASE_URL.to_string(),
            google_search_api_key: None,
            google_cse_id: None,
            google_search_base_url: DEFAULT_GOOGLE_SEARCH_BASE_URL.to_string(),
            tmdb_api_key: None,
            tmdb_base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            tmdb_image_base_url: DEFAULT_TMDB_IMAGE_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai_api_key: env_key("OPENAI_API_KEY"),
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            google_vision_api_key: env_key("GOOGLE_VISION_API_KEY"),
            google_vision_base_url: std::env::var("GOOGLE_VISION_BASE_URL")
                .unwrap_or(defaults.google_vision_base_url),
            google_search_api_key: env_key("GOOGLE_SEARCH_API_KEY"),
            google_cse_id: env_key("GOOGLE_CSE_ID"),
            google_search_base_url: std::env::var("GOOGLE_SEARCH_BASE_URL")
                .unwrap_or(defaults.google_search_base_url),
            tmdb_api_key: env_key("TMDB_API_KEY"),
            tmdb_base_url: std::env::var("TMDB_BASE_URL").unwrap_or(defaults.tmdb_base_url),
            tmdb_image_base_url: std::env::var("TMDB_IMAGE_BASE_URL")
                .unwrap_or(defaults.tmdb_image_base_url),
            timeout: Duration::from_secs(
                std::env::var("PROVIDER_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("PROVIDER_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }

    /// Build the shared HTTP client.
    pub fn http_client(&self) -> ProviderResult<Client> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProviderError::Network)
    }

    /// Names of providers that have credentials, for startup logs.
    pub fn configured_providers(&self) -> Vec<&'static str> {
        let mut providers = Vec::new();
        if self.openai_api_key.is_some() {
            providers.push("openai");
        }
        if self.google_vision_api_key.is_some() {
            providers.push("google_vision");
        }
        if self.google_search_api_key.is_some() && self.google_cse_id.is_some() {
            providers.push("google_search");
        }
        if self.tmdb_api_key.is_some() {
            providers.push("tmdb");
        }
        providers
    }
}

/// Read a non-empty environment variable.
fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.openai_model, "gpt-4o");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 2);
        assert!(config.configured_providers().is_empty());
    }

    #[test]
    fn test_search_needs_key_and_engine_id() {
        let config = ProviderConfig {
            google_search_api_key: Some("key".to_string()),
            tmdb_api_key: Some("tmdb".to_string()),
            ..ProviderConfig::default()
        };
        assert_eq!(config.configured_providers(), vec!["tmdb"]);
    }
}
