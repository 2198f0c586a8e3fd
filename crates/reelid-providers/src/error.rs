//! Provider error types.

use reqwest::StatusCode;
use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("{provider} unavailable: {message}")]
    ServiceUnavailable { provider: String, message: String },

    #[error("{provider} rate limited")]
    RateLimited { provider: String },

    #[error("{provider} request failed: {message}")]
    RequestFailed { provider: String, message: String },

    #[error("{provider} API error: {message}")]
    Api { provider: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(provider: &str, status: StatusCode, body: &str) -> Self {
        let provider = provider.to_string();
        if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited { provider }
        } else if status.is_server_error() {
            Self::ServiceUnavailable {
                provider,
                message: format!("returned {}: {}", status, body),
            }
        } else {
            Self::RequestFailed {
                provider,
                message: format!("returned {}: {}", status, body),
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::ServiceUnavailable { .. }
                | ProviderError::RateLimited { .. }
                | ProviderError::Network(_)
        )
    }
}
