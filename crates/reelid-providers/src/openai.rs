//! OpenAI frame captioning.

use async_trait::async_trait;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::retry::{with_retry, RetryConfig};
use crate::traits::CaptionProvider;

const PROVIDER: &str = "openai";

const CAPTION_PROMPT: &str = "Analyze this video frame and provide a detailed description. Include:\n\
1. The scene setting and environment\n\
2. Any visible actors or people\n\
3. Notable objects or props\n\
4. Any visible text or titles\n\
5. The apparent genre and era of the film\n\
6. If you can identify the specific movie, mention it\n\
Be specific and detailed to help identify the film.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Captions frames with an OpenAI vision-capable chat model.
pub struct OpenAiCaptioner {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
    retry: RetryConfig,
}

impl OpenAiCaptioner {
    pub fn new(api_key: impl Into<String>, config: &ProviderConfig) -> ProviderResult<Self> {
        Ok(Self {
            http: config.http_client()?,
            api_key: api_key.into(),
            model: config.openai_model.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::new("OpenAI caption", config.max_retries),
        })
    }

    /// Build from config, `None` when no API key is set.
    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Option<Self>> {
        config
            .openai_api_key
            .as_deref()
            .map(|key| Self::new(key, config))
            .transpose()
    }
}

#[async_trait]
impl CaptionProvider for OpenAiCaptioner {
    async fn caption(&self, image: &[u8]) -> ProviderResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let data_url = format!("data:image/jpeg;base64,{}", BASE64_STANDARD.encode(image));

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: CAPTION_PROMPT,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
        };

        debug!("Requesting frame caption from {}", url);

        let body: ChatResponse = with_retry(&self.retry, || async {
            let response = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::from_status(PROVIDER, status, &body));
            }

            Ok(response.json::<ChatResponse>().await?)
        })
        .await?;

        if let Some(error) = body.error {
            return Err(ProviderError::api(PROVIDER, error.message));
        }

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::invalid_response("no choices in OpenAI response"))
    }
}
