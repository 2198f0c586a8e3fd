//! Google Cloud Vision image annotation.

use async_trait::async_trait;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use reelid_models::{BoundingBox, ColorInfo, FaceDetection, Label};

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::retry::{with_retry, RetryConfig};
use crate::traits::{FeatureProvider, VisionFeatures};

const PROVIDER: &str = "google_vision";

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
    error: Option<GoogleError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    label_annotations: Vec<LabelAnnotation>,
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    #[serde(default)]
    face_annotations: Vec<FaceAnnotation>,
    image_properties_annotation: Option<ImageProperties>,
    error: Option<GoogleError>,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct LabelAnnotation {
    description: String,
    #[serde(default)]
    score: f64,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaceAnnotation {
    bounding_poly: BoundingPoly,
    #[serde(default)]
    detection_confidence: f64,
}

#[derive(Debug, Deserialize)]
struct BoundingPoly {
    #[serde(default)]
    vertices: Vec<Vertex>,
}

/// Vision omits zero coordinates.
#[derive(Debug, Deserialize)]
struct Vertex {
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageProperties {
    dominant_colors: DominantColors,
}

#[derive(Debug, Deserialize)]
struct DominantColors {
    #[serde(default)]
    colors: Vec<ColorAnnotation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColorAnnotation {
    color: Rgb,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    pixel_fraction: f64,
}

#[derive(Debug, Deserialize)]
struct Rgb {
    #[serde(default)]
    red: f64,
    #[serde(default)]
    green: f64,
    #[serde(default)]
    blue: f64,
}

/// Labels, OCR, faces and dominant colors via Cloud Vision.
pub struct GoogleVisionClient {
    http: Client,
    api_key: String,
    base_url: String,
    retry: RetryConfig,
}

impl GoogleVisionClient {
    pub fn new(api_key: impl Into<String>, config: &ProviderConfig) -> ProviderResult<Self> {
        Ok(Self {
            http: config.http_client()?,
            api_key: api_key.into(),
            base_url: config.google_vision_base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::new("Google Vision annotate", config.max_retries),
        })
    }

    /// Build from config, `None` when no API key is set.
    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Option<Self>> {
        config
            .google_vision_api_key
            .as_deref()
            .map(|key| Self::new(key, config))
            .transpose()
    }
}

#[async_trait]
impl FeatureProvider for GoogleVisionClient {
    async fn annotate(&self, image: &[u8]) -> ProviderResult<VisionFeatures> {
        let url = format!("{}/images:annotate", self.base_url);
        let request = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: BASE64_STANDARD.encode(image),
                },
                features: vec![
                    Feature { kind: "LABEL_DETECTION", max_results: 10 },
                    Feature { kind: "TEXT_DETECTION", max_results: 10 },
                    Feature { kind: "FACE_DETECTION", max_results: 10 },
                    Feature { kind: "IMAGE_PROPERTIES", max_results: 5 },
                ],
            }],
        };

        debug!("Requesting image annotation from {}", url);

        let body: AnnotateResponse = with_retry(&self.retry, || async {
            let response = self
                .http
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::from_status(PROVIDER, status, &body));
            }

            Ok(response.json::<AnnotateResponse>().await?)
        })
        .await?;

        if let Some(error) = body.error {
            return Err(ProviderError::api(PROVIDER, error.message));
        }

        let response = body
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::invalid_response("no responses from Google Vision"))?;

        if let Some(error) = response.error {
            return Err(ProviderError::api(PROVIDER, error.message));
        }

        Ok(into_features(response))
    }
}

fn into_features(response: ImageResponse) -> VisionFeatures {
    let labels = response
        .label_annotations
        .into_iter()
        .map(|l| Label::new(l.description, l.score))
        .collect();

    // The first text annotation aggregates all the others when several exist.
    let skip = usize::from(response.text_annotations.len() > 1);
    let texts = response
        .text_annotations
        .into_iter()
        .skip(skip)
        .map(|t| t.description)
        .collect();

    let faces = response
        .face_annotations
        .into_iter()
        .filter_map(|face| {
            bounding_box(&face.bounding_poly.vertices).map(|bounding_box| FaceDetection {
                bounding_box,
                confidence: face.detection_confidence,
            })
        })
        .collect();

    let colors = response
        .image_properties_annotation
        .map(|props| {
            props
                .dominant_colors
                .colors
                .into_iter()
                .map(|c| ColorInfo {
                    color: format!(
                        "rgb({},{},{})",
                        c.color.red as i32, c.color.green as i32, c.color.blue as i32
                    ),
                    score: c.score,
                    pixel_ratio: c.pixel_fraction,
                })
                .collect()
        })
        .unwrap_or_default();

    VisionFeatures {
        labels,
        texts,
        faces,
        colors,
    }
}

/// Hull of a face polygon; polygons with fewer than four vertices are dropped.
fn bounding_box(vertices: &[Vertex]) -> Option<BoundingBox> {
    if vertices.len() < 4 {
        return None;
    }
    let min_x = vertices.iter().map(|v| v.x).min()?;
    let max_x = vertices.iter().map(|v| v.x).max()?;
    let min_y = vertices.iter().map(|v| v.y).min()?;
    let max_y = vertices.iter().map(|v| v.y).max()?;

    Some(BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    })
}
