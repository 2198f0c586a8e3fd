//! Composite vision service.
//!
//! Merges a caption from a [`CaptionProvider`] with labels, OCR, faces and
//! colors from a [`FeatureProvider`]. Either half may be absent; a failure
//! in one half is logged and the other half's output kept.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use reelid_models::FrameAnalysis;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::google_vision::GoogleVisionClient;
use crate::openai::OpenAiCaptioner;
use crate::traits::{CaptionProvider, FeatureProvider, VisionProvider};

const CAPTION_WEIGHT: f64 = 0.4;
const LABEL_WEIGHT: f64 = 0.3;
const OCR_WEIGHT: f64 = 0.2;
const FACE_WEIGHT: f64 = 0.1;

pub struct VisionService {
    captioner: Option<Arc<dyn CaptionProvider>>,
    annotator: Option<Arc<dyn FeatureProvider>>,
}

impl VisionService {
    /// At least one of the two providers is required.
    pub fn new(
        captioner: Option<Arc<dyn CaptionProvider>>,
        annotator: Option<Arc<dyn FeatureProvider>>,
    ) -> ProviderResult<Self> {
        if captioner.is_none() && annotator.is_none() {
            return Err(ProviderError::not_configured(
                "at least one vision provider is required (OpenAI or Google Vision)",
            ));
        }
        Ok(Self {
            captioner,
            annotator,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        let captioner = OpenAiCaptioner::from_config(config)?
            .map(|c| Arc::new(c) as Arc<dyn CaptionProvider>);
        let annotator = GoogleVisionClient::from_config(config)?
            .map(|c| Arc::new(c) as Arc<dyn FeatureProvider>);

        info!(
            captioning = captioner.is_some(),
            annotation = annotator.is_some(),
            "Vision service configured"
        );

        Self::new(captioner, annotator)
    }
}

/// Frame confidence from which analysis sections are present.
pub fn analysis_confidence(analysis: &FrameAnalysis) -> f64 {
    let mut confidence = 0.0;
    if !analysis.caption.is_empty() {
        confidence += CAPTION_WEIGHT;
    }
    if !analysis.labels.is_empty() {
        confidence += analysis.max_label_confidence() * LABEL_WEIGHT;
    }
    if !analysis.text_ocr.is_empty() {
        confidence += OCR_WEIGHT;
    }
    if !analysis.faces.is_empty() {
        confidence += FACE_WEIGHT;
    }
    confidence
}

#[async_trait]
impl VisionProvider for VisionService {
    async fn analyze(&self, image: &[u8]) -> ProviderResult<FrameAnalysis> {
        let caption = async {
            match &self.captioner {
                Some(captioner) => Some(captioner.caption(image).await),
                None => None,
            }
        };
        let features = async {
            match &self.annotator {
                Some(annotator) => Some(annotator.annotate(image).await),
                None => None,
            }
        };
        let (caption, features) = tokio::join!(caption, features);

        let mut analysis = FrameAnalysis {
            timestamp: Utc::now(),
            ..FrameAnalysis::default()
        };
        let mut succeeded = false;
        let mut last_error = None;

        match caption {
            Some(Ok(text)) => {
                analysis.caption = text;
                succeeded = true;
            }
            Some(Err(e)) => {
                warn!("Frame captioning failed: {}", e);
                last_error = Some(e);
            }
            None => {}
        }

        match features {
            Some(Ok(features)) => {
                analysis.labels = features.labels;
                analysis.text_ocr = features.texts;
                analysis.faces = features.faces;
                analysis.colors = features.colors;
                succeeded = true;
            }
            Some(Err(e)) => {
                warn!("Frame annotation failed: {}", e);
                last_error = Some(e);
            }
            None => {}
        }

        if !succeeded {
            return Err(last_error
                .unwrap_or_else(|| ProviderError::not_configured("no vision providers")));
        }

        analysis.confidence = analysis_confidence(&analysis);
        Ok(analysis)
    }
}
