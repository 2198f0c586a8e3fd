//! Provider capability traits.
//!
//! The engine depends on these only; concrete clients are chosen at startup.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use reelid_models::{ColorInfo, FaceDetection, FilmDetails, FrameAnalysis, Label, SearchResult};

use crate::error::ProviderResult;

/// Turns one JPEG frame into a structured analysis.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    async fn analyze(&self, image: &[u8]) -> ProviderResult<FrameAnalysis>;
}

/// Ranked web search.
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Provenance tag recorded on candidates built from this provider.
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> ProviderResult<Vec<SearchResult>>;
}

/// Film catalog lookup by catalog id.
#[async_trait]
pub trait FilmDetailProvider: Send + Sync {
    async fn get_film(&self, catalog_id: &str) -> ProviderResult<FilmDetails>;

    /// Public poster URL for a film, if it has one.
    fn poster_url(&self, film: &FilmDetails) -> Option<String>;
}

/// Free-text captioning of a frame.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    async fn caption(&self, image: &[u8]) -> ProviderResult<String>;
}

/// Label, OCR, face and color detection for a frame.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FeatureProvider: Send + Sync {
    async fn annotate(&self, image: &[u8]) -> ProviderResult<VisionFeatures>;
}

/// Output of a [`FeatureProvider`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisionFeatures {
    pub labels: Vec<Label>,
    pub texts: Vec<String>,
    pub faces: Vec<FaceDetection>,
    pub colors: Vec<ColorInfo>,
}
