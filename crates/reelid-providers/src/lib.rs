//! Vision, web search and film catalog clients for ReelID.
//!
//! The identification engine only sees the capability traits in
//! [`traits`]. This crate ships one HTTP implementation per provider:
//! - OpenAI chat completions for frame captions
//! - Google Cloud Vision for labels, OCR, faces and colors
//! - Google Custom Search for web results
//! - TMDb for film details and poster images

pub mod config;
pub mod error;
pub mod google_search;
pub mod google_vision;
pub mod openai;
pub mod retry;
pub mod tmdb;
pub mod traits;
pub mod vision;

pub use config::ProviderConfig;
pub use error::{ProviderError, ProviderResult};
pub use google_search::GoogleSearchClient;
pub use google_vision::GoogleVisionClient;
pub use openai::OpenAiCaptioner;
pub use tmdb::TmdbClient;
pub use traits::{
    CaptionProvider, FeatureProvider, FilmDetailProvider, VisionFeatures, VisionProvider,
    WebSearchProvider,
};
pub use vision::VisionService;
