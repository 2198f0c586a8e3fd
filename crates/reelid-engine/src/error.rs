//! Engine error types.

use thiserror::Error;

use reelid_media::MediaError;
use reelid_models::{SessionId, VideoId};
use reelid_providers::ProviderError;
use reelid_storage::StorageError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Video not found: {0}")]
    VideoNotFound(VideoId),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Events for session {0} are already being consumed")]
    EventsAlreadyTaken(SessionId),

    #[error("Video lookup failed: {0}")]
    VideoLookup(#[source] StorageError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Frame extraction failed: {0}")]
    Media(#[from] MediaError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("No frame extracted at position {0}")]
    NoFrame(u32),
}

impl EngineError {
    /// Errors caused by the caller rather than the engine.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            EngineError::VideoNotFound(_)
                | EngineError::SessionNotFound(_)
                | EngineError::EventsAlreadyTaken(_)
        )
    }
}
