//! Structured session logging.
//!
//! Every line carries the session and video ids so one identification can
//! be followed across frames and passes.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reelid_models::{SessionId, VideoId};

/// Install the global subscriber for a binary.
///
/// JSON lines when `LOG_FORMAT=json`, colored text otherwise. `RUST_LOG`
/// overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Session logger for the identification loop.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: String,
    video_id: String,
}

impl SessionLogger {
    pub fn new(session_id: &SessionId, video_id: &VideoId) -> Self {
        Self {
            session_id: session_id.to_string(),
            video_id: video_id.to_string(),
        }
    }

    /// Log the start of an identification.
    pub fn log_start(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            video_id = %self.video_id,
            "Identification started: {}", message
        );
    }

    /// Log a frame being picked up.
    pub fn log_frame(&self, frame: u32, reused: bool) {
        info!(
            session_id = %self.session_id,
            video_id = %self.video_id,
            frame,
            reused,
            "Analyzing frame"
        );
    }

    /// Log the outcome of one search and scoring pass.
    pub fn log_pass(&self, frame: u32, candidates: usize, confidence: f64) {
        info!(
            session_id = %self.session_id,
            video_id = %self.video_id,
            frame,
            candidates,
            confidence,
            "Scoring pass finished"
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            session_id = %self.session_id,
            video_id = %self.video_id,
            "Identification warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            session_id = %self.session_id,
            video_id = %self.video_id,
            "Identification error: {}", message
        );
    }

    /// Log the terminal status of a session.
    pub fn log_completion(&self, status: &str, message: &str) {
        info!(
            session_id = %self.session_id,
            video_id = %self.video_id,
            status,
            "Identification finished: {}", message
        );
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Span wrapping the whole loop task.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "identification",
            session_id = %self.session_id,
            video_id = %self.video_id
        )
    }
}
