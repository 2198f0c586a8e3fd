//! Engine configuration.

use std::time::Duration;

/// Identification engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Top-candidate score that completes a session
    pub score_threshold: f64,
    /// Frames to try before giving up
    pub max_frames: u32,
    /// Edge length of extracted frames in pixels
    pub frame_size: u32,
    /// Outbox capacity per session, at least 2
    pub event_buffer: usize,
    /// How long a pass waits for feedback before moving to the next frame
    pub idle_wait: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.9,
            max_frames: 10,
            frame_size: 512,
            event_buffer: 100,
            idle_wait: Duration::from_millis(500),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            score_threshold: std::env::var("IDENT_SCORE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.score_threshold),
            max_frames: std::env::var("IDENT_MAX_FRAMES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_frames),
            frame_size: std::env::var("IDENT_FRAME_SIZE")
                .or_else(|_| std::env::var("FRAME_SIZE"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.frame_size),
            event_buffer: std::env::var("IDENT_EVENT_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.event_buffer)
                .max(2),
            idle_wait: Duration::from_millis(
                std::env::var("IDENT_IDLE_WAIT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(500),
            ),
        }
    }
}
