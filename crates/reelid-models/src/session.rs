//! Session status and read models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::candidate::FilmCandidate;
use crate::film::FilmDetails;
use crate::ids::{SessionId, VideoId};

/// Chip value to selection state, as set by user feedback.
pub type FeedbackMap = BTreeMap<String, bool>;

/// Identification session status.
///
/// `Analyzing` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Analyzing,
    Complete,
    NeedsInput,
    Cancelled,
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Analyzing => "analyzing",
            SessionStatus::Complete => "complete",
            SessionStatus::NeedsInput => "needs_input",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Analyzing)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Point-in-time view of a session, safe to hand to callers.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub video_id: VideoId,
    pub status: SessionStatus,
    pub current_frame: u32,
    pub candidates: Vec<FilmCandidate>,
    pub feedback: FeedbackMap,
    pub confidence: f64,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Payload of a successful identification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationResult {
    pub session_id: SessionId,
    pub video_id: VideoId,
    pub film_details: FilmDetails,
    pub confidence: f64,
    /// Number of frames consumed, counting the current one
    pub frames_used: u32,
    /// Wall time since session start, in milliseconds
    pub time_elapsed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}
