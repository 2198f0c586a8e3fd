//! Session update events.
//!
//! Every session produces an ordered stream of these. Exactly one terminal
//! event (`complete`, `needs_input` or `cancelled`) ends a stream, except for
//! sessions that fail before their first frame, which end silently.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::candidate::{Chip, FilmCandidate};
use crate::ids::SessionId;
use crate::session::IdentificationResult;

/// Message sent when all frames were used without reaching the threshold.
pub const NEEDS_INPUT_MESSAGE: &str = "Could not identify film with high confidence. \
Please try selecting more chips or uploading a different clip.";

/// Message sent when the caller stops a session.
pub const CANCELLED_MESSAGE: &str = "Identification cancelled by user";

/// Session update types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionUpdateType {
    Chips,
    Candidates,
    Complete,
    NeedsInput,
    Cancelled,
}

impl SessionUpdateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionUpdateType::Chips => "chips",
            SessionUpdateType::Candidates => "candidates",
            SessionUpdateType::Complete => "complete",
            SessionUpdateType::NeedsInput => "needs_input",
            SessionUpdateType::Cancelled => "cancelled",
        }
    }

    /// Terminal events close the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionUpdateType::Complete | SessionUpdateType::NeedsInput | SessionUpdateType::Cancelled
        )
    }
}

/// Outbound session event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionUpdate {
    /// Refinement chips for the current frame
    Chips {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        chips: Vec<Chip>,
    },

    /// Ranked candidates after a scoring pass
    Candidates {
        candidates: Vec<FilmCandidate>,
        frame: u32,
        confidence: f64,
    },

    /// Film identified
    Complete(IdentificationResult),

    /// Frames exhausted below the threshold
    NeedsInput { message: String },

    /// Session stopped by the caller
    Cancelled { message: String },
}

impl SessionUpdate {
    /// Create a chips update.
    pub fn chips(session_id: SessionId, chips: Vec<Chip>) -> Self {
        SessionUpdate::Chips { session_id, chips }
    }

    /// Create a candidates update.
    pub fn candidates(candidates: Vec<FilmCandidate>, frame: u32, confidence: f64) -> Self {
        SessionUpdate::Candidates {
            candidates,
            frame,
            confidence,
        }
    }

    /// Create a needs-input update with the standard message.
    pub fn needs_input() -> Self {
        SessionUpdate::NeedsInput {
            message: NEEDS_INPUT_MESSAGE.to_string(),
        }
    }

    /// Create a cancelled update with the standard message.
    pub fn cancelled() -> Self {
        SessionUpdate::Cancelled {
            message: CANCELLED_MESSAGE.to_string(),
        }
    }

    /// Get the update type.
    pub fn update_type(&self) -> SessionUpdateType {
        match self {
            SessionUpdate::Chips { .. } => SessionUpdateType::Chips,
            SessionUpdate::Candidates { .. } => SessionUpdateType::Candidates,
            SessionUpdate::Complete(_) => SessionUpdateType::Complete,
            SessionUpdate::NeedsInput { .. } => SessionUpdateType::NeedsInput,
            SessionUpdate::Cancelled { .. } => SessionUpdateType::Cancelled,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.update_type().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::film::FilmDetails;
    use crate::ids::VideoId;

    #[test]
    fn test_chips_serialization() {
        let msg = SessionUpdate::chips(SessionId::from("s1"), vec![]);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"chips\""));
        assert!(json.contains("\"sessionId\":\"s1\""));
    }

    #[test]
    fn test_complete_serialization() {
        let msg = SessionUpdate::Complete(IdentificationResult {
            session_id: SessionId::from("s1"),
            video_id: VideoId::from("v1"),
            film_details: FilmDetails {
                id: 105,
                title: "Back to the Future".to_string(),
                ..FilmDetails::default()
            },
            confidence: 0.95,
            frames_used: 3,
            time_elapsed: 1200,
            poster_url: None,
        });

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"complete\""));
        assert!(json.contains("\"framesUsed\":3"));
        assert!(json.contains("\"filmDetails\""));
        assert!(!json.contains("posterUrl"));
        assert!(msg.is_terminal());
    }

    #[test]
    fn test_update_types() {
        assert_eq!(SessionUpdate::needs_input().update_type().as_str(), "needs_input");
        assert!(SessionUpdate::cancelled().is_terminal());
        assert!(!SessionUpdate::candidates(vec![], 0, 0.0).is_terminal());
    }
}
