//! Shared data models for the ReelID identification engine.
//!
//! This crate provides Serde-serializable types for:
//! - Session and video identifiers
//! - Frame analyses produced by vision providers
//! - Web search results and film catalog details
//! - Film candidates, refinement chips and session status
//! - Session update events streamed to clients

pub mod analysis;
pub mod candidate;
pub mod film;
pub mod ids;
pub mod search;
pub mod session;
pub mod update;

// Re-export common types
pub use analysis::{BoundingBox, ColorInfo, FaceDetection, FrameAnalysis, Label};
pub use candidate::{Chip, ChipKind, FilmCandidate};
pub use film::{CastMember, Credits, CrewMember, FilmDetails, FilmSummary, Genre};
pub use ids::{SessionId, VideoId};
pub use search::SearchResult;
pub use session::{FeedbackMap, IdentificationResult, SessionSnapshot, SessionStatus};
pub use update::{SessionUpdate, SessionUpdateType, CANCELLED_MESSAGE, NEEDS_INPUT_MESSAGE};
