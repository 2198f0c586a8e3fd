//! Film identification session engine.
//!
//! A session repeatedly pulls a frame from an uploaded clip, analyzes it,
//! searches the web for matching films, scores the hits and streams ranked
//! candidates to its consumer until one clears the confidence threshold,
//! the frames run out, or the session is cancelled. User feedback on chips
//! re-triggers a search immediately.

pub mod analyzer;
pub mod candidates;
pub mod chips;
pub mod config;
pub mod error;
pub mod keywords;
pub mod logging;
pub mod manager;
pub mod metrics;
pub mod outbox;
pub mod runner;
pub mod scorer;
pub mod session;

pub use analyzer::{analyze_frame, AnalyzeReport, FrameAnalyzer};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use logging::{init_tracing, SessionLogger};
pub use manager::{EngineDeps, SessionManager};
pub use session::{IdentificationSession, SessionEvents};
