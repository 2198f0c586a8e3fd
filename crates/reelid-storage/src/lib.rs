//! Video lookup and frame analysis persistence for ReelID.
//!
//! This crate provides:
//! - [`VideoLookup`]: resolve an uploaded video id to a file on disk
//! - [`FrameAnalysisStore`]: per-video frame analyses keyed by frame number
//! - Local implementations of both, plus an in-memory store

pub mod analyses;
pub mod config;
pub mod error;
pub mod videos;

pub use analyses::{
    FrameAnalysisStore, JsonFrameAnalysisStore, MemoryFrameAnalysisStore, StoredFrameAnalysis,
};
pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use videos::{LocalVideoCatalog, VideoLookup, VideoRecord};
