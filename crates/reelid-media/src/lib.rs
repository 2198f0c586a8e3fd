//! Frame extraction for ReelID.
//!
//! This crate provides:
//! - The [`FrameSource`] contract the identification engine depends on
//! - An FFmpeg command builder
//! - FFprobe duration probing
//! - [`FfmpegFrameExtractor`], evenly spaced JPEG frame grabs

pub mod command;
pub mod error;
pub mod frames;
pub mod probe;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand};
pub use error::{MediaError, MediaResult};
pub use frames::{frame_timestamps, FfmpegFrameExtractor, FrameSource};
pub use probe::probe_duration;
