//! Evenly spaced frame extraction.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::command::{check_ffmpeg, FfmpegCommand};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_duration;

/// Source of still frames for a stored video.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Extract `count` frames evenly spaced over the video, each a
    /// `size`x`size` JPEG, in timeline order.
    ///
    /// Frames that fail individually are skipped, so the result may be
    /// shorter than `count`; it is never empty.
    async fn extract_frames(&self, path: &Path, count: u32, size: u32) -> MediaResult<Vec<Vec<u8>>>;
}

/// Timestamps for `count` frames spread over `duration` seconds, excluding
/// the very start and end of the clip.
pub fn frame_timestamps(duration: f64, count: u32) -> Vec<f64> {
    let interval = duration / f64::from(count + 1);
    (1..=count).map(|i| interval * f64::from(i)).collect()
}

/// Scale to fit inside a `size` square and letterbox the remainder.
fn square_filter(size: u32) -> String {
    format!(
        "scale='min({size},iw)':'min({size},ih)':force_original_aspect_ratio=decrease,\
pad={size}:{size}:(ow-iw)/2:(oh-ih)/2:black"
    )
}

/// [`FrameSource`] backed by the FFmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    jpeg_quality: u8,
}

impl FfmpegFrameExtractor {
    /// Create an extractor, failing early if FFmpeg is not installed.
    pub fn new() -> MediaResult<Self> {
        let ffmpeg = check_ffmpeg()?;
        info!("Found ffmpeg at {}", ffmpeg.display());
        Ok(Self { jpeg_quality: 2 })
    }

    /// Override the JPEG quality (2 is best, 31 worst).
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(2, 31);
        self
    }

    async fn extract_single(
        &self,
        video: &Path,
        output: &Path,
        timestamp: f64,
        size: u32,
    ) -> MediaResult<Vec<u8>> {
        FfmpegCommand::new(video, output)
            .seek(timestamp)
            .single_frame()
            .video_filter(square_filter(size))
            .jpeg(self.jpeg_quality)
            .run()
            .await?;

        Ok(tokio::fs::read(output).await?)
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameExtractor {
    async fn extract_frames(&self, path: &Path, count: u32, size: u32) -> MediaResult<Vec<Vec<u8>>> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        let duration = probe_duration(path).await?;
        if duration <= 0.0 {
            return Err(MediaError::invalid_video(format!(
                "invalid video duration: {duration}"
            )));
        }
        debug!("Video {} lasts {:.2}s", path.display(), duration);

        let workdir = tempfile::Builder::new().prefix("reelid-frames").tempdir()?;
        let mut frames = Vec::with_capacity(count as usize);

        for (i, timestamp) in frame_timestamps(duration, count).into_iter().enumerate() {
            let output = workdir.path().join(format!("frame_{i:03}.jpg"));
            match self.extract_single(path, &output, timestamp, size).await {
                Ok(bytes) => frames.push(bytes),
                Err(e) => warn!(
                    "Failed to extract frame {} at {:.2}s from {}: {}",
                    i + 1,
                    timestamp,
                    path.display(),
                    e
                ),
            }
        }

        if frames.is_empty() {
            return Err(MediaError::NoFrames { attempted: count });
        }

        debug!("Extracted {}/{} frames", frames.len(), count);
        Ok(frames)
    }
}
