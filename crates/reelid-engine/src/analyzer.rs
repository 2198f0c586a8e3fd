//! Frame analysis, shared by the identification loop and offline
//! pre-analysis.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use reelid_media::FrameSource;
use reelid_models::{FrameAnalysis, VideoId};
use reelid_providers::VisionProvider;
use reelid_storage::{FrameAnalysisStore, VideoLookup};

use crate::error::{EngineError, EngineResult};
use crate::metrics;

/// Extract and analyze frame `frame_number` (0-based) of a clip.
///
/// Asks the source for `frame_number + 1` evenly spaced frames and analyzes
/// the last one, so frame `n` sits at position `n + 1` of the spacing.
pub async fn analyze_frame(
    frames: &dyn FrameSource,
    vision: &dyn VisionProvider,
    path: &Path,
    frame_number: u32,
    frame_size: u32,
) -> EngineResult<FrameAnalysis> {
    let mut images = frames
        .extract_frames(path, frame_number + 1, frame_size)
        .await?;
    let image = images.pop().ok_or(EngineError::NoFrame(frame_number))?;
    Ok(vision.analyze(&image).await?)
}

/// Summary of an offline analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzeReport {
    pub analyzed: u32,
    pub skipped: u32,
    pub failed: u32,
}

/// Pre-computes frame analyses so later sessions skip extraction.
pub struct FrameAnalyzer {
    videos: Arc<dyn VideoLookup>,
    analyses: Arc<dyn FrameAnalysisStore>,
    frames: Arc<dyn FrameSource>,
    vision: Arc<dyn VisionProvider>,
    frame_size: u32,
}

impl FrameAnalyzer {
    pub fn new(
        videos: Arc<dyn VideoLookup>,
        analyses: Arc<dyn FrameAnalysisStore>,
        frames: Arc<dyn FrameSource>,
        vision: Arc<dyn VisionProvider>,
        frame_size: u32,
    ) -> Self {
        Self {
            videos,
            analyses,
            frames,
            vision,
            frame_size,
        }
    }

    /// Analyze frames `0..count` of a video, skipping frames already stored.
    ///
    /// Frames that fail are counted and skipped. Storage errors abort.
    pub async fn analyze_video(&self, video_id: &VideoId, count: u32) -> EngineResult<AnalyzeReport> {
        let video = self
            .videos
            .get_video(video_id)
            .await
            .map_err(EngineError::VideoLookup)?
            .ok_or_else(|| EngineError::VideoNotFound(video_id.clone()))?;
        let path = self.videos.file_path(&video);

        let stored: HashSet<u32> = self
            .analyses
            .get_by_video(video_id)
            .await?
            .into_iter()
            .map(|r| r.frame_number)
            .collect();

        let mut report = AnalyzeReport::default();
        for frame in 0..count {
            if stored.contains(&frame) {
                report.skipped += 1;
                continue;
            }

            match analyze_frame(&*self.frames, &*self.vision, &path, frame, self.frame_size).await {
                Ok(analysis) => {
                    self.analyses.upsert(video_id, frame, &analysis).await?;
                    metrics::record_frame_analyzed(false);
                    info!(video_id = %video_id, frame, confidence = analysis.confidence, "Frame analyzed");
                    report.analyzed += 1;
                }
                Err(e) => {
                    warn!(video_id = %video_id, frame, "Frame analysis failed: {}", e);
                    metrics::record_frame_failure(failure_stage(&e));
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Metric label for a failed frame.
pub(crate) fn failure_stage(error: &EngineError) -> &'static str {
    match error {
        EngineError::Provider(_) => "analyze",
        _ => "extract",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use reelid_media::{MediaError, MediaResult};
    use reelid_providers::{ProviderError, ProviderResult};
    use reelid_storage::{MemoryFrameAnalysisStore, StorageResult, VideoRecord};
    use std::path::PathBuf;

    mock! {
        Frames {}
        #[async_trait]
        impl FrameSource for Frames {
            async fn extract_frames(&self, path: &Path, count: u32, size: u32) -> MediaResult<Vec<Vec<u8>>>;
        }
    }

    mock! {
        Vision {}
        #[async_trait]
        impl VisionProvider for Vision {
            async fn analyze(&self, image: &[u8]) -> ProviderResult<FrameAnalysis>;
        }
    }

    struct OneVideo;

    #[async_trait]
    impl VideoLookup for OneVideo {
        async fn get_video(&self, id: &VideoId) -> StorageResult<Option<VideoRecord>> {
            Ok((id.as_str() == "clip").then(|| VideoRecord {
                id: id.clone(),
                storage_key: "clip.mp4".to_string(),
            }))
        }

        fn file_path(&self, video: &VideoRecord) -> PathBuf {
            PathBuf::from("/uploads").join(&video.storage_key)
        }
    }

    #[tokio::test]
    async fn test_analyze_frame_uses_last_image() {
        let mut frames = MockFrames::new();
        frames
            .expect_extract_frames()
            .withf(|_, count, size| *count == 3 && *size == 512)
            .returning(|_, _, _| Ok(vec![vec![1], vec![2], vec![3]]));

        let mut vision = MockVision::new();
        vision
            .expect_analyze()
            .withf(|image| image.len() == 1 && image[0] == 3)
            .returning(|_| Ok(FrameAnalysis::with_caption("third")));

        let analysis = analyze_frame(&frames, &vision, Path::new("clip.mp4"), 2, 512)
            .await
            .unwrap();
        assert_eq!(analysis.caption, "third");
    }

    #[tokio::test]
    async fn test_analyze_frame_without_images() {
        let mut frames = MockFrames::new();
        frames.expect_extract_frames().returning(|_, _, _| Ok(vec![]));
        let vision = MockVision::new();

        let err = analyze_frame(&frames, &vision, Path::new("clip.mp4"), 0, 512)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NoFrame(0)));
    }

    #[tokio::test]
    async fn test_analyze_video_skips_stored_and_counts_failures() {
        let store = Arc::new(MemoryFrameAnalysisStore::new());
        let video = VideoId::from("clip");
        store
            .upsert(&video, 0, &FrameAnalysis::with_caption("cached"))
            .await
            .unwrap();

        let mut frames = MockFrames::new();
        frames.expect_extract_frames().returning(|_, count, _| {
            if count == 2 {
                Err(MediaError::invalid_video("truncated"))
            } else {
                Ok(vec![vec![0u8]; count as usize])
            }
        });
        let mut vision = MockVision::new();
        vision
            .expect_analyze()
            .returning(|_| Ok(FrameAnalysis::with_caption("fresh")));

        let analyzer = FrameAnalyzer::new(
            Arc::new(OneVideo),
            store.clone(),
            Arc::new(frames),
            Arc::new(vision),
            512,
        );
        let report = analyzer.analyze_video(&video, 3).await.unwrap();

        assert_eq!(
            report,
            AnalyzeReport {
                analyzed: 1,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(store.count(&video).await, 2);
    }

    #[tokio::test]
    async fn test_analyze_unknown_video() {
        let analyzer = FrameAnalyzer::new(
            Arc::new(OneVideo),
            Arc::new(MemoryFrameAnalysisStore::new()),
            Arc::new(MockFrames::new()),
            Arc::new(MockVision::new()),
            512,
        );
        let err = analyzer
            .analyze_video(&VideoId::from("missing"), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::VideoNotFound(_)));
    }

    #[test]
    fn test_failure_stage() {
        let err = EngineError::from(ProviderError::not_configured("vision"));
        assert_eq!(failure_stage(&err), "analyze");
        assert_eq!(failure_stage(&EngineError::NoFrame(1)), "extract");
    }
}
