//! Frame analysis persistence.
//!
//! Analyses are keyed by `(video_id, frame_number)` and writes are upserts,
//! so re-analyzing a frame replaces the previous record.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use reelid_models::{FrameAnalysis, VideoId};

use crate::error::{StorageError, StorageResult};
use crate::videos::validate_id;

/// A persisted analysis with its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFrameAnalysis {
    pub video_id: VideoId,
    pub frame_number: u32,
    pub analysis: FrameAnalysis,
    pub stored_at: DateTime<Utc>,
}

#[async_trait]
pub trait FrameAnalysisStore: Send + Sync {
    /// All analyses of a video, ordered by frame number.
    async fn get_by_video(&self, video_id: &VideoId) -> StorageResult<Vec<StoredFrameAnalysis>>;

    /// Insert or replace the analysis of one frame.
    async fn upsert(
        &self,
        video_id: &VideoId,
        frame_number: u32,
        analysis: &FrameAnalysis,
    ) -> StorageResult<()>;
}

/// One JSON document per frame under `<root>/<video_id>/frame_NNNN.json`.
#[derive(Debug, Clone)]
pub struct JsonFrameAnalysisStore {
    root: PathBuf,
}

impl JsonFrameAnalysisStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn video_dir(&self, video_id: &VideoId) -> StorageResult<PathBuf> {
        validate_id(video_id.as_str())?;
        Ok(self.root.join(video_id.as_str()))
    }

    fn frame_file(dir: &Path, frame_number: u32) -> PathBuf {
        dir.join(format!("frame_{frame_number:04}.json"))
    }
}

#[async_trait]
impl FrameAnalysisStore for JsonFrameAnalysisStore {
    async fn get_by_video(&self, video_id: &VideoId) -> StorageResult<Vec<StoredFrameAnalysis>> {
        let dir = self.video_dir(video_id)?;

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let bytes = tokio::fs::read(&path).await?;
            let record: StoredFrameAnalysis =
                serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            records.push(record);
        }

        records.sort_by_key(|r| r.frame_number);
        debug!(video_id = %video_id, count = records.len(), "Loaded frame analyses");
        Ok(records)
    }

    async fn upsert(
        &self,
        video_id: &VideoId,
        frame_number: u32,
        analysis: &FrameAnalysis,
    ) -> StorageResult<()> {
        let dir = self.video_dir(video_id)?;
        tokio::fs::create_dir_all(&dir).await?;

        let record = StoredFrameAnalysis {
            video_id: video_id.clone(),
            frame_number,
            analysis: analysis.clone(),
            stored_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&record)?;

        // Each writer stages its own file, then renames it over the target,
        // so concurrent upserts of one frame never interleave bytes.
        let target = Self::frame_file(&dir, frame_number);
        tokio::task::spawn_blocking(move || write_atomically(&dir, &target, &json))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        Ok(())
    }
}

fn write_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> StorageResult<()> {
    let mut staging = tempfile::Builder::new()
        .prefix(".frame")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    staging.write_all(bytes)?;
    staging.as_file().sync_all()?;
    staging.persist(target).map_err(|e| {
        warn!("Failed to move analysis into {}: {}", target.display(), e.error);
        StorageError::Io(e.error)
    })?;
    Ok(())
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryFrameAnalysisStore {
    records: RwLock<HashMap<VideoId, BTreeMap<u32, StoredFrameAnalysis>>>,
}

impl MemoryFrameAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored frames for a video.
    pub async fn count(&self, video_id: &VideoId) -> usize {
        self.records
            .read()
            .await
            .get(video_id)
            .map_or(0, |frames| frames.len())
    }
}

#[async_trait]
impl FrameAnalysisStore for MemoryFrameAnalysisStore {
    async fn get_by_video(&self, video_id: &VideoId) -> StorageResult<Vec<StoredFrameAnalysis>> {
        Ok(self
            .records
            .read()
            .await
            .get(video_id)
            .map(|frames| frames.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert(
        &self,
        video_id: &VideoId,
        frame_number: u32,
        analysis: &FrameAnalysis,
    ) -> StorageResult<()> {
        let record = StoredFrameAnalysis {
            video_id: video_id.clone(),
            frame_number,
            analysis: analysis.clone(),
            stored_at: Utc::now(),
        };
        self.records
            .write()
            .await
            .entry(video_id.clone())
            .or_default()
            .insert(frame_number, record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelid_models::{BoundingBox, FaceDetection};

    fn analysis(caption: &str) -> FrameAnalysis {
        FrameAnalysis {
            faces: vec![FaceDetection {
                bounding_box: BoundingBox { x: 1, y: 2, width: 3, height: 4 },
                confidence: 0.9,
            }],
            ..FrameAnalysis::with_caption(caption)
        }
    }

    #[tokio::test]
    async fn test_json_store_orders_by_frame_number() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFrameAnalysisStore::new(dir.path());
        let video = VideoId::from("v1");

        store.upsert(&video, 2, &analysis("third")).await.unwrap();
        store.upsert(&video, 0, &analysis("first")).await.unwrap();
        store.upsert(&video, 1, &analysis("second")).await.unwrap();

        let records = store.get_by_video(&video).await.unwrap();
        let captions: Vec<_> = records.iter().map(|r| r.analysis.caption.as_str()).collect();
        assert_eq!(captions, vec!["first", "second", "third"]);
        assert_eq!(records[0].analysis.faces.len(), 1);
    }

    #[tokio::test]
    async fn test_json_store_upsert_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFrameAnalysisStore::new(dir.path());
        let video = VideoId::from("v1");

        store.upsert(&video, 0, &analysis("old")).await.unwrap();
        store.upsert(&video, 0, &analysis("new")).await.unwrap();

        let records = store.get_by_video(&video).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].analysis.caption, "new");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_json_store_concurrent_upserts_of_one_frame() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(JsonFrameAnalysisStore::new(dir.path()));
        let video = VideoId::from("v1");

        for round in 0..50 {
            let writers: Vec<_> = (0..4)
                .map(|writer| {
                    let store = store.clone();
                    let video = video.clone();
                    // captions of different lengths expose interleaved writes
                    let caption = "x".repeat(1 + writer * 200 + round);
                    tokio::spawn(async move { store.upsert(&video, 0, &analysis(&caption)).await })
                })
                .collect();
            for writer in writers {
                writer.await.unwrap().unwrap();
            }

            let records = store.get_by_video(&video).await.unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].frame_number, 0);
        }

        let leftovers = std::fs::read_dir(dir.path().join("v1")).unwrap().count();
        assert_eq!(leftovers, 1, "staging files must not outlive a write");
    }

    #[tokio::test]
    async fn test_json_store_unknown_video_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFrameAnalysisStore::new(dir.path());
        assert!(store.get_by_video(&VideoId::from("none")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_store_reports_corrupt_records() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("v1")).unwrap();
        std::fs::write(dir.path().join("v1/frame_0000.json"), b"{not json").unwrap();

        let store = JsonFrameAnalysisStore::new(dir.path());
        let err = store.get_by_video(&VideoId::from("v1")).await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_memory_store_upsert() {
        let store = MemoryFrameAnalysisStore::new();
        let video = VideoId::from("v1");

        store.upsert(&video, 3, &analysis("a")).await.unwrap();
        store.upsert(&video, 1, &analysis("b")).await.unwrap();
        store.upsert(&video, 3, &analysis("c")).await.unwrap();

        let records = store.get_by_video(&video).await.unwrap();
        assert_eq!(store.count(&video).await, 2);
        assert_eq!(records[0].frame_number, 1);
        assert_eq!(records[1].analysis.caption, "c");
    }
}
