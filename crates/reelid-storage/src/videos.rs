//! Uploaded video lookup.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use reelid_models::VideoId;

use crate::error::{StorageError, StorageResult};

/// A stored clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub id: VideoId,
    /// Key of the clip within the store, e.g. its file name
    pub storage_key: String,
}

/// Resolves video ids to stored clips.
#[async_trait]
pub trait VideoLookup: Send + Sync {
    /// `Ok(None)` when no video has this id.
    async fn get_video(&self, id: &VideoId) -> StorageResult<Option<VideoRecord>>;

    /// Local path of a stored clip.
    fn file_path(&self, video: &VideoRecord) -> PathBuf;
}

/// Clips stored as `<video_id>.<ext>` in a single upload directory.
#[derive(Debug, Clone)]
pub struct LocalVideoCatalog {
    root: PathBuf,
}

impl LocalVideoCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Ids become file names, so only a conservative charset is accepted.
pub(crate) fn validate_id(id: &str) -> StorageResult<()> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::invalid_id(id))
    }
}

#[async_trait]
impl VideoLookup for LocalVideoCatalog {
    async fn get_video(&self, id: &VideoId) -> StorageResult<Option<VideoRecord>> {
        validate_id(id.as_str())?;

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let stem_matches = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| stem == id.as_str());

            if stem_matches && entry.file_type().await?.is_file() {
                let storage_key = entry.file_name().to_string_lossy().to_string();
                debug!(video_id = %id, storage_key = %storage_key, "Resolved video");
                return Ok(Some(VideoRecord {
                    id: id.clone(),
                    storage_key,
                }));
            }
        }

        Ok(None)
    }

    fn file_path(&self, video: &VideoRecord) -> PathBuf {
        self.root.join(&video.storage_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolves_by_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc-123.mp4"), b"video").unwrap();
        std::fs::write(dir.path().join("other.mov"), b"video").unwrap();

        let catalog = LocalVideoCatalog::new(dir.path());
        let record = catalog
            .get_video(&VideoId::from("abc-123"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.storage_key, "abc-123.mp4");
        assert_eq!(catalog.file_path(&record), dir.path().join("abc-123.mp4"));
    }

    #[tokio::test]
    async fn test_unknown_video() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = LocalVideoCatalog::new(dir.path());
        assert!(catalog.get_video(&VideoId::from("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_upload_dir_is_not_an_error() {
        let catalog = LocalVideoCatalog::new("/nonexistent/reelid/uploads");
        assert!(catalog.get_video(&VideoId::from("a")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = LocalVideoCatalog::new(dir.path());
        let err = catalog
            .get_video(&VideoId::from("../etc/passwd"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidId(_)));
    }
}
