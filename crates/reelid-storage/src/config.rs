//! Storage configuration.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding uploaded clips
    pub upload_dir: PathBuf,
    /// Directory holding persisted frame analyses
    pub analysis_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./uploads"),
            analysis_dir: PathBuf::from("./data/analyses"),
        }
    }
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            analysis_dir: std::env::var("ANALYSIS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.analysis_dir),
        }
    }
}
