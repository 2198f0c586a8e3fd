//! Offline frame pre-analysis.
//!
//! Usage: `reelid-analyze <video_id> [count]`

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use reelid_engine::{init_tracing, EngineConfig, FrameAnalyzer};
use reelid_media::FfmpegFrameExtractor;
use reelid_models::VideoId;
use reelid_providers::{ProviderConfig, VisionService};
use reelid_storage::{JsonFrameAnalysisStore, LocalVideoCatalog, StorageConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("reelid=info");

    let mut args = std::env::args().skip(1);
    let video_id = args
        .next()
        .map(VideoId::from)
        .context("usage: reelid-analyze <video_id> [count]")?;

    let engine = EngineConfig::from_env();
    let count = match args.next() {
        Some(raw) => raw
            .parse::<u32>()
            .with_context(|| format!("invalid frame count {raw:?}"))?,
        None => engine.max_frames,
    };

    let storage = StorageConfig::from_env();
    let providers = ProviderConfig::from_env();

    let analyzer = FrameAnalyzer::new(
        Arc::new(LocalVideoCatalog::new(&storage.upload_dir)),
        Arc::new(JsonFrameAnalysisStore::new(&storage.analysis_dir)),
        Arc::new(FfmpegFrameExtractor::new()?),
        Arc::new(VisionService::from_config(&providers)?),
        engine.frame_size,
    );

    info!(video_id = %video_id, count, "Pre-analyzing frames");
    let report = analyzer.analyze_video(&video_id, count).await?;

    println!(
        "reelid-analyze: {} analyzed, {} already stored, {} failed",
        report.analyzed, report.skipped, report.failed
    );
    Ok(())
}
