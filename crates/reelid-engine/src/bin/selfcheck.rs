use std::path::Path;

use reelid_media::{check_ffmpeg, check_ffprobe};
use reelid_providers::ProviderConfig;
use reelid_storage::StorageConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let storage = StorageConfig::from_env();
    let providers = ProviderConfig::from_env();

    println!(
        "reelid-selfcheck: starting with upload_dir={} analysis_dir={}",
        storage.upload_dir.display(),
        storage.analysis_dir.display()
    );

    ensure_dir(&storage.upload_dir).await?;
    ensure_dir(&storage.analysis_dir).await?;

    let ffmpeg = check_ffmpeg()?;
    let ffprobe = check_ffprobe()?;
    println!(
        "reelid-selfcheck: ffmpeg={} ffprobe={}",
        ffmpeg.display(),
        ffprobe.display()
    );

    let configured = providers.configured_providers();
    println!("reelid-selfcheck: providers={}", configured.join(","));
    ensure_providers(&configured)?;

    println!("reelid-selfcheck: ok");
    Ok(())
}

async fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {}", path.display(), e))
}

/// Sessions need a vision provider, web search and the film catalog.
fn ensure_providers(configured: &[&str]) -> anyhow::Result<()> {
    if !configured.iter().any(|p| *p == "openai" || *p == "google_vision") {
        return Err(anyhow::anyhow!(
            "no vision provider configured (OPENAI_API_KEY or GOOGLE_VISION_API_KEY)"
        ));
    }
    for (provider, hint) in [
        ("google_search", "GOOGLE_SEARCH_API_KEY and GOOGLE_CSE_ID"),
        ("tmdb", "TMDB_API_KEY"),
    ] {
        if !configured.contains(&provider) {
            return Err(anyhow::anyhow!("{} not configured ({})", provider, hint));
        }
    }
    Ok(())
}
