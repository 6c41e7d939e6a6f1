use crate::config::AppConfig;
use crate::services::media::YtDlpFetcher;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn setup_fetcher(config: &AppConfig) -> Result<Arc<YtDlpFetcher>> {
    tokio::fs::create_dir_all(&config.work_dir)
        .await
        .with_context(|| format!("creating work directory {}", config.work_dir.display()))?;

    let fetcher = YtDlpFetcher::new(config.ytdlp_path.clone(), config.work_dir.clone());

    // Warm-up check only; ingest requests report the failure themselves
    match fetcher.version().await {
        Some(version) => info!("🎬 yt-dlp {} ready (work dir: {})", version, config.work_dir.display()),
        None => warn!(
            "⚠️  '{}' is not runnable! Ingest requests will fail until yt-dlp and ffmpeg are installed.",
            config.ytdlp_path
        ),
    }

    Ok(Arc::new(fetcher))
}
