use crate::utils::validation::audio_file_name;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

/// Codec produced by the transcoding step.
pub const AUDIO_FORMAT: &str = "mp3";
/// Target bitrate handed to the audio extractor.
pub const AUDIO_QUALITY: &str = "192K";
/// Best audio-only stream, falling back to the best muxed stream.
pub const FORMAT_SELECTOR: &str = "bestaudio/best";

/// A transcoded audio file waiting to be uploaded.
///
/// The file lives in its own scratch directory, which is deleted when this
/// value is dropped. Every exit path of the pipeline therefore cleans up.
#[derive(Debug)]
pub struct DownloadedAudio {
    dir: TempDir,
    path: PathBuf,
    upload_name: String,
}

impl DownloadedAudio {
    /// `file_name` is relative to `dir`.
    pub fn new(dir: TempDir, file_name: &str, upload_name: String) -> Self {
        let path = dir.path().join(file_name);
        Self {
            dir,
            path,
            upload_name,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remote file name, derived from the media title.
    pub fn upload_name(&self) -> &str {
        &self.upload_name
    }

    pub fn scratch_dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Resolves a media URL to a local audio file.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<DownloadedAudio>;
}

#[derive(Debug, Deserialize)]
struct MediaInfo {
    id: Option<String>,
    title: Option<String>,
}

/// Fetcher backed by the `yt-dlp` CLI, which drives `ffmpeg` for transcoding.
pub struct YtDlpFetcher {
    binary: String,
    work_dir: PathBuf,
}

impl YtDlpFetcher {
    pub fn new(binary: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Installed yt-dlp version, or `None` when the binary cannot be run.
    pub async fn version(&self) -> Option<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .ok()?;
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn probe(&self, url: &str) -> Result<MediaInfo> {
        let output = Command::new(&self.binary)
            .args([
                "--dump-single-json",
                "--skip-download",
                "--no-playlist",
                "--no-warnings",
                "--",
            ])
            .arg(url)
            .output()
            .await
            .with_context(|| {
                format!("failed to spawn {} (is it installed and on $PATH?)", self.binary)
            })?;

        if !output.status.success() {
            bail!(
                "yt-dlp metadata lookup failed for {} ({}): {}",
                url,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        serde_json::from_slice(&output.stdout).context("parsing yt-dlp metadata response")
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str) -> Result<DownloadedAudio> {
        let info = self.probe(url).await?;
        let upload_name = audio_file_name(info.title.as_deref(), info.id.as_deref(), AUDIO_FORMAT);

        let dir = tempfile::Builder::new()
            .prefix("firecast-")
            .tempdir_in(&self.work_dir)
            .with_context(|| {
                format!("creating scratch directory in {}", self.work_dir.display())
            })?;
        let file_name = format!("audio.{}", AUDIO_FORMAT);
        let template = dir.path().join("audio.%(ext)s");

        debug!("Downloading {} into {}", url, dir.path().display());

        let output = Command::new(&self.binary)
            .args([
                "--no-playlist",
                "--no-progress",
                "--no-warnings",
                "-f",
                FORMAT_SELECTOR,
                "--extract-audio",
                "--audio-format",
                AUDIO_FORMAT,
                "--audio-quality",
                AUDIO_QUALITY,
                "-o",
            ])
            .arg(&template)
            .arg("--")
            .arg(url)
            .output()
            .await
            .with_context(|| {
                format!("failed to spawn {} (is it installed and on $PATH?)", self.binary)
            })?;

        if !output.status.success() {
            bail!(
                "yt-dlp download failed for {} ({}): {}",
                url,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let audio = DownloadedAudio::new(dir, &file_name, upload_name);
        if !tokio::fs::try_exists(audio.path()).await.unwrap_or(false) {
            bail!("yt-dlp finished but produced no {} file for {}", AUDIO_FORMAT, url);
        }

        info!("🎵 Transcoded {} as '{}'", url, audio.upload_name());
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downloaded_audio_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("audio.mp3"), b"ID3").unwrap();

        let audio = DownloadedAudio::new(dir, "audio.mp3", "Song.mp3".to_string());
        let path = audio.path().to_path_buf();
        let scratch = audio.scratch_dir().to_path_buf();
        assert!(path.exists());
        assert_eq!(audio.upload_name(), "Song.mp3");

        drop(audio);
        assert!(!path.exists());
        assert!(!scratch.exists());
    }

    #[tokio::test]
    async fn test_missing_binary_fails() {
        let work = tempfile::tempdir().unwrap();
        let fetcher = YtDlpFetcher::new("firecast-no-such-binary", work.path());

        assert!(fetcher.version().await.is_none());
        let err = fetcher.fetch("https://example.com/watch?v=1").await.unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }

    #[test]
    fn test_media_info_tolerates_extra_fields() {
        let info: MediaInfo =
            serde_json::from_str(r#"{"id":"abc","title":"Song","duration":12.5,"formats":[]}"#)
                .unwrap();
        assert_eq!(info.id.as_deref(), Some("abc"));
        assert_eq!(info.title.as_deref(), Some("Song"));
    }
}
