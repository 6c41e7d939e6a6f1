use crate::services::media::MediaFetcher;
use crate::services::upload::{PlaylistRegistrar, UploadClient};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// A validated ingest request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    pub video_url: String,
    pub playlist: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Name the file was uploaded under
    pub file_name: String,
    /// Whether the playlist registration step ran
    pub registered: bool,
}

/// Runs download/transcode → upload → optional playlist registration.
///
/// Any failure aborts the remaining steps. The local audio file is removed
/// whichever way the upload step ends.
pub struct IngestService {
    fetcher: Arc<dyn MediaFetcher>,
    uploader: Arc<dyn UploadClient>,
    registrar: Option<Arc<dyn PlaylistRegistrar>>,
}

impl IngestService {
    pub fn new(fetcher: Arc<dyn MediaFetcher>, uploader: Arc<dyn UploadClient>) -> Self {
        Self {
            fetcher,
            uploader,
            registrar: None,
        }
    }

    pub fn with_registrar(mut self, registrar: Option<Arc<dyn PlaylistRegistrar>>) -> Self {
        self.registrar = registrar;
        self
    }

    pub fn registration_enabled(&self) -> bool {
        self.registrar.is_some()
    }

    pub async fn ingest(&self, request: &IngestRequest) -> Result<IngestOutcome> {
        let audio = self
            .fetcher
            .fetch(&request.video_url)
            .await
            .with_context(|| format!("Failed to download {}", request.video_url))?;
        let file_name = audio.upload_name().to_string();

        let uploaded = self
            .uploader
            .upload(&audio)
            .await
            .with_context(|| {
                format!(
                    "Failed to upload '{}' to {}",
                    file_name,
                    self.uploader.display_name()
                )
            });
        drop(audio);
        uploaded?;

        let mut registered = false;
        if let (Some(registrar), Some(playlist)) = (&self.registrar, request.playlist.as_deref()) {
            registrar
                .add_to_playlist(&file_name, playlist)
                .await
                .with_context(|| format!("Failed to add '{}' to playlist {}", file_name, playlist))?;
            registered = true;
        }

        info!(
            file = %file_name,
            backend = self.uploader.display_name(),
            registered,
            "✅ Ingest complete"
        );

        Ok(IngestOutcome {
            file_name,
            registered,
        })
    }
}
