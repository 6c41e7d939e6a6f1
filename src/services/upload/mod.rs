use crate::services::media::DownloadedAudio;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub mod azuracast;
pub mod sftp;

pub use azuracast::{AzuraCastClient, StationError};
pub use sftp::SftpUploader;

/// Pushes a transcoded file to the remote media library.
#[async_trait]
pub trait UploadClient: Send + Sync {
    /// Human-readable backend name used in logs and error messages
    fn display_name(&self) -> &'static str;

    /// Upload `audio` under its upload name. The caller keeps ownership; the
    /// local copy is removed when the caller drops it.
    async fn upload(&self, audio: &DownloadedAudio) -> Result<()>;
}

/// Files an uploaded track into a playlist.
#[async_trait]
pub trait PlaylistRegistrar: Send + Sync {
    async fn add_to_playlist(&self, file_name: &str, playlist: &str) -> Result<()>;
}

/// Read-only queries against the station manager.
///
/// Both calls return the backend's JSON untouched; callers check its shape.
#[async_trait]
pub trait StationLibrary: Send + Sync {
    async fn list_files(&self) -> Result<Value, StationError>;

    async fn list_playlists(&self) -> Result<Value, StationError>;
}
