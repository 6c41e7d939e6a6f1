use super::{PlaylistRegistrar, StationLibrary, UploadClient};
use crate::config::AzuraCastConfig;
use crate::services::media::DownloadedAudio;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, Response};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;
use url::Url;

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Error)]
pub enum StationError {
    #[error("AzuraCast request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{context}: {status} {body}")]
    Status {
        context: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to parse JSON response: {0}")]
    Decode(String),

    #[error("Failed to read local file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid AzuraCast URL: {0}")]
    InvalidUrl(String),
}

/// HTTP client for the AzuraCast station-manager API.
pub struct AzuraCastClient {
    http: Client,
    base_url: Url,
    api_key: String,
    station_id: String,
}

impl AzuraCastClient {
    pub fn new(base_url: Url, api_key: impl Into<String>, station_id: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            api_key: api_key.into(),
            station_id: station_id.into(),
        }
    }

    pub fn from_config(config: &AzuraCastConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.api_key.clone(),
            config.station_id.clone(),
        )
    }

    /// `{base}/api/station/{id}/{segments...}` with every segment escaped.
    fn station_url(&self, segments: &[&str]) -> Result<Url, StationError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StationError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "station", self.station_id.as_str()])
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, segments: &[&str]) -> Result<Value, StationError> {
        let url = self.station_url(segments)?;
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let response = ensure_success(response, "AzuraCast API error").await?;

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| StationError::Decode(e.to_string()))
    }

    /// POST `{path, file}` with the content base64-encoded.
    pub async fn upload_bytes(&self, file_name: &str, content: &[u8]) -> Result<(), StationError> {
        let url = self.station_url(&["files"])?;
        let body = json!({
            "path": file_name,
            "file": STANDARD.encode(content),
        });

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;
        ensure_success(response, "AzuraCast API upload error").await?;
        Ok(())
    }

    pub async fn import_to_playlist(&self, file_name: &str, playlist: &str) -> Result<(), StationError> {
        let url = self.station_url(&["playlist", playlist, "import"])?;
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "path": file_name }))
            .send()
            .await?;
        ensure_success(response, "AzuraCast API error").await?;
        Ok(())
    }
}

async fn ensure_success(response: Response, context: &'static str) -> Result<Response, StationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StationError::Status {
        context,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl UploadClient for AzuraCastClient {
    fn display_name(&self) -> &'static str {
        "AzuraCast"
    }

    async fn upload(&self, audio: &DownloadedAudio) -> anyhow::Result<()> {
        let content = tokio::fs::read(audio.path()).await.map_err(StationError::from)?;
        self.upload_bytes(audio.upload_name(), &content).await?;
        info!("☁️  Uploaded '{}' to AzuraCast", audio.upload_name());
        Ok(())
    }
}

#[async_trait]
impl PlaylistRegistrar for AzuraCastClient {
    async fn add_to_playlist(&self, file_name: &str, playlist: &str) -> anyhow::Result<()> {
        self.import_to_playlist(file_name, playlist).await?;
        info!("📋 Added '{}' to playlist {}", file_name, playlist);
        Ok(())
    }
}

#[async_trait]
impl StationLibrary for AzuraCastClient {
    async fn list_files(&self) -> Result<Value, StationError> {
        self.get_json(&["files"]).await
    }

    async fn list_playlists(&self) -> Result<Value, StationError> {
        self.get_json(&["playlists"]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> AzuraCastClient {
        AzuraCastClient::new(Url::parse(base).unwrap(), "key", "1")
    }

    #[test]
    fn test_station_url() {
        let url = client("https://radio.example.com").station_url(&["files"]).unwrap();
        assert_eq!(url.as_str(), "https://radio.example.com/api/station/1/files");

        let url = client("http://127.0.0.1:8080/azuracast/")
            .station_url(&["playlist", "Late Night", "import"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/azuracast/api/station/1/playlist/Late%20Night/import"
        );
    }

    #[test]
    fn test_status_error_message() {
        let err = StationError::Status {
            context: "AzuraCast API upload error",
            status: 413,
            body: "too large".to_string(),
        };
        assert_eq!(err.to_string(), "AzuraCast API upload error: 413 too large");
    }
}
