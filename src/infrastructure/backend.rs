use crate::config::{AppConfig, BackendConfig};
use crate::services::upload::{
    AzuraCastClient, PlaylistRegistrar, SftpUploader, StationLibrary, UploadClient,
};
use std::sync::Arc;
use tracing::info;

/// Backend-facing services for the configured deployment variant.
pub struct Backend {
    pub uploader: Arc<dyn UploadClient>,
    pub registrar: Option<Arc<dyn PlaylistRegistrar>>,
    pub station: Option<Arc<dyn StationLibrary>>,
}

pub fn setup_backend(config: &AppConfig) -> Backend {
    match &config.backend {
        BackendConfig::AzuraCast(azura) => {
            info!(
                "📻 AzuraCast backend: {} (station {})",
                azura.base_url, azura.station_id
            );
            let client = Arc::new(AzuraCastClient::from_config(azura));

            let registrar: Option<Arc<dyn PlaylistRegistrar>> = if azura.playlist_registration {
                info!("📋 Playlist registration enabled");
                Some(client.clone())
            } else {
                None
            };

            Backend {
                uploader: client.clone(),
                registrar,
                station: Some(client),
            }
        }
        BackendConfig::Sftp(sftp) => {
            info!(
                "📦 SFTP backend: {}@{}:{} (dir {})",
                sftp.user, sftp.host, sftp.port, sftp.remote_dir
            );
            Backend {
                uploader: Arc::new(SftpUploader::new(sftp.clone())),
                registrar: None,
                station: None,
            }
        }
    }
}
