use super::UploadClient;
use crate::config::SftpConfig;
use crate::services::media::DownloadedAudio;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use ssh2::Session;
use std::fs::File;
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use tracing::info;

/// Copies files to a remote directory over SFTP with password authentication.
pub struct SftpUploader {
    config: SftpConfig,
}

impl SftpUploader {
    pub fn new(config: SftpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl UploadClient for SftpUploader {
    fn display_name(&self) -> &'static str {
        "SFTP"
    }

    async fn upload(&self, audio: &DownloadedAudio) -> Result<()> {
        let config = self.config.clone();
        let local = audio.path().to_path_buf();
        let remote = remote_path(&config.remote_dir, audio.upload_name());

        // libssh2 is blocking
        let bytes = tokio::task::spawn_blocking(move || transfer(&config, &local, &remote))
            .await
            .context("SFTP transfer task failed")??;

        info!(
            "📦 Uploaded '{}' ({} bytes) to {}:{}",
            audio.upload_name(),
            bytes,
            self.config.host,
            self.config.port
        );
        Ok(())
    }
}

fn remote_path(remote_dir: &str, file_name: &str) -> PathBuf {
    Path::new(remote_dir).join(file_name)
}

fn transfer(config: &SftpConfig, local: &Path, remote: &Path) -> Result<u64> {
    let tcp = TcpStream::connect((config.host.as_str(), config.port)).with_context(|| {
        format!("Failed to connect to SFTP host {}:{}", config.host, config.port)
    })?;

    let mut session = Session::new().context("Failed to create SSH session")?;
    session.set_tcp_stream(tcp);
    session.handshake().context("SSH handshake failed")?;
    session
        .userauth_password(&config.user, &config.password)
        .with_context(|| format!("SSH authentication failed for user {}", config.user))?;
    if !session.authenticated() {
        bail!("SSH authentication failed for user {}", config.user);
    }

    let sftp = session.sftp().context("Failed to open SFTP channel")?;
    let mut source =
        File::open(local).with_context(|| format!("Failed to open {}", local.display()))?;
    let mut target = sftp
        .create(remote)
        .with_context(|| format!("Failed to create remote file {}", remote.display()))?;
    let bytes = std::io::copy(&mut source, &mut target)
        .with_context(|| format!("Failed to write remote file {}", remote.display()))?;

    drop(target);
    drop(sftp);
    let _ = session.disconnect(None, "upload complete", None);

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_path() {
        assert_eq!(remote_path(".", "Song.mp3"), PathBuf::from("./Song.mp3"));
        assert_eq!(
            remote_path("/srv/music", "Song.mp3"),
            PathBuf::from("/srv/music/Song.mp3")
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_fails_before_transfer() {
        // Grab a free port and release it so nothing is listening there
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let uploader = SftpUploader::new(SftpConfig {
            host: "127.0.0.1".to_string(),
            port,
            user: "radio".to_string(),
            password: "secret".to_string(),
            remote_dir: ".".to_string(),
        });

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("audio.mp3"), b"ID3").unwrap();
        let audio = DownloadedAudio::new(dir, "audio.mp3", "Song.mp3".to_string());

        let err = uploader.upload(&audio).await.unwrap_err();
        assert!(err.to_string().contains("Failed to connect to SFTP host"));
    }
}
