use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Errors raised while assembling [`AppConfig`] at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

const REDACTED: &str = "<redacted>";

/// Station-manager (AzuraCast) connection settings
#[derive(Clone)]
pub struct AzuraCastConfig {
    /// API key sent as `X-API-Key`
    pub api_key: String,

    /// Base URL of the station manager, without trailing slash
    pub base_url: Url,

    /// Station id used in `/api/station/{id}/...` paths (default: "1")
    pub station_id: String,

    /// Register each upload in the requested playlist (default: false)
    pub playlist_registration: bool,
}

impl fmt::Debug for AzuraCastConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzuraCastConfig")
            .field("api_key", &REDACTED)
            .field("base_url", &self.base_url.as_str())
            .field("station_id", &self.station_id)
            .field("playlist_registration", &self.playlist_registration)
            .finish()
    }
}

/// SFTP target settings
#[derive(Clone)]
pub struct SftpConfig {
    pub host: String,

    /// SSH port (default: 22)
    pub port: u16,

    pub user: String,
    pub password: String,

    /// Remote directory receiving uploads (default: ".")
    pub remote_dir: String,
}

impl fmt::Debug for SftpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &REDACTED)
            .field("remote_dir", &self.remote_dir)
            .finish()
    }
}

/// Upload backend for this deployment. The two variants are mutually exclusive.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    AzuraCast(AzuraCastConfig),
    Sftp(SftpConfig),
}

impl BackendConfig {
    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::AzuraCast(_) => "azuracast",
            BackendConfig::Sftp(_) => "sftp",
        }
    }
}

/// Process-wide settings, read once at startup and never reloaded.
#[derive(Clone)]
pub struct AppConfig {
    /// Shared secret expected in the `x-api-key` header
    pub secret: String,

    pub backend: BackendConfig,

    /// Parent directory for per-request scratch directories (default: OS temp dir)
    pub work_dir: PathBuf,

    /// yt-dlp executable (default: "yt-dlp")
    pub ytdlp_path: String,

    /// CORS origins; `*` allows any (default: ["*"])
    pub allowed_origins: Vec<String>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("secret", &REDACTED)
            .field("backend", &self.backend)
            .field("work_dir", &self.work_dir)
            .field("ytdlp_path", &self.ytdlp_path)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Every missing required key is collected before failing, so the error
    /// names all of them at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut reader = EnvReader::new(lookup);

        let secret = reader.required("FIRECAST_SECRET");

        let backend_kind = reader
            .optional("UPLOAD_BACKEND")
            .unwrap_or_else(|| "azuracast".to_string())
            .to_lowercase();

        let backend = match backend_kind.as_str() {
            "azuracast" => {
                let api_key = reader.required("AZURACAST_API_KEY");
                let domain = reader.required("AZURACAST_DOMAIN");
                reader.finish()?;

                BackendConfig::AzuraCast(AzuraCastConfig {
                    api_key,
                    base_url: parse_base_url(&domain)?,
                    station_id: reader
                        .optional("AZURACAST_STATION_ID")
                        .unwrap_or_else(|| "1".to_string()),
                    playlist_registration: reader.flag("PLAYLIST_REGISTRATION", false)?,
                })
            }
            "sftp" => {
                let host = reader.required("SFTP_HOST");
                let user = reader.required("SFTP_USER");
                let password = reader.required("SFTP_PASSWORD");
                reader.finish()?;

                BackendConfig::Sftp(SftpConfig {
                    host,
                    port: reader.parsed("SFTP_PORT", 22)?,
                    user,
                    password,
                    remote_dir: reader
                        .optional("SFTP_REMOTE_DIR")
                        .unwrap_or_else(|| ".".to_string()),
                })
            }
            other => {
                reader.finish()?;
                return Err(ConfigError::Invalid {
                    key: "UPLOAD_BACKEND",
                    reason: format!("expected 'azuracast' or 'sftp', got '{}'", other),
                });
            }
        };

        Ok(Self {
            secret,
            backend,
            work_dir: reader
                .optional("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            ytdlp_path: reader
                .optional("YTDLP_PATH")
                .unwrap_or_else(|| "yt-dlp".to_string()),
            allowed_origins: reader
                .optional("ALLOWED_ORIGINS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| vec!["*".to_string()]),
        })
    }

    /// Only the station-manager variant files uploads into playlists.
    pub fn requires_playlist(&self) -> bool {
        matches!(self.backend, BackendConfig::AzuraCast(_))
    }
}

struct EnvReader<F> {
    lookup: F,
    missing: Vec<String>,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn new(lookup: F) -> Self {
        Self {
            lookup,
            missing: Vec::new(),
        }
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&mut self, key: &str) -> String {
        self.optional(key).unwrap_or_else(|| {
            self.missing.push(key.to_string());
            String::new()
        })
    }

    fn parsed<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.optional(key) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key,
                reason: format!("'{}' is not a valid value", raw),
            }),
            None => Ok(default),
        }
    }

    /// `true`/`false` in any case, or `1`/`0`.
    fn flag(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.optional(key).map(|v| v.to_lowercase()).as_deref() {
            None => Ok(default),
            Some("1") => Ok(true),
            Some("0") => Ok(false),
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key,
                reason: format!("'{}' is not a boolean", raw),
            }),
        }
    }

    fn finish(&mut self) -> Result<(), ConfigError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(std::mem::take(&mut self.missing)))
        }
    }
}

/// Accepts either a bare host name (`radio.example.com`, https assumed) or a
/// full base URL with scheme.
fn parse_base_url(domain: &str) -> Result<Url, ConfigError> {
    let raw = if domain.contains("://") {
        domain.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", domain.trim_end_matches('/'))
    };

    let url = Url::parse(&raw).map_err(|e| ConfigError::Invalid {
        key: "AZURACAST_DOMAIN",
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::Invalid {
            key: "AZURACAST_DOMAIN",
            reason: format!("'{}' is not an http(s) base URL", domain),
        });
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_azuracast_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("FIRECAST_SECRET", "s3cret"),
            ("AZURACAST_API_KEY", "key"),
            ("AZURACAST_DOMAIN", "radio.example.com"),
        ]))
        .unwrap();

        assert_eq!(config.secret, "s3cret");
        assert!(config.requires_playlist());
        assert_eq!(config.ytdlp_path, "yt-dlp");
        assert_eq!(config.allowed_origins, vec!["*".to_string()]);
        match config.backend {
            BackendConfig::AzuraCast(azura) => {
                assert_eq!(azura.base_url.as_str(), "https://radio.example.com/");
                assert_eq!(azura.station_id, "1");
                assert!(!azura.playlist_registration);
            }
            other => panic!("unexpected backend {:?}", other),
        }
    }

    #[test]
    fn test_missing_keys_are_all_listed() {
        let err = AppConfig::from_lookup(lookup(&[("AZURACAST_DOMAIN", "  ")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing(vec![
                "FIRECAST_SECRET".to_string(),
                "AZURACAST_API_KEY".to_string(),
                "AZURACAST_DOMAIN".to_string(),
            ])
        );
        assert_eq!(
            err.to_string(),
            "Missing required environment variables: FIRECAST_SECRET, AZURACAST_API_KEY, AZURACAST_DOMAIN"
        );
    }

    #[test]
    fn test_sftp_backend() {
        let config = AppConfig::from_lookup(lookup(&[
            ("FIRECAST_SECRET", "s3cret"),
            ("UPLOAD_BACKEND", "SFTP"),
            ("SFTP_HOST", "files.example.com"),
            ("SFTP_USER", "radio"),
            ("SFTP_PASSWORD", "hunter2"),
            ("SFTP_PORT", "2222"),
        ]))
        .unwrap();

        assert!(!config.requires_playlist());
        match config.backend {
            BackendConfig::Sftp(sftp) => {
                assert_eq!(sftp.port, 2222);
                assert_eq!(sftp.remote_dir, ".");
            }
            other => panic!("unexpected backend {:?}", other),
        }
    }

    #[test]
    fn test_sftp_missing_credentials() {
        let err = AppConfig::from_lookup(lookup(&[
            ("FIRECAST_SECRET", "s3cret"),
            ("UPLOAD_BACKEND", "sftp"),
            ("SFTP_HOST", "files.example.com"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing(vec!["SFTP_USER".to_string(), "SFTP_PASSWORD".to_string()])
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(lookup(&[
            ("FIRECAST_SECRET", "s3cret"),
            ("UPLOAD_BACKEND", "ftp"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "UPLOAD_BACKEND", .. }));

        let err = AppConfig::from_lookup(lookup(&[
            ("FIRECAST_SECRET", "s3cret"),
            ("UPLOAD_BACKEND", "sftp"),
            ("SFTP_HOST", "h"),
            ("SFTP_USER", "u"),
            ("SFTP_PASSWORD", "p"),
            ("SFTP_PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SFTP_PORT", .. }));
    }

    #[test]
    fn test_domain_with_scheme_and_registration() {
        let config = AppConfig::from_lookup(lookup(&[
            ("FIRECAST_SECRET", "s3cret"),
            ("AZURACAST_API_KEY", "key"),
            ("AZURACAST_DOMAIN", "http://127.0.0.1:8080/"),
            ("AZURACAST_STATION_ID", "3"),
            ("PLAYLIST_REGISTRATION", "TRUE"),
            ("ALLOWED_ORIGINS", "http://a.test, http://b.test"),
        ]))
        .unwrap();

        assert_eq!(
            config.allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        match config.backend {
            BackendConfig::AzuraCast(azura) => {
                assert_eq!(azura.base_url.as_str(), "http://127.0.0.1:8080/");
                assert_eq!(azura.station_id, "3");
                assert!(azura.playlist_registration);
            }
            other => panic!("unexpected backend {:?}", other),
        }
    }

    #[test]
    fn test_registration_flag_values() {
        let registration = |value: &str| {
            AppConfig::from_lookup(lookup(&[
                ("FIRECAST_SECRET", "s3cret"),
                ("AZURACAST_API_KEY", "key"),
                ("AZURACAST_DOMAIN", "radio.example.com"),
                ("PLAYLIST_REGISTRATION", value),
            ]))
            .map(|config| match config.backend {
                BackendConfig::AzuraCast(azura) => azura.playlist_registration,
                other => panic!("unexpected backend {:?}", other),
            })
        };

        assert_eq!(registration("1"), Ok(true));
        assert_eq!(registration("False"), Ok(false));
        assert_eq!(registration("0"), Ok(false));
        assert!(matches!(
            registration("ture"),
            Err(ConfigError::Invalid { key: "PLAYLIST_REGISTRATION", .. })
        ));
    }

    #[test]
    fn test_debug_output_redacts_credentials() {
        let azura = AppConfig::from_lookup(lookup(&[
            ("FIRECAST_SECRET", "s3cret"),
            ("AZURACAST_API_KEY", "station-key-123"),
            ("AZURACAST_DOMAIN", "radio.example.com"),
        ]))
        .unwrap();
        let printed = format!("{:?}", azura);
        assert!(!printed.contains("s3cret"));
        assert!(!printed.contains("station-key-123"));
        assert!(printed.contains("radio.example.com"));

        let sftp = AppConfig::from_lookup(lookup(&[
            ("FIRECAST_SECRET", "s3cret"),
            ("UPLOAD_BACKEND", "sftp"),
            ("SFTP_HOST", "files.example.com"),
            ("SFTP_USER", "radio"),
            ("SFTP_PASSWORD", "hunter2"),
        ]))
        .unwrap();
        let printed = format!("{:?}", sftp);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("files.example.com"));
    }
}
