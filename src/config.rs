//! Configuration types for tubeproxy

use crate::error::{Error, Result};
use crate::quality::Quality;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};

/// Main configuration
///
/// Every section has defaults, so an empty TOML document is a valid
/// configuration that serves on `127.0.0.1:3000` using the public Cobalt relay.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Job lifecycle settings (directories, cleanup, timeouts)
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Backends in fallback order (at least one required)
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendConfig>,

    /// Fallback chain settings
    #[serde(default)]
    pub chain: ChainConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            jobs: JobsConfig::default(),
            backends: default_backends(),
            chain: ChainConfig::default(),
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::Config {
            message: e.to_string(),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    ///
    /// With no path the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
                    message: format!("failed to read {}: {e}", path.display()),
                    key: None,
                })?;
                Self::from_toml_str(&text)
            }
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Check cross-field constraints that serde cannot express
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the offending key if the backend list is
    /// empty, any interval or age is zero, or the job timeout is shorter than
    /// a single chain attempt.
    pub fn validate(&self) -> Result<()> {
        if self.backends.is_empty() {
            return Err(config_error("at least one backend is required", "backends"));
        }

        let non_zero = [
            ("jobs.janitor_interval", self.jobs.janitor_interval),
            ("jobs.job_max_age", self.jobs.job_max_age),
            ("jobs.file_max_age", self.jobs.file_max_age),
            ("jobs.job_timeout", self.jobs.job_timeout),
            ("chain.attempt_timeout", self.chain.attempt_timeout),
        ];
        for (key, value) in non_zero {
            if value.is_zero() {
                return Err(config_error("must be greater than zero", key));
            }
        }

        if self.jobs.job_timeout < self.chain.attempt_timeout {
            return Err(config_error(
                "job timeout must not be shorter than the chain attempt timeout",
                "jobs.job_timeout",
            ));
        }

        Ok(())
    }
}

fn config_error(message: &str, key: &str) -> Error {
    Error::Config {
        message: format!("{key}: {message}"),
        key: Some(key.to_string()),
    }
}

/// HTTP server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Directory holding the landing page and other static files (default: "./public")
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            static_dir: default_static_dir(),
        }
    }
}

/// Job lifecycle configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Directory for locally produced files (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Delay between first delivery and removal (default: 10 minutes)
    #[serde(default = "default_grace_delay", with = "duration_serde")]
    pub grace_delay: Duration,

    /// How often the janitor sweeps (default: 30 minutes)
    #[serde(default = "default_janitor_interval", with = "duration_serde")]
    pub janitor_interval: Duration,

    /// Age after which a job record is reclaimed (default: 1 hour)
    #[serde(default = "default_max_age", with = "duration_serde")]
    pub job_max_age: Duration,

    /// Age after which a file in the download directory is deleted (default: 1 hour)
    #[serde(default = "default_max_age", with = "duration_serde")]
    pub file_max_age: Duration,

    /// Wall-clock limit for a whole backend call (default: 10 minutes)
    #[serde(default = "default_job_timeout", with = "duration_serde")]
    pub job_timeout: Duration,

    /// Quality used when a request omits or garbles it (default: best)
    #[serde(default)]
    pub default_quality: Quality,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            grace_delay: default_grace_delay(),
            janitor_interval: default_janitor_interval(),
            job_max_age: default_max_age(),
            file_max_age: default_max_age(),
            job_timeout: default_job_timeout(),
            default_quality: Quality::default(),
        }
    }
}

/// Fallback chain configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Time budget for each backend attempt (default: 5 minutes)
    #[serde(default = "default_attempt_timeout", with = "duration_serde")]
    pub attempt_timeout: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: default_attempt_timeout(),
        }
    }
}

/// One configured backend, tagged by `type`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Cobalt download relay
    Cobalt(CobaltConfig),
    /// yt-dlp subprocess
    YtDlp(YtDlpConfig),
    /// oEmbed metadata lookup
    Oembed(OembedConfig),
    /// Mocked backend for demos and tests
    Mock(MockConfig),
}

/// Cobalt relay configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CobaltConfig {
    /// Relay endpoint (default: "https://co.wuk.sh/api/json")
    #[serde(default = "default_cobalt_url")]
    pub api_url: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent to the relay
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CobaltConfig {
    fn default() -> Self {
        Self {
            api_url: default_cobalt_url(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// yt-dlp configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct YtDlpConfig {
    /// Path to the yt-dlp binary (default: discovered on PATH)
    #[serde(default)]
    pub binary: Option<PathBuf>,

    /// Time limit for metadata probes (default: 60 seconds)
    #[serde(default = "default_probe_timeout", with = "duration_serde")]
    pub probe_timeout: Duration,

    /// Time limit for a single download run (default: 10 minutes)
    #[serde(default = "default_job_timeout", with = "duration_serde")]
    pub download_timeout: Duration,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: None,
            probe_timeout: default_probe_timeout(),
            download_timeout: default_job_timeout(),
        }
    }
}

/// oEmbed configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OembedConfig {
    /// oEmbed endpoint (default: "https://www.youtube.com/oembed")
    #[serde(default = "default_oembed_url")]
    pub endpoint: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for OembedConfig {
    fn default() -> Self {
        Self {
            endpoint: default_oembed_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Mock backend configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MockConfig {
    /// What a fetch produces
    #[serde(default)]
    pub outcome: MockOutcome,

    /// Pause before each reported stage, in milliseconds (default: 0)
    #[serde(default)]
    pub stage_delay_ms: u64,
}

/// Result produced by the mock backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MockOutcome {
    /// Complete with a remote URL
    Redirect {
        /// URL to redirect to
        url: String,
    },
    /// Write a file of the given size into the download directory
    File {
        /// File size in bytes
        size_bytes: usize,
    },
    /// Fail with the given message
    Fail {
        /// Failure cause
        message: String,
    },
}

impl Default for MockOutcome {
    fn default() -> Self {
        MockOutcome::Redirect {
            url: "https://example.com/mock/video.mp4".to_string(),
        }
    }
}

fn default_backends() -> Vec<BackendConfig> {
    vec![BackendConfig::Cobalt(CobaltConfig::default())]
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./public")
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_grace_delay() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_janitor_interval() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_max_age() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_job_timeout() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_attempt_timeout() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_cobalt_url() -> String {
    "https://co.wuk.sh/api/json".to_string()
}

fn default_oembed_url() -> String {
    "https://www.youtube.com/oembed".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

// Duration serialization helper (as seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();

        assert_eq!(config.server.bind_address, default_bind_address());
        assert!(config.server.cors_enabled);
        assert_eq!(config.jobs.grace_delay, Duration::from_secs(600));
        assert_eq!(config.jobs.janitor_interval, Duration::from_secs(1800));
        assert_eq!(config.jobs.job_max_age, Duration::from_secs(3600));
        assert_eq!(config.jobs.default_quality, Quality::Best);
        assert!(matches!(config.backends.as_slice(), [BackendConfig::Cobalt(_)]));
    }

    #[test]
    fn test_full_document_parses() {
        let config = Config::from_toml_str(
            r#"
            [server]
            bind_address = "0.0.0.0:8080"
            cors_enabled = false

            [jobs]
            download_dir = "/tmp/tubeproxy"
            grace_delay = 60
            job_timeout = 120
            default_quality = "720p"

            [chain]
            attempt_timeout = 90

            [[backends]]
            type = "cobalt"
            api_url = "http://localhost:9000/"

            [[backends]]
            type = "yt_dlp"
            binary = "/usr/local/bin/yt-dlp"

            [[backends]]
            type = "mock"
            stage_delay_ms = 5
            outcome = { kind = "fail", message = "boom" }
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address.port(), 8080);
        assert!(!config.server.cors_enabled);
        assert_eq!(config.jobs.grace_delay, Duration::from_secs(60));
        assert_eq!(config.jobs.default_quality, Quality::Resolution(720));
        assert_eq!(config.backends.len(), 3);
        match &config.backends[0] {
            BackendConfig::Cobalt(cobalt) => {
                assert_eq!(cobalt.api_url, "http://localhost:9000/");
                assert_eq!(cobalt.request_timeout, Duration::from_secs(30));
            }
            other => panic!("unexpected backend {other:?}"),
        }
        match &config.backends[2] {
            BackendConfig::Mock(mock) => {
                assert_eq!(
                    mock.outcome,
                    MockOutcome::Fail {
                        message: "boom".into()
                    }
                );
            }
            other => panic!("unexpected backend {other:?}"),
        }
    }

    #[test]
    fn test_rejects_empty_backend_list() {
        let err = Config::from_toml_str("backends = []").unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("backends")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = Config::from_toml_str("[jobs]\njanitor_interval = 0").unwrap_err();
        match err {
            Error::Config { key, .. } => {
                assert_eq!(key.as_deref(), Some("jobs.janitor_interval"))
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_rejects_job_timeout_below_attempt_timeout() {
        let err = Config::from_toml_str("[jobs]\njob_timeout = 10\n[chain]\nattempt_timeout = 20")
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_rejects_unknown_backend_type() {
        let err = Config::from_toml_str("[[backends]]\ntype = \"ftp\"").unwrap_err();
        assert!(matches!(err, Error::Config { key: None, .. }));
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.jobs.download_dir, PathBuf::from("./downloads"));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = Config::load(Some(Path::new("/nonexistent/tubeproxy.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
