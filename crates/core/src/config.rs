//! Configuration types shared across crates.

use crate::error::{Error, Result};
use crate::version::ApiVersion;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8081").
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8081".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Upstream Provisioning Certification Service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URI of the PCS, including the `/v<N>/` API version segment.
    #[serde(default = "default_upstream_uri")]
    pub uri: String,
    /// PCS subscription key.
    /// WARNING: Prefer PCCS_UPSTREAM__API_KEY env var over storing in config.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_upstream_uri() -> String {
    "https://api.trustedservices.intel.com/sgx/certification/v4/".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    30
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            uri: default_upstream_uri(),
            api_key: None,
            timeout_secs: default_upstream_timeout_secs(),
        }
    }
}

impl UpstreamConfig {
    /// Parse the configured URI.
    pub fn url(&self) -> Result<Url> {
        Url::parse(&self.uri)
            .map_err(|e| Error::Config(format!("invalid upstream uri '{}': {e}", self.uri)))
    }

    /// Hostname of the configured PCS. This is the value a cache is bound to.
    pub fn host(&self) -> Result<String> {
        self.url()?
            .host_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Config(format!("upstream uri '{}' has no host", self.uri)))
    }

    /// API version named by the configured URI.
    pub fn api_version(&self) -> Result<ApiVersion> {
        let url = self.url()?;
        let path = format!("{}/", url.path().trim_end_matches('/'));
        ApiVersion::from_path(&path)
    }

    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate upstream configuration invariants.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let url = self.url().map_err(|e| e.to_string())?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(format!(
                "upstream.uri must be an http(s) URL, got scheme '{}'",
                url.scheme()
            ));
        }
        self.host().map_err(|e| e.to_string())?;
        if self.timeout_secs == 0 {
            return Err("upstream.timeout_secs cannot be 0".to_string());
        }
        Ok(())
    }
}

/// Cache database configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// SQLite database file path.
    #[serde(default = "default_metadata_path")]
    pub path: PathBuf,
    /// Check and migrate the database at startup (default: true).
    /// When false, the database is used as-is without any compatibility check.
    #[serde(default = "default_init_db")]
    pub init_db: bool,
}

fn default_metadata_path() -> PathBuf {
    PathBuf::from("./data/pckcache.db")
}

fn default_init_db() -> bool {
    true
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            path: default_metadata_path(),
            init_db: default_init_db(),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream PCS configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Cache database configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Points the database at a relative path; callers
    /// normally override `metadata.path` with a temp directory.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            metadata: MetadataConfig {
                path: PathBuf::from("./target/test-pckcache.db"),
                init_db: true,
            },
        }
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.upstream.validate()
    }
}
