//! Client configuration with TOML loading and validation

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::info;
use url::Url;

/// Configuration for the share-node client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Remote endpoints
    #[serde(default)]
    pub service: ServiceConfig,
    /// HTTP client settings
    #[serde(default)]
    pub network: NetworkConfig,
    /// Upload settings
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the local peer API (serves `/api/v1/...`)
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Base URL of the directory service (serves `/download/<id>`)
    #[serde(default = "default_directory_url")]
    pub directory_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Upload stream chunk size in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// How long a finished upload stays visible, in milliseconds
    #[serde(default = "default_display_window")]
    pub display_window_ms: u64,
    /// Largest file the peer accepts, in bytes
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Refresh interval in seconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_api_url() -> String { "http://localhost:9001".to_string() }
fn default_directory_url() -> String { "http://localhost:8080".to_string() }
fn default_request_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_chunk_size() -> usize { 64 * 1024 }
fn default_display_window() -> u64 { 1000 }
fn default_max_upload_size() -> u64 { 100 * 1024 * 1024 } // 100MB
fn default_refresh_interval() -> u64 { 30 }

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            directory_url: default_directory_url(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            display_window_ms: default_display_window(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from file with validation
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).await.map_err(|e| {
            ClientError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let config: ClientConfig = toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("invalid format in {}: {}", path.display(), e))
        })?;

        config.validate()?;
        info!("Configuration loaded from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .map_err(|e| ClientError::Config(format!("serialization error: {}", e)))?;

        fs::write(path, content).await?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.api_url()?;
        self.directory_url()?;

        if self.network.request_timeout_secs == 0 {
            return Err(ClientError::Config("request timeout cannot be zero".into()));
        }
        if self.network.connect_timeout_secs == 0 {
            return Err(ClientError::Config("connect timeout cannot be zero".into()));
        }
        if self.transfer.chunk_size == 0 {
            return Err(ClientError::Config("upload chunk size cannot be zero".into()));
        }
        if self.transfer.display_window_ms == 0 {
            return Err(ClientError::Config("display window cannot be zero".into()));
        }
        if self.transfer.max_upload_size == 0 {
            return Err(ClientError::Config("max upload size cannot be zero".into()));
        }
        if self.watch.refresh_interval_secs == 0 {
            return Err(ClientError::Config("refresh interval cannot be zero".into()));
        }

        Ok(())
    }

    /// Parsed peer API base URL
    pub fn api_url(&self) -> Result<Url> {
        parse_http_url(&self.service.api_url)
    }

    /// Parsed directory service base URL
    pub fn directory_url(&self) -> Result<Url> {
        parse_http_url(&self.service.directory_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.network.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.network.connect_timeout_secs)
    }

    pub fn display_window(&self) -> Duration {
        Duration::from_millis(self.transfer.display_window_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.watch.refresh_interval_secs)
    }
}

fn parse_http_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::Config(format!(
            "unsupported scheme '{}' in {}",
            other, raw
        ))),
    }
}
