use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging::LogOptions;
use crate::sync::SyncOptions;

/// Log file rotation (optional `[log]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Rotate `download.log` at startup once it exceeds this many bytes.
    pub max_bytes: u64,
    /// Delete rotated logs older than this many days.
    pub retention_days: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            retention_days: 7,
        }
    }
}

/// Configuration loaded from `~/.config/dsync/config.toml`.
///
/// Every field is optional in the file. Environment variables and CLI flags
/// are layered on top by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Catalog endpoint.
    pub api_url: Option<String>,
    /// Bearer token for the catalog endpoint.
    pub api_key: Option<String>,
    /// Where downloaded artifacts (and `download.log`) live.
    pub download_dir: PathBuf,
    /// Where expanded gzip artifacts are written.
    pub export_dir: PathBuf,
    /// Expand gzip downloads into `export_dir`.
    pub decompress: bool,
    /// Connect timeout and maximum stall per request, in seconds.
    pub request_timeout_secs: u64,
    /// Write chunk size for downloads, in bytes.
    pub chunk_size: usize,
    /// Send the API key on file downloads too.
    pub authenticate_downloads: bool,
    pub log: LogConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            download_dir: PathBuf::from("./downloads"),
            export_dir: PathBuf::from("./exports"),
            decompress: true,
            request_timeout_secs: 30,
            chunk_size: 1024,
            authenticate_downloads: false,
            log: LogConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Validate and convert into engine options.
    pub fn to_options(&self) -> Result<SyncOptions> {
        let api_url = match self.api_url.as_deref().map(str::trim) {
            Some(u) if !u.is_empty() => u,
            _ => bail!("no API URL configured (set api_url, API_URL or --api-url)"),
        };
        url::Url::parse(api_url).with_context(|| format!("invalid API URL {api_url:?}"))?;
        let api_key = match self.api_key.as_deref().map(str::trim) {
            Some(k) if !k.is_empty() => k,
            _ => bail!("no API key configured (set api_key, API_KEY or --api-key)"),
        };
        if self.download_dir == self.export_dir {
            bail!(
                "download and export directories must differ (both are {})",
                self.download_dir.display()
            );
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        if self.chunk_size == 0 {
            bail!("chunk_size must be greater than zero");
        }

        let mut options = SyncOptions::new(
            api_url,
            api_key,
            self.download_dir.clone(),
            self.export_dir.clone(),
        );
        options.decompress = self.decompress;
        options.request_timeout = Duration::from_secs(self.request_timeout_secs);
        options.chunk_size = self.chunk_size;
        options.authenticate_downloads = self.authenticate_downloads;
        Ok(options)
    }

    pub fn log_options(&self, verbose: bool) -> LogOptions {
        LogOptions {
            dir: self.download_dir.clone(),
            verbose,
            max_bytes: self.log.max_bytes,
            retention: Duration::from_secs(self.log.retention_days * 24 * 60 * 60),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dsync")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SyncConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SyncConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<SyncConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: SyncConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
