//! CLI for the dsync catalog mirror.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dsync_core::config::{self, SyncConfig};
use dsync_core::logging;
use std::path::PathBuf;

use commands::{run_checksum, run_completions, run_inventory, run_plan, run_sync};

/// Top-level CLI for dsync.
#[derive(Debug, Parser)]
#[command(name = "dsync", version)]
#[command(about = "dsync: mirror a remote file catalog and expand gzip artifacts", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/dsync/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run one sync cycle: fetch the catalog, download missing files, expand gzip files.
    Sync {
        #[command(flatten)]
        source: SourceArgs,

        /// Download only; do not expand gzip files into the export directory.
        #[arg(long)]
        no_decompress: bool,
    },

    /// Show which catalog files are missing locally, without downloading anything.
    Plan {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List files in the download directory with their SHA-256.
    Inventory {
        /// Directory to scan (defaults to the configured download directory).
        #[arg(long, env = "DOWNLOAD_DIR", value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Print a shell completion script to stdout.
    Completions {
        shell: clap_complete::Shell,
    },
}

/// Where to sync from and to. Each flag falls back to its environment
/// variable, then to the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Catalog endpoint.
    #[arg(long, env = "API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Bearer token for the catalog endpoint.
    #[arg(long, env = "API_KEY", hide_env_values = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Directory that mirrors the catalog.
    #[arg(long, env = "DOWNLOAD_DIR", value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Directory for expanded gzip files.
    #[arg(long, env = "EXPORT_DIR", value_name = "DIR")]
    pub export_dir: Option<PathBuf>,
}

impl SourceArgs {
    /// Overlay the values given on the command line (or environment) onto `cfg`.
    pub fn apply(&self, cfg: &mut SyncConfig) {
        if let Some(url) = &self.api_url {
            cfg.api_url = Some(url.clone());
        }
        if let Some(key) = &self.api_key {
            cfg.api_key = Some(key.clone());
        }
        if let Some(dir) = &self.download_dir {
            cfg.download_dir = dir.clone();
        }
        if let Some(dir) = &self.export_dir {
            cfg.export_dir = dir.clone();
        }
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            CliCommand::Sync {
                ref source,
                no_decompress,
            } => {
                let mut cfg = self.load_config()?;
                source.apply(&mut cfg);
                if no_decompress {
                    cfg.decompress = false;
                }
                // Nothing is written to the download directory for an unusable config.
                let options = cfg.to_options()?;
                if let Err(e) = logging::init_logging(&cfg.log_options(self.verbose)) {
                    logging::init_logging_stderr(self.verbose);
                    tracing::warn!("file logging unavailable, using stderr only: {:#}", e);
                }
                tracing::debug!("effective config: {:?}", redacted(&cfg));
                run_sync(options)
            }
            CliCommand::Plan { ref source } => {
                logging::init_logging_stderr(self.verbose);
                let mut cfg = self.load_config()?;
                source.apply(&mut cfg);
                run_plan(&cfg)
            }
            CliCommand::Inventory { ref download_dir } => {
                logging::init_logging_stderr(self.verbose);
                let dir = match download_dir {
                    Some(dir) => dir.clone(),
                    None => self.load_config()?.download_dir,
                };
                run_inventory(&dir)
            }
            CliCommand::Checksum { ref path } => {
                logging::init_logging_stderr(self.verbose);
                run_checksum(path)
            }
            CliCommand::Completions { shell } => run_completions(shell),
        }
    }

    fn load_config(&self) -> Result<SyncConfig> {
        match &self.config {
            Some(path) => config::load_from_path(path),
            None => config::load_or_init(),
        }
    }
}

fn redacted(cfg: &SyncConfig) -> SyncConfig {
    let mut cfg = cfg.clone();
    if cfg.api_key.is_some() {
        cfg.api_key = Some("***".to_string());
    }
    cfg
}

#[cfg(test)]
mod tests;
