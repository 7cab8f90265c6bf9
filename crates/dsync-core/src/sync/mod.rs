//! Sync orchestrator: one fetch → inventory → plan → transfer → decompress cycle.
//!
//! Items are processed one at a time in catalog order. Per-file failures are
//! recorded in the [`SyncReport`] and never stop the cycle. Nothing is
//! checkpointed: an interrupted cycle is picked up by the next run, because
//! files that already landed are simply no longer planned.
//!
//! The engine owns no global state; the HTTP client and options are handed
//! in at construction and logging goes through `tracing`.

mod report;

pub use report::{DecompressStatus, FileOutcome, SyncReport, TransferStatus};

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::decompress::{self, DecompressOutcome};
use crate::http::HttpClient;
use crate::inventory::{self, LocalInventory};
use crate::manifest::{self, Catalog};
use crate::planner::{self, WorkItem};
use crate::transfer::{self, ProgressObserver, TransferOptions};

/// Everything one cycle needs to know.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub api_url: String,
    pub api_key: String,
    pub download_dir: PathBuf,
    pub export_dir: PathBuf,
    /// Run the decompression stage after each successful download.
    pub decompress: bool,
    pub request_timeout: Duration,
    pub chunk_size: usize,
    /// Also send the API key on file downloads (the manifest call always sends it).
    pub authenticate_downloads: bool,
}

impl SyncOptions {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        download_dir: impl Into<PathBuf>,
        export_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            download_dir: download_dir.into(),
            export_dir: export_dir.into(),
            decompress: true,
            request_timeout: transfer::DEFAULT_TIMEOUT,
            chunk_size: transfer::DEFAULT_CHUNK_SIZE,
            authenticate_downloads: false,
        }
    }
}

/// Environmental failures that prevent a cycle from running at all.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("cannot create download directory {}: {source}", .path.display())]
    DownloadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot scan download directory {}: {source}", .path.display())]
    Inventory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Catalog, inventory and the resulting work list, without any transfer.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub catalog: Catalog,
    pub inventory: LocalInventory,
    pub work: Vec<WorkItem>,
}

pub struct SyncEngine<C> {
    client: C,
    options: SyncOptions,
}

impl<C: HttpClient> SyncEngine<C> {
    pub fn new(client: C, options: SyncOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Fetch the remote catalog; empty on any failure.
    pub fn fetch_catalog(&self) -> Catalog {
        manifest::fetch_catalog(
            &self.client,
            &self.options.api_url,
            &self.options.api_key,
            self.options.request_timeout,
        )
    }

    /// Compute what a cycle would download. Does not write to disk.
    pub fn plan(&self) -> Result<SyncPlan, SyncError> {
        let catalog = self.fetch_catalog();
        if catalog.is_empty() {
            return Ok(SyncPlan::default());
        }
        let inventory = self.scan()?;
        let work = planner::plan(&catalog, &inventory);
        Ok(SyncPlan {
            catalog,
            inventory,
            work,
        })
    }

    /// Run one full sync cycle.
    pub fn run(&self, observer: &mut dyn ProgressObserver) -> Result<SyncReport, SyncError> {
        tracing::info!("starting sync");

        let catalog = self.fetch_catalog();
        if catalog.is_empty() {
            tracing::warn!("no files found");
            return Ok(SyncReport::default());
        }
        tracing::info!(count = catalog.len(), "found remote files");

        let download_dir = &self.options.download_dir;
        fs::create_dir_all(download_dir).map_err(|source| SyncError::DownloadDir {
            path: download_dir.clone(),
            source,
        })?;
        let inventory = self.scan()?;
        let work = planner::plan(&catalog, &inventory);
        tracing::info!(count = work.len(), "need to download files");

        let mut report = SyncReport {
            catalog_len: catalog.len(),
            inventory_len: inventory.len(),
            outcomes: Vec::with_capacity(work.len()),
        };
        if work.is_empty() {
            tracing::info!("download directory is up to date");
            return Ok(report);
        }

        let transfer_options = self.transfer_options();
        for (index, item) in work.iter().enumerate() {
            tracing::debug!(file = %item.file_name, index = index + 1, total = work.len(), "processing");
            let outcome = self.process(item, &transfer_options, observer);
            report.outcomes.push(outcome);
        }

        tracing::info!(
            planned = report.planned(),
            downloaded = report.downloaded(),
            failed = report.failed_transfers(),
            decompressed = report.decompressed(),
            decompress_failed = report.failed_decompressions(),
            "sync finished"
        );
        Ok(report)
    }

    fn scan(&self) -> Result<LocalInventory, SyncError> {
        let dir = &self.options.download_dir;
        inventory::compute_inventory(dir).map_err(|source| SyncError::Inventory {
            path: dir.clone(),
            source,
        })
    }

    fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            timeout: self.options.request_timeout,
            chunk_size: self.options.chunk_size,
            bearer_token: self
                .options
                .authenticate_downloads
                .then(|| self.options.api_key.clone()),
        }
    }

    fn process(
        &self,
        item: &WorkItem,
        options: &TransferOptions,
        observer: &mut dyn ProgressObserver,
    ) -> FileOutcome {
        let receipt = match transfer::download(
            &self.client,
            item,
            &self.options.download_dir,
            options,
            observer,
        ) {
            Ok(r) => r,
            Err(e) => {
                return FileOutcome {
                    file_name: item.file_name.clone(),
                    transfer: TransferStatus::Failed {
                        reason: e.to_string(),
                    },
                    decompress: None,
                }
            }
        };

        let decompress = self.options.decompress.then(|| {
            match decompress::maybe_decompress(&receipt.path, &self.options.export_dir) {
                Ok(DecompressOutcome::Decompressed { output, .. }) => {
                    DecompressStatus::Decompressed { output }
                }
                Ok(DecompressOutcome::NotCompressed) => DecompressStatus::SkippedNotCompressed,
                Err(e) => DecompressStatus::Failed {
                    reason: e.to_string(),
                },
            }
        });

        FileOutcome {
            file_name: item.file_name.clone(),
            transfer: TransferStatus::Downloaded {
                bytes: receipt.bytes,
            },
            decompress,
        }
    }
}
