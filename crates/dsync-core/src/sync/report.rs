//! Per-file outcomes and the cycle summary.

use std::path::PathBuf;

/// Result of the transfer step for one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    Downloaded { bytes: u64 },
    Failed { reason: String },
}

/// Result of the decompression step, when it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecompressStatus {
    Decompressed { output: PathBuf },
    SkippedNotCompressed,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub file_name: String,
    pub transfer: TransferStatus,
    /// `None` when the download failed or decompression is disabled.
    pub decompress: Option<DecompressStatus>,
}

impl FileOutcome {
    pub fn is_downloaded(&self) -> bool {
        matches!(self.transfer, TransferStatus::Downloaded { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.transfer, TransferStatus::Failed { .. })
            || matches!(self.decompress, Some(DecompressStatus::Failed { .. }))
    }
}

/// Summary of one sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries in the remote catalog.
    pub catalog_len: usize,
    /// Files found locally before transferring.
    pub inventory_len: usize,
    /// One entry per planned item, in plan order.
    pub outcomes: Vec<FileOutcome>,
}

impl SyncReport {
    pub fn planned(&self) -> usize {
        self.outcomes.len()
    }

    pub fn downloaded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_downloaded()).count()
    }

    pub fn failed_transfers(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.transfer, TransferStatus::Failed { .. }))
            .count()
    }

    pub fn decompressed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.decompress, Some(DecompressStatus::Decompressed { .. })))
            .count()
    }

    pub fn failed_decompressions(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.decompress, Some(DecompressStatus::Failed { .. })))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(FileOutcome::is_failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}
