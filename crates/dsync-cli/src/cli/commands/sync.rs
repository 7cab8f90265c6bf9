//! `dsync sync`: run one sync cycle and print a summary.

use anyhow::{bail, Result};
use dsync_core::http::CurlClient;
use dsync_core::sync::{DecompressStatus, TransferStatus};
use dsync_core::{SyncEngine, SyncOptions, SyncReport};

use super::progress::ProgressPrinter;

pub fn run_sync(options: SyncOptions) -> Result<()> {
    let client = CurlClient::new().with_buffer_size(options.chunk_size);
    let engine = SyncEngine::new(client, options);

    let mut printer = ProgressPrinter::new();
    let report = engine.run(&mut printer)?;
    print_summary(&report);

    if report.has_failures() {
        bail!(
            "{} download(s) and {} decompression(s) failed",
            report.failed_transfers(),
            report.failed_decompressions()
        );
    }
    Ok(())
}

fn print_summary(report: &SyncReport) {
    if report.catalog_len == 0 {
        println!("No files in catalog.");
        return;
    }
    if report.planned() == 0 {
        println!(
            "Up to date: {} file(s) in catalog, all present.",
            report.catalog_len
        );
        return;
    }
    for outcome in &report.outcomes {
        let transfer = match &outcome.transfer {
            TransferStatus::Downloaded { bytes } => format!("downloaded {} bytes", bytes),
            TransferStatus::Failed { reason } => format!("FAILED: {}", reason),
        };
        let decompress = match &outcome.decompress {
            Some(DecompressStatus::Decompressed { output }) => {
                format!(", expanded to {}", output.display())
            }
            Some(DecompressStatus::Failed { reason }) => format!(", decompress FAILED: {}", reason),
            Some(DecompressStatus::SkippedNotCompressed) | None => String::new(),
        };
        println!("{}: {}{}", outcome.file_name, transfer, decompress);
    }
    println!(
        "{} planned, {} downloaded, {} failed, {} expanded.",
        report.planned(),
        report.downloaded(),
        report.failed_transfers(),
        report.decompressed()
    );
}
