//! Transfer engine: stream one catalog entry into the download directory.
//!
//! The body is written in fixed-size chunks to a temp file under
//! `.dsync-tmp/` and renamed to
//! `<name>` once the response completed. Any failure removes the temp file
//! and leaves whatever was previously at `<name>` untouched. There is no
//! retry; the next sync cycle plans the file again.

mod progress;

pub use progress::{NoProgress, ProgressObserver, TransferProgress};

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::http::{BodySink, HttpClient, HttpError, Request};
use crate::manifest::RemoteFileDescriptor;
use crate::names;
use crate::storage::PartWriter;

/// Default per-request timeout (connect, and maximum stall while streaming).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default write chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Knobs for a single download.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub timeout: Duration,
    pub chunk_size: usize,
    /// Sent as a bearer token on the download request when set.
    pub bearer_token: Option<String>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            bearer_token: None,
        }
    }
}

/// A completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub path: PathBuf,
    pub bytes: u64,
    /// `Content-Length` as declared by the server, if any.
    pub declared_len: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("refusing to write {0:?}: not a plain file name")]
    InvalidName(String),
    #[error("download of {file} failed: {source}")]
    Http {
        file: String,
        #[source]
        source: HttpError,
    },
    #[error("writing {} failed: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

struct FileSink<'a> {
    writer: PartWriter,
    progress: TransferProgress,
    started: Instant,
    chunk_size: usize,
    observer: &'a mut dyn ProgressObserver,
}

impl BodySink for FileSink<'_> {
    fn on_start(&mut self, content_length: Option<u64>) {
        self.progress.total_bytes = content_length;
        self.observer.on_start(&self.progress);
    }

    fn on_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        for piece in chunk.chunks(self.chunk_size) {
            self.writer.write_chunk(piece)?;
            self.progress.bytes_done += piece.len() as u64;
            self.progress.elapsed_secs = self.started.elapsed().as_secs_f64();
            self.observer.on_progress(&self.progress);
        }
        Ok(())
    }
}

/// Download `item` into `dest_dir/<file_name>`, replacing any existing file.
pub fn download<C: HttpClient + ?Sized>(
    client: &C,
    item: &RemoteFileDescriptor,
    dest_dir: &Path,
    options: &TransferOptions,
    observer: &mut dyn ProgressObserver,
) -> Result<TransferReceipt, TransferError> {
    if !names::is_plain_file_name(&item.file_name) {
        return Err(TransferError::InvalidName(item.file_name.clone()));
    }
    let final_path = dest_dir.join(&item.file_name);
    tracing::info!(file = %item.file_name, "starting download");

    let writer = PartWriter::create(&final_path).map_err(|source| TransferError::Storage {
        path: final_path.clone(),
        source,
    })?;
    let temp_path = writer.temp_path().to_path_buf();

    let mut request = Request::get(&item.download_url, options.timeout);
    if let Some(token) = options.bearer_token.as_deref() {
        request = request.bearer(token);
    }

    let mut sink = FileSink {
        writer,
        progress: TransferProgress::new(item.file_name.as_str()),
        started: Instant::now(),
        chunk_size: options.chunk_size.max(1),
        observer: &mut *observer,
    };
    let result = client.get_streaming(&request, &mut sink);
    let FileSink {
        writer, mut progress, started, ..
    } = sink;
    progress.elapsed_secs = started.elapsed().as_secs_f64();

    let outcome = match result {
        Ok(_) => writer
            .finalize()
            .map_err(|source| TransferError::Storage {
                path: final_path.clone(),
                source,
            }),
        Err(HttpError::Sink(source)) => {
            writer.discard();
            Err(TransferError::Storage {
                path: temp_path,
                source,
            })
        }
        Err(source) => {
            writer.discard();
            Err(TransferError::Http {
                file: item.file_name.clone(),
                source,
            })
        }
    };
    observer.on_finish(&progress, outcome.is_ok());

    match outcome {
        Ok(bytes) => {
            if let Some(declared) = progress.total_bytes.filter(|d| *d != bytes) {
                tracing::warn!(
                    file = %item.file_name,
                    declared,
                    received = bytes,
                    "content length mismatch"
                );
            }
            tracing::info!(file = %item.file_name, bytes, "successfully downloaded");
            Ok(TransferReceipt {
                path: final_path,
                bytes,
                declared_len: progress.total_bytes,
            })
        }
        Err(e) => {
            tracing::error!(file = %item.file_name, error = %e, "download error");
            Err(e)
        }
    }
}
