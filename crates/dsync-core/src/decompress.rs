//! Decompression stage: expand gzip downloads into the export directory.
//!
//! Detection looks at the leading magic bytes only; the file name is not
//! consulted. Files without a known signature are left alone, which is the
//! normal case for plain artifacts. The downloaded original is never
//! modified or removed.

use flate2::read::MultiGzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::names;
use crate::storage::PartWriter;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Compressed formats the stage can expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
}

/// Identify a compressed format from the first bytes of a file.
pub fn detect_compression(header: &[u8]) -> Option<Compression> {
    match header {
        [0x1F, 0x8B, ..] => Some(Compression::Gzip),
        _ => None,
    }
}

/// What the stage did with one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecompressOutcome {
    Decompressed { output: PathBuf, bytes: u64 },
    NotCompressed,
}

#[derive(Debug, thiserror::Error)]
pub enum DecompressError {
    #[error("{} does not exist", .0.display())]
    Missing(PathBuf),
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot expand {} into {}: {source}", .path.display(), .output.display())]
    Expand {
        path: PathBuf,
        output: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Expand `path` into `export_dir` if it starts with a gzip signature.
///
/// The output is named after the source with one trailing `.gz` removed and
/// is written through a temp file, so a corrupt stream leaves nothing behind.
/// `export_dir` is created on demand.
pub fn maybe_decompress(path: &Path, export_dir: &Path) -> Result<DecompressOutcome, DecompressError> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::error!(path = %path.display(), "file does not exist");
            return Err(DecompressError::Missing(path.to_path_buf()));
        }
        Err(source) => {
            return Err(DecompressError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let header = read_header(&mut file).map_err(|source| DecompressError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if detect_compression(&header).is_none() {
        tracing::info!(path = %path.display(), "not a gzip file");
        return Ok(DecompressOutcome::NotCompressed);
    }

    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let output = export_dir.join(names::export_file_name(&source_name));
    tracing::info!(path = %path.display(), export_dir = %export_dir.display(), "decompressing");

    let result = expand_gzip(path, &output, export_dir);
    match result {
        Ok(bytes) => {
            tracing::info!(path = %path.display(), output = %output.display(), bytes, "successfully decompressed");
            Ok(DecompressOutcome::Decompressed { output, bytes })
        }
        Err(source) => {
            let err = DecompressError::Expand {
                path: path.to_path_buf(),
                output,
                source,
            };
            tracing::error!(error = %err, "error decompressing");
            Err(err)
        }
    }
}

/// Up to two leading bytes; fewer for tiny files.
fn read_header(file: &mut File) -> io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(GZIP_MAGIC.len());
    file.by_ref()
        .take(GZIP_MAGIC.len() as u64)
        .read_to_end(&mut header)?;
    Ok(header)
}

fn expand_gzip(path: &Path, output: &Path, export_dir: &Path) -> io::Result<u64> {
    fs::create_dir_all(export_dir)?;
    let mut decoder = MultiGzDecoder::new(BufReader::new(File::open(path)?));
    let mut writer = PartWriter::create(output)?;
    match io::copy(&mut decoder, &mut writer) {
        Ok(_) => writer.finalize(),
        Err(e) => {
            writer.discard();
            Err(e)
        }
    }
}
