//! Sequential writer for temp files in `.dsync-tmp/`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{ensure_temp_dir, release_temp_dir, temp_path};

/// Writes an artifact to its temp path; `finalize` syncs and renames it into place.
pub struct PartWriter {
    out: BufWriter<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
}

impl PartWriter {
    /// Create (or truncate) the temp file for `final_path`. The parent of
    /// `final_path` must exist.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let temp_path = temp_path(final_path);
        ensure_temp_dir(final_path)?;
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        Ok(Self {
            out: BufWriter::new(file),
            temp_path,
            final_path: final_path.to_path_buf(),
            written: 0,
        })
    }

    /// Append `data` to the temp file.
    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.out.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flush, fsync and rename the temp file over the final path. Returns bytes written.
    /// An existing file at the final path is replaced.
    pub fn finalize(self) -> io::Result<u64> {
        let PartWriter {
            out,
            temp_path,
            final_path,
            written,
        } = self;
        let file = out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        let renamed = std::fs::rename(&temp_path, &final_path);
        if renamed.is_err() {
            let _ = std::fs::remove_file(&temp_path);
        }
        release_temp_dir(&temp_path);
        renamed?;
        Ok(written)
    }

    /// Drop the temp file without touching the final path.
    pub fn discard(self) {
        let temp_path = self.temp_path.clone();
        drop(self.out);
        if let Err(e) = std::fs::remove_file(&temp_path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %temp_path.display(), error = %e, "could not remove temp file");
            }
        }
        release_temp_dir(&temp_path);
    }
}

impl Write for PartWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.out.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
