//! Logging init: `download.log` in the download directory plus stderr, or
//! graceful fallback to stderr only.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Log file kept next to the downloaded artifacts.
pub const LOG_FILE_NAME: &str = "download.log";

/// Subdirectory of the log directory that holds rotated logs. Pruning never
/// looks outside it.
pub const ROTATED_DIR_NAME: &str = ".dsync-log";

/// Where rotated copies of logs in `dir` are kept.
pub fn rotated_dir(dir: &Path) -> PathBuf {
    dir.join(ROTATED_DIR_NAME)
}

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Directory holding `download.log` (the download directory).
    pub dir: PathBuf,
    /// Lower the default filter to `debug`.
    pub verbose: bool,
    /// Rotate the log at startup once it is larger than this.
    pub max_bytes: u64,
    /// Rotated logs older than this are deleted at startup.
    pub retention: Duration,
}

/// Writer that is either a file or stderr (used when file clone fails).
enum FileOrStderr {
    File(fs::File),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => f.write(buf),
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => f.flush(),
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct FileMakeWriter(fs::File);

impl<'a> MakeWriter<'a> for FileMakeWriter {
    type Writer = FileOrStderr;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(FileOrStderr::File)
            .unwrap_or(FileOrStderr::Stderr)
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize structured logging to `<dir>/download.log` and stderr.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall back to stderr.
pub fn init_logging(opts: &LogOptions) -> Result<PathBuf> {
    fs::create_dir_all(&opts.dir)?;
    let log_file_path = opts.dir.join(LOG_FILE_NAME);

    let rotated = rotate_if_needed(&log_file_path, opts.max_bytes)?;
    let pruned = prune_rotated(&opts.dir, opts.retention)?;

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    let writer = BoxMakeWriter::new(FileMakeWriter(file).and(io::stderr));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(opts.verbose))
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install subscriber: {e}"))?;

    tracing::debug!(
        path = %log_file_path.display(),
        rotated = rotated.is_some(),
        pruned,
        "logging initialized"
    );
    Ok(log_file_path)
}

/// Initialize logging to stderr only (no file). Use when init_logging() fails so the CLI doesn't crash.
pub fn init_logging_stderr(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

/// Move `path` to `<parent>/.dsync-log/<name>.<unix-seconds>` if it is larger than `max_bytes`.
pub fn rotate_if_needed(path: &Path, max_bytes: u64) -> io::Result<Option<PathBuf>> {
    let len = match fs::metadata(path) {
        Ok(m) => m.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if len <= max_bytes {
        return Ok(None);
    }
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return Ok(None);
    };
    let target_dir = rotated_dir(parent);
    fs::create_dir_all(&target_dir)?;
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut rotated = name.to_owned();
    rotated.push(format!(".{stamp}"));
    let rotated = target_dir.join(rotated);
    fs::rename(path, &rotated)?;
    Ok(Some(rotated))
}

/// Delete rotated logs (`download.log.<n>`) under `dir/.dsync-log/` whose mtime
/// is at least `retention` ago. Files directly in `dir` are never touched.
pub fn prune_rotated(dir: &Path, retention: Duration) -> io::Result<usize> {
    let prefix = format!("{LOG_FILE_NAME}.");
    let read_dir = match fs::read_dir(rotated_dir(dir)) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let mut removed = 0;
    for entry in read_dir {
        let entry = entry?;
        let name = entry.file_name();
        let Some(suffix) = name.to_str().and_then(|n| n.strip_prefix(&prefix)) else {
            continue;
        };
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let age = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.elapsed().ok())
            .unwrap_or_default();
        if age >= retention {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
