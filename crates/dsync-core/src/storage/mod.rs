//! File lifecycle for downloaded and exported artifacts.
//!
//! Every artifact is written into a hidden `.dsync-tmp/` directory next to
//! its final location and atomically renamed into place once complete. No
//! plain file name can land inside that directory, so temp files never
//! collide with artifacts and an interrupted write never leaves a truncated
//! file under a final name.

mod writer;

pub use writer::PartWriter;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory, inside the artifact's own directory, that holds temp files.
pub const TEMP_DIR_NAME: &str = ".dsync-tmp";

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Temp directory for artifacts placed in `dir`.
pub fn temp_dir(dir: &Path) -> PathBuf {
    dir.join(TEMP_DIR_NAME)
}

/// Path for the temp file: `<dir>/.dsync-tmp/<name>.part` for `<dir>/<name>`.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let dir = final_path.parent().unwrap_or_else(|| Path::new(""));
    let mut name = final_path
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_default();
    name.push(TEMP_SUFFIX);
    temp_dir(dir).join(name)
}

/// Create the temp directory for `final_path`. The artifact's directory must already exist.
fn ensure_temp_dir(final_path: &Path) -> io::Result<()> {
    let Some(dir) = temp_path(final_path).parent().map(Path::to_path_buf) else {
        return Ok(());
    };
    match fs::create_dir(&dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Remove the temp directory once it is empty. Errors are ignored: another
/// writer may still be using it, or it is already gone.
fn release_temp_dir(temp_file: &Path) {
    if let Some(dir) = temp_file.parent() {
        let _ = fs::remove_dir(dir);
    }
}
