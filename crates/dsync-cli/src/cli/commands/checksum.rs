//! Checksum command: compute SHA-256 of a file.

use anyhow::{Context, Result};
use dsync_core::checksum;
use std::path::Path;

/// Compute and print SHA-256 of the given file.
pub fn run_checksum(path: &Path) -> Result<()> {
    let digest =
        checksum::sha256_path(path).with_context(|| format!("cannot hash {}", path.display()))?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
