//! `dsync inventory`: list what is already mirrored.

use anyhow::{Context, Result};
use dsync_core::inventory;
use std::path::Path;

/// Print `digest  name` for every file in `dir`; `-` marks unreadable files.
pub fn run_inventory(dir: &Path) -> Result<()> {
    let inv = inventory::compute_inventory(dir)
        .with_context(|| format!("cannot scan {}", dir.display()))?;
    if inv.is_empty() {
        println!("No files in {}.", dir.display());
        return Ok(());
    }
    for (name, digest) in inv.iter() {
        println!("{}  {}", digest.unwrap_or("-"), name);
    }
    if inv.unreadable() > 0 {
        tracing::warn!("{} file(s) could not be read", inv.unreadable());
    }
    Ok(())
}
