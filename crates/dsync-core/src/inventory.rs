//! Local inventory: file name → content digest for the download directory.
//!
//! Only the immediate entries of the directory are scanned, and only regular
//! files (symlinks are followed). In-flight temp files live in the `.dsync-tmp/`
//! subdirectory and are therefore never seen.
//!
//! The planner only looks at key presence. Digests are kept so the inventory
//! can be listed and so content-change detection can be added later, but a
//! file that could not be read is still recorded, with no digest.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::checksum;

/// Snapshot of the download directory for one sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalInventory {
    entries: BTreeMap<String, Option<String>>,
}

impl LocalInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name`; `digest` is `None` when hashing failed. Later inserts win.
    pub fn insert(&mut self, name: impl Into<String>, digest: Option<String>) {
        self.entries.insert(name.into(), digest);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Digest for `name`. `None` if the file is unknown or could not be hashed.
    pub fn digest(&self, name: &str) -> Option<&str> {
        self.entries.get(name).and_then(|d| d.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(name, digest)| (name.as_str(), digest.as_deref()))
    }

    /// Number of entries whose digest could not be computed.
    pub fn unreadable(&self) -> usize {
        self.entries.values().filter(|d| d.is_none()).count()
    }
}

/// Scan `dir` and hash every regular file in it.
///
/// A missing directory yields an empty inventory. Failing to list an existing
/// directory is an error; failing to hash a single file is not.
pub fn compute_inventory(dir: &Path) -> io::Result<LocalInventory> {
    let mut inventory = LocalInventory::new();
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "download directory missing; empty inventory");
            return Ok(inventory);
        }
        Err(e) => return Err(e),
    };

    for entry in read_dir {
        let entry = entry?;
        let path = entry.path();
        let is_file = fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                tracing::debug!(name = ?raw, "skipping non UTF-8 file name");
                continue;
            }
        };
        let digest = match checksum::sha256_path(&path) {
            Ok(d) => Some(d),
            Err(e) => {
                tracing::error!(file = %name, error = %e, "checksum failed");
                None
            }
        };
        inventory.insert(name, digest);
    }

    tracing::debug!(
        dir = %dir.display(),
        files = inventory.len(),
        unreadable = inventory.unreadable(),
        "local inventory built"
    );
    Ok(inventory)
}
