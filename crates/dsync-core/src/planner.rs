//! Diff planner: which catalog entries still need to be fetched.
//!
//! The comparison is by name only. A local file whose content differs from
//! the remote one is never fetched again.

use crate::inventory::LocalInventory;
use crate::manifest::{Catalog, RemoteFileDescriptor};

/// A catalog entry scheduled for download.
pub type WorkItem = RemoteFileDescriptor;

/// Entries of `catalog` whose `file_name` is not in `inventory`, in catalog order.
pub fn plan(catalog: &Catalog, inventory: &LocalInventory) -> Vec<WorkItem> {
    catalog
        .iter()
        .filter(|d| !inventory.contains(&d.file_name))
        .cloned()
        .collect()
}
