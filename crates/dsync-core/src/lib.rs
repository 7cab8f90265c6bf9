//! Catalog sync: mirror the files a remote API advertises into a local
//! directory and expand gzip artifacts into an export directory.

pub mod checksum;
pub mod config;
pub mod decompress;
pub mod http;
pub mod inventory;
pub mod logging;
pub mod manifest;
pub mod names;
pub mod planner;
pub mod storage;
pub mod sync;
pub mod transfer;

pub use sync::{SyncEngine, SyncOptions, SyncReport};
