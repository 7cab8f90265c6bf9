//! SHA-256 content digests for inventory entries.
//!
//! Files are streamed through the hasher in fixed-size chunks, so memory use
//! stays bounded regardless of file size.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read size used while hashing.
pub const CHUNK_SIZE: usize = 4096;

/// Length of a hex-encoded SHA-256 digest.
pub const HEX_DIGEST_LEN: usize = 64;

/// Hash everything `reader` yields until EOF and return the lowercase hex digest.
pub fn sha256_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute SHA-256 of the file at `path`.
pub fn sha256_path(path: &Path) -> io::Result<String> {
    let f = File::open(path)?;
    sha256_reader(f)
}
