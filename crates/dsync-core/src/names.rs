//! File name rules for catalog entries and exported artifacts.

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Suffix removed from gzip artifacts when they are expanded into the export directory.
pub const GZIP_SUFFIX: &str = ".gz";

/// Returns true if `name` can be joined onto a directory without escaping it.
///
/// Rejects empty names, `.` and `..`, path separators, NUL and other control
/// characters, names longer than 255 bytes, and the engine's temp and rotated-log
/// directory names.
pub fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." || name.len() > NAME_MAX {
        return false;
    }
    if name == crate::storage::TEMP_DIR_NAME || name == crate::logging::ROTATED_DIR_NAME {
        return false;
    }
    !name
        .chars()
        .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control())
}

/// Name of the expanded artifact for a compressed file called `name`.
///
/// Strips exactly one trailing `.gz`. Names without that suffix, or that
/// would become empty, are returned unchanged.
pub fn export_file_name(name: &str) -> &str {
    match name.strip_suffix(GZIP_SUFFIX) {
        Some(stem) if !stem.is_empty() => stem,
        _ => name,
    }
}
