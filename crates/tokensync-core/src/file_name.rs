//! Collection and mode names derived from token file names.
//!
//! Token files are named `<collection>.<mode>.json`.

use std::path::Path;

/// The collection and mode a token file targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTarget {
    pub collection_name: String,
    pub mode_name: String,
}

/// Split a file's base name into collection and mode.
///
/// Only the first two `.`-separated segments are used. A name with a single
/// segment yields an empty mode name.
pub fn decode_file_name(base_name: &str) -> FileTarget {
    let mut segments = base_name.split('.');
    FileTarget {
        collection_name: segments.next().unwrap_or_default().to_string(),
        mode_name: segments.next().unwrap_or_default().to_string(),
    }
}

/// Decode the base name of a path.
pub fn decode_path(path: &Path) -> FileTarget {
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    decode_file_name(&base)
}

/// The file name a collection/mode pair is exported to.
pub fn encode_file_name(collection_name: &str, mode_name: &str) -> String {
    format!("{collection_name}.{mode_name}.json")
}
