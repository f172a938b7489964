//! Reading token files from disk.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{Result, SyncError};
use crate::flatten::flatten;
use crate::reconcile::TokenFile;
use crate::token::TokenGroup;

/// List the `*.json` files directly inside `dir`, sorted by file name.
pub fn discover_token_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SyncError::NotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Parse one token document and flatten it.
pub fn parse_token_file(path: &Path, text: &str) -> Result<TokenFile> {
    let document: serde_json::Value =
        serde_json::from_str(text).map_err(|source| SyncError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let tree = TokenGroup::from_json(&document)?;
    let tokens = flatten(&tree);
    debug!("{}: {} tokens", path.display(), tokens.len());
    Ok(TokenFile::new(path, tokens))
}

/// Read, parse, and flatten token files, keeping the given order.
pub fn read_token_files(paths: &[PathBuf]) -> Result<Vec<TokenFile>> {
    let files = paths
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => SyncError::NotFound { path: path.clone() },
                _ => SyncError::Io(e),
            })?;
            parse_token_file(path, &text)
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        "Read tokens files: {:?}",
        files.iter().map(|f| f.path.display().to_string()).collect::<Vec<_>>()
    );
    Ok(files)
}
