//! CLI command implementations.

pub mod export;
pub mod init;
pub mod plan;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use tokensync_core::{
    discover_token_files, generate_change_set, read_token_files, ChangeSet, LocalVariables,
};
use tokensync_remote::{RemoteError, VariablesBackend};

use crate::manifest::TokensyncManifest;

/// Directory holding the token files: the explicit one, else the configured one.
pub(crate) fn tokens_dir(
    project_dir: &Path,
    manifest: &TokensyncManifest,
    explicit: Option<&Path>,
) -> PathBuf {
    explicit.map_or_else(|| project_dir.join(&manifest.tokens.dir), Path::to_path_buf)
}

/// Fetch the snapshot of `file_key`. A local store without a snapshot yet
/// counts as an empty file.
pub(crate) fn fetch_snapshot(
    backend: &dyn VariablesBackend,
    file_key: &str,
) -> Result<LocalVariables> {
    match backend.local_variables(file_key) {
        Err(RemoteError::SnapshotNotFound { .. }) => {
            info!("no snapshot stored for '{file_key}' yet, starting empty");
            Ok(LocalVariables::empty())
        }
        other => other.with_context(|| format!("fetching variables of file '{file_key}'")),
    }
}

/// Read every token file in `tokens_dir` and reconcile it against the store.
pub(crate) fn compute_change_set(
    backend: &dyn VariablesBackend,
    file_key: &str,
    tokens_dir: &Path,
) -> Result<ChangeSet> {
    let paths = discover_token_files(tokens_dir)
        .with_context(|| format!("listing token files in {}", tokens_dir.display()))?;
    if paths.is_empty() {
        warn!("no token files found in {}", tokens_dir.display());
    }
    let files = read_token_files(&paths)?;
    let snapshot = fetch_snapshot(backend, file_key)?;
    generate_change_set(&files, &snapshot).context("reconciling token files")
}
