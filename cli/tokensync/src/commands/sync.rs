//! `tokensync sync`: reconcile token files and submit the change-set.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;
use tokensync_core::ChangeSet;
use tokensync_remote::VariablesBackend;

use super::plan::print_plan;
use super::{compute_change_set, tokens_dir};
use crate::manifest::TokensyncManifest;

pub fn run(
    project_dir: &Path,
    manifest: &TokensyncManifest,
    tokens_dir_override: Option<&Path>,
    file_key: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let file_key = manifest.file_key(file_key)?;
    let backend = manifest.open_backend(project_dir)?;
    let dir = tokens_dir(project_dir, manifest, tokens_dir_override);
    let changes = compute_change_set(backend.as_ref(), &file_key, &dir)?;

    print_plan(&file_key, &changes);
    if changes.is_empty() {
        return Ok(());
    }
    if dry_run {
        println!("Dry run: nothing submitted.");
        return Ok(());
    }

    let id_map = submit(backend.as_ref(), &file_key, &changes)?;
    println!("Submitted {} changes.", changes.len());
    for (temp_id, real_id) in &id_map {
        println!("  {temp_id} -> {real_id}");
    }
    Ok(())
}

/// Post a change-set and return the temporary-to-real id map.
pub(crate) fn submit(
    backend: &dyn VariablesBackend,
    file_key: &str,
    changes: &ChangeSet,
) -> Result<BTreeMap<String, String>> {
    let response = backend
        .post_variables(file_key, changes)
        .with_context(|| format!("submitting changes to file '{file_key}'"))?;
    if response.error {
        bail!("variables store rejected the change-set (status {})", response.status);
    }
    info!(
        "change-set accepted, {} ids assigned",
        response.meta.temp_id_to_real_id.len()
    );
    Ok(response.meta.temp_id_to_real_id)
}
