//! `tokensync export`: write token files from the store's variables.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokensync_core::{render_documents, token_files_from_variables};
use tokensync_remote::VariablesBackend;

use super::fetch_snapshot;
use crate::manifest::TokensyncManifest;

pub fn run(
    project_dir: &Path,
    manifest: &TokensyncManifest,
    output_dir: Option<&Path>,
    file_key: Option<&str>,
) -> Result<()> {
    let file_key = manifest.file_key(file_key)?;
    let backend = manifest.open_backend(project_dir)?;
    let output_dir =
        output_dir.map_or_else(|| project_dir.join(&manifest.tokens.export_dir), Path::to_path_buf);

    let written = export_to(backend.as_ref(), &file_key, &output_dir)?;
    println!("Wrote {} token files to {}", written.len(), output_dir.display());
    for path in &written {
        println!("  {}", path.display());
    }
    Ok(())
}

/// Write one token file per collection and mode into `output_dir`.
pub(crate) fn export_to(
    backend: &dyn VariablesBackend,
    file_key: &str,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let snapshot = fetch_snapshot(backend, file_key)?;
    let documents = token_files_from_variables(&snapshot)?;
    let rendered = render_documents(&documents)?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let mut written = Vec::with_capacity(rendered.len());
    for (name, text) in rendered {
        let path = output_dir.join(name);
        fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
