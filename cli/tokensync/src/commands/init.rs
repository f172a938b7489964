//! `tokensync init`: project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::manifest::{TokensyncManifest, MANIFEST_FILE};

/// Set up a tokensync project in `dir` (the current directory if omitted).
pub fn run(cwd: &Path, dir: Option<&str>) -> Result<()> {
    let project_dir = dir.map_or_else(|| cwd.to_path_buf(), |d| cwd.join(d));
    let name = project_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tokens".to_string());
    create_project(&project_dir, &name)
}

pub(crate) fn create_project(project_dir: &Path, name: &str) -> Result<()> {
    let manifest_path = project_dir.join(MANIFEST_FILE);
    if manifest_path.exists() {
        bail!("{} already exists", manifest_path.display());
    }

    fs::create_dir_all(project_dir.join("tokens")).context("creating tokens/ directory")?;
    fs::write(&manifest_path, TokensyncManifest::template(name))
        .with_context(|| format!("writing {MANIFEST_FILE}"))?;

    println!("Created tokensync project '{name}'");
    println!("  {}", manifest_path.display());
    println!("  {}", project_dir.join("tokens").display());

    Ok(())
}
