//! `tokensync plan`: show the change-set without submitting it.

use std::path::Path;

use anyhow::Result;
use tokensync_core::{format_color, ChangeAction, ChangeSet, VariableValue};

use super::{compute_change_set, tokens_dir};
use crate::manifest::TokensyncManifest;

pub fn run(
    project_dir: &Path,
    manifest: &TokensyncManifest,
    tokens_dir_override: Option<&Path>,
    file_key: Option<&str>,
    json: bool,
) -> Result<()> {
    let file_key = manifest.file_key(file_key)?;
    let backend = manifest.open_backend(project_dir)?;
    let dir = tokens_dir(project_dir, manifest, tokens_dir_override);
    let changes = compute_change_set(backend.as_ref(), &file_key, &dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
    } else {
        print_plan(&file_key, &changes);
    }
    Ok(())
}

pub(crate) fn print_plan(file_key: &str, changes: &ChangeSet) {
    if changes.is_empty() {
        println!("File '{file_key}' is already up to date.");
        return;
    }
    println!("Plan for file '{file_key}': {} changes", changes.len());
    for line in describe(changes) {
        println!("  {line}");
    }
}

fn symbol(action: ChangeAction) -> &'static str {
    match action {
        ChangeAction::Create => "+",
        ChangeAction::Update => "~",
        ChangeAction::Delete => "-",
    }
}

fn display_value(value: &VariableValue) -> String {
    match value {
        VariableValue::Alias(alias) => format!("-> {}", alias.id),
        VariableValue::Color(color) => format_color(color),
        VariableValue::Float(n) => n.to_string(),
        VariableValue::Boolean(b) => b.to_string(),
        VariableValue::String(s) => format!("{s:?}"),
    }
}

/// One human-readable line per change-set entry, in submission order.
pub(crate) fn describe(changes: &ChangeSet) -> Vec<String> {
    let mut lines = Vec::with_capacity(changes.len());
    for c in &changes.variable_collections {
        lines.push(format!(
            "{} collection {} (initial mode {})",
            symbol(c.action),
            c.name.as_deref().or(c.id.as_deref()).unwrap_or("?"),
            c.initial_mode_id.as_deref().unwrap_or("?"),
        ));
    }
    for m in &changes.variable_modes {
        lines.push(format!(
            "{} mode {} in {}",
            symbol(m.action),
            m.name.as_deref().or(m.id.as_deref()).unwrap_or("?"),
            m.variable_collection_id,
        ));
    }
    for v in &changes.variables {
        let kind = v
            .resolved_type
            .map(|t| format!(" ({t:?})"))
            .unwrap_or_default();
        lines.push(format!(
            "{} variable {}{kind} in {}",
            symbol(v.action),
            v.name.as_deref().or(v.id.as_deref()).unwrap_or("?"),
            v.variable_collection_id.as_deref().unwrap_or("?"),
        ));
    }
    for value in &changes.variable_mode_values {
        lines.push(format!(
            "= {} [{}] {}",
            value.variable_id,
            value.mode_id,
            display_value(&value.value)
        ));
    }
    lines
}
