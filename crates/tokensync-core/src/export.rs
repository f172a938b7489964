//! Export of remote variables back into token files.
//!
//! Produces one token document per collection and mode, the inverse of the
//! naming convention used when reading token files. Colors are written as hex
//! (or `rgba()` when translucent), aliases as `{group.token}` references.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};
use serde_json::Value;

use crate::color::format_color;
use crate::error::Result;
use crate::file_name::encode_file_name;
use crate::token::{FigmaExtensions, Token, TokenExtensions, TokenGroup, TokenKind, TokenValue};
use crate::variables::{LocalVariables, Variable, VariableValue};

/// Token documents keyed by file name (`<collection>.<mode>.json`).
pub type TokenDocuments = BTreeMap<String, TokenGroup>;

/// Build token documents from the modifiable variables of a snapshot.
pub fn token_files_from_variables(snapshot: &LocalVariables) -> Result<TokenDocuments> {
    let variables_by_id: HashMap<&str, &Variable> = snapshot
        .meta
        .variables
        .values()
        .map(|v| (v.id.as_str(), v))
        .collect();

    let mut documents = TokenDocuments::new();
    for variable in snapshot.meta.variables.values() {
        if variable.remote {
            continue;
        }
        let Some(collection) = snapshot
            .meta
            .variable_collections
            .get(&variable.variable_collection_id)
        else {
            warn!(
                "variable '{}' references unknown collection {}",
                variable.name, variable.variable_collection_id
            );
            continue;
        };
        if collection.remote {
            continue;
        }

        for mode in &collection.modes {
            let Some(value) = variable.values_by_mode.get(&mode.mode_id) else {
                continue;
            };
            let Some(token_value) = token_value(value, &variables_by_id) else {
                warn!(
                    "skipping '{}' in mode '{}': alias target not found",
                    variable.name, mode.name
                );
                continue;
            };

            let token = Token {
                kind: TokenKind::from_resolved_type(variable.resolved_type),
                value: token_value,
                description: variable.description.clone().filter(|d| !d.is_empty()),
                extensions: extensions(variable),
            };
            documents
                .entry(encode_file_name(&collection.name, &mode.name))
                .or_default()
                .insert_path(&variable.name, token);
        }
    }

    debug!("exported {} token files", documents.len());
    Ok(documents)
}

/// Render token documents as pretty-printed JSON text.
pub fn render_documents(documents: &TokenDocuments) -> Result<BTreeMap<String, String>> {
    documents
        .iter()
        .map(|(name, group)| {
            let json: Value = group.to_json()?;
            Ok((name.clone(), serde_json::to_string_pretty(&json)?))
        })
        .collect()
}

fn token_value(value: &VariableValue, variables_by_id: &HashMap<&str, &Variable>) -> Option<TokenValue> {
    Some(match value {
        VariableValue::Alias(alias) => {
            let target = variables_by_id.get(alias.id.as_str())?;
            TokenValue::String(format!("{{{}}}", target.name.replace('/', ".")))
        }
        VariableValue::Color(color) => TokenValue::String(format_color(color)),
        VariableValue::Boolean(b) => TokenValue::Boolean(*b),
        VariableValue::Float(n) => TokenValue::Number(*n),
        VariableValue::String(s) => TokenValue::String(s.clone()),
    })
}

fn extensions(variable: &Variable) -> Option<TokenExtensions> {
    let figma = FigmaExtensions {
        hidden_from_publishing: variable.hidden_from_publishing,
        scopes: variable.scopes.clone(),
        code_syntax: variable.code_syntax.clone(),
    };
    if figma.is_empty() {
        return None;
    }
    Some(TokenExtensions { figma: Some(figma) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::flatten::flatten;
    use crate::reconcile::{generate_change_set, TokenFile};
    use crate::variables::{ResolvedType, VariableCollection, VariableMode};
    use serde_json::json;

    fn collection(id: &str, name: &str, modes: &[(&str, &str)]) -> VariableCollection {
        VariableCollection {
            id: id.into(),
            name: name.into(),
            modes: modes
                .iter()
                .map(|(id, name)| VariableMode {
                    mode_id: id.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            default_mode_id: modes[0].0.into(),
            remote: false,
        }
    }

    fn variable(
        id: &str,
        name: &str,
        collection: &str,
        resolved_type: ResolvedType,
        values: &[(&str, VariableValue)],
    ) -> Variable {
        Variable {
            id: id.into(),
            name: name.into(),
            key: String::new(),
            variable_collection_id: collection.into(),
            resolved_type,
            values_by_mode: values
                .iter()
                .map(|(mode, value)| (mode.to_string(), value.clone()))
                .collect(),
            remote: false,
            description: None,
            hidden_from_publishing: None,
            scopes: None,
            code_syntax: None,
        }
    }

    fn sample() -> LocalVariables {
        let mut snapshot = LocalVariables::empty();
        for c in [
            collection("C:1", "primitives", &[("1:0", "light"), ("1:1", "dark")]),
            collection("C:2", "tokens", &[("2:0", "default")]),
        ] {
            snapshot.meta.variable_collections.insert(c.id.clone(), c);
        }

        let mut brand = variable(
            "V:1",
            "color/brand",
            "C:1",
            ResolvedType::Color,
            &[
                ("1:0", VariableValue::Color(Color::rgba(1.0, 0.7450980392156863, 0.08627450980392157, 1.0))),
                ("1:1", VariableValue::Color(Color::rgba(0.0, 0.0, 0.0, 0.5))),
            ],
        );
        brand.description = Some("Brand color".into());
        brand.scopes = Some(vec!["ALL_FILLS".into()]);

        for v in [
            brand,
            variable(
                "V:2",
                "spacing/1",
                "C:1",
                ResolvedType::Float,
                &[("1:0", VariableValue::Float(8.0)), ("1:1", VariableValue::Float(8.0))],
            ),
            variable(
                "V:3",
                "surface/brand",
                "C:2",
                ResolvedType::Color,
                &[("2:0", VariableValue::alias("V:1"))],
            ),
            variable(
                "V:4",
                "flags/enabled",
                "C:2",
                ResolvedType::Boolean,
                &[("2:0", VariableValue::Boolean(true))],
            ),
        ] {
            snapshot.meta.variables.insert(v.id.clone(), v);
        }
        snapshot
    }

    #[test]
    fn exports_one_document_per_mode() {
        let documents = token_files_from_variables(&sample()).unwrap();
        let names: Vec<_> = documents.keys().cloned().collect();
        assert_eq!(
            names,
            vec![
                "primitives.dark.json",
                "primitives.light.json",
                "tokens.default.json"
            ]
        );

        assert_eq!(
            documents["primitives.light.json"].to_json().unwrap(),
            json!({
                "color": { "brand": {
                    "$type": "color",
                    "$value": "#ffbe16",
                    "$description": "Brand color",
                    "$extensions": { "com.figma": { "scopes": ["ALL_FILLS"] } }
                } },
                "spacing": { "1": { "$type": "number", "$value": 8 } }
            })
        );
        assert_eq!(
            documents["primitives.dark.json"].to_json().unwrap()["color"]["brand"]["$value"],
            json!("rgba(0, 0, 0, 0.5)")
        );
        assert_eq!(
            documents["tokens.default.json"].to_json().unwrap(),
            json!({
                "surface": { "brand": { "$type": "color", "$value": "{color.brand}" } },
                "flags": { "enabled": { "$type": "boolean", "$value": true } }
            })
        );
    }

    #[test]
    fn foreign_variables_are_not_exported() {
        let mut snapshot = sample();
        snapshot.meta.variables.get_mut("V:4").unwrap().remote = true;
        snapshot.meta.variable_collections.get_mut("C:1").unwrap().remote = true;

        let documents = token_files_from_variables(&snapshot).unwrap();
        let names: Vec<_> = documents.keys().cloned().collect();
        assert_eq!(names, vec!["tokens.default.json"]);
        assert_eq!(
            documents["tokens.default.json"].to_json().unwrap(),
            json!({ "surface": { "brand": { "$type": "color", "$value": "{color.brand}" } } })
        );
    }

    #[test]
    fn dangling_alias_is_skipped() {
        let mut snapshot = sample();
        snapshot.meta.variables.remove("V:1");
        let documents = token_files_from_variables(&snapshot).unwrap();
        assert_eq!(
            documents["tokens.default.json"].to_json().unwrap(),
            json!({ "flags": { "enabled": { "$type": "boolean", "$value": true } } })
        );
    }

    #[test]
    fn exported_tokens_reconcile_to_nothing() {
        let snapshot = sample();
        let documents = token_files_from_variables(&snapshot).unwrap();
        let files: Vec<TokenFile> = documents
            .iter()
            .map(|(name, group)| TokenFile::new(name, flatten(group)))
            .collect();

        let changes = generate_change_set(&files, &snapshot).unwrap();
        assert!(changes.is_empty(), "unexpected changes: {changes:?}");
    }

    #[test]
    fn rendered_documents_are_pretty_json() {
        let rendered = render_documents(&token_files_from_variables(&sample()).unwrap()).unwrap();
        let text = &rendered["tokens.default.json"];
        assert!(text.starts_with("{\n  \"surface\""));
        let reparsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(reparsed["flags"]["enabled"]["$value"], json!(true));
    }

    #[test]
    fn whole_number_values_are_written_as_integers() {
        let rendered = render_documents(&token_files_from_variables(&sample()).unwrap()).unwrap();
        let text = &rendered["primitives.light.json"];
        assert!(text.contains("\"$value\": 8\n"), "got {text}");
        assert!(!text.contains("8.0"));
    }
}
