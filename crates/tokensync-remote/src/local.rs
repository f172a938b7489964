//! Local filesystem variables store.
//!
//! Layout:
//! ```text
//! <root>/
//!   <file-key>.json     # a LocalVariables snapshot
//! ```
//!
//! Posting a change-set applies it the way the REST API does: entities
//! created in the change-set get generated ids, and later changes may refer
//! to them by their temporary id. Mode temporary ids are scoped to their
//! collection, since every collection usually has a mode of the same name.
//! The change-set is applied to a copy of the snapshot and written back only
//! when every change succeeded.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use log::{debug, info};
use tokensync_core::variables::{
    PostVariablesMeta, VariableChange, VariableCollectionChange, VariableModeChange,
    VariableModeValue,
};
use tokensync_core::{
    ChangeAction, ChangeSet, LocalVariables, PostVariablesResponse, Variable, VariableCollection,
    VariableMode, VariableValue,
};
use uuid::Uuid;

use crate::client::VariablesBackend;
use crate::error::{RemoteError, Result};

/// Name given to the mode every new collection starts with.
const DEFAULT_MODE_NAME: &str = "Mode 1";

/// A variables store kept as JSON snapshots under a directory.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStore { root: root.into() }
    }

    fn snapshot_path(&self, file_key: &str) -> PathBuf {
        self.root.join(format!("{file_key}.json"))
    }

    /// Write a snapshot for `file_key`, replacing any existing one.
    pub fn save(&self, file_key: &str, snapshot: &LocalVariables) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let text = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(self.snapshot_path(file_key), text)?;
        Ok(())
    }

    fn load_or_empty(&self, file_key: &str) -> Result<LocalVariables> {
        match self.local_variables(file_key) {
            Err(RemoteError::SnapshotNotFound { .. }) => Ok(LocalVariables::empty()),
            other => other,
        }
    }
}

impl VariablesBackend for LocalStore {
    fn local_variables(&self, file_key: &str) -> Result<LocalVariables> {
        let path = self.snapshot_path(file_key);
        if !path.is_file() {
            return Err(RemoteError::SnapshotNotFound {
                file_key: file_key.to_string(),
            });
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Apply a change-set. A file without a snapshot starts out empty.
    fn post_variables(&self, file_key: &str, changes: &ChangeSet) -> Result<PostVariablesResponse> {
        let mut snapshot = self.load_or_empty(file_key)?;
        let temp_id_to_real_id = apply_change_set(&mut snapshot, changes)?;
        self.save(file_key, &snapshot)?;
        info!(
            "applied {} changes to local store '{file_key}'",
            changes.len()
        );

        Ok(PostVariablesResponse {
            status: 200,
            error: false,
            meta: PostVariablesMeta { temp_id_to_real_id },
        })
    }
}

/// Apply `changes` to `snapshot`, returning the temporary-to-real id map.
///
/// On error `snapshot` is left untouched.
pub fn apply_change_set(
    snapshot: &mut LocalVariables,
    changes: &ChangeSet,
) -> Result<BTreeMap<String, String>> {
    let mut apply = Apply {
        state: snapshot.clone(),
        collections: HashMap::new(),
        modes: HashMap::new(),
        variables: HashMap::new(),
        temp_id_to_real_id: BTreeMap::new(),
    };

    for change in &changes.variable_collections {
        apply.collection(change)?;
    }
    for change in &changes.variable_modes {
        apply.mode(change)?;
    }
    for change in &changes.variables {
        apply.variable(change)?;
    }
    for value in &changes.variable_mode_values {
        apply.mode_value(value)?;
    }

    *snapshot = apply.state;
    Ok(apply.temp_id_to_real_id)
}

fn required<'a>(field: &'a Option<String>, what: &str) -> Result<&'a str> {
    field.as_deref().ok_or_else(|| RemoteError::InvalidChange {
        detail: format!("{what} is required"),
    })
}

struct Apply {
    state: LocalVariables,
    collections: HashMap<String, String>,
    /// Keyed by (real collection id, temporary mode id).
    modes: HashMap<(String, String), String>,
    variables: HashMap<String, String>,
    temp_id_to_real_id: BTreeMap<String, String>,
}

impl Apply {
    fn collection_id(&self, id: &str) -> Result<String> {
        if self.state.meta.variable_collections.contains_key(id) {
            return Ok(id.to_string());
        }
        self.collections
            .get(id)
            .cloned()
            .ok_or_else(|| RemoteError::UnknownTempId { id: id.to_string() })
    }

    fn collection_mut(&mut self, id: &str) -> Result<&mut VariableCollection> {
        self.state
            .meta
            .variable_collections
            .get_mut(id)
            .ok_or_else(|| RemoteError::UnknownTempId { id: id.to_string() })
    }

    fn mode_id(&self, collection_id: &str, id: &str) -> Result<String> {
        let real = self
            .state
            .meta
            .variable_collections
            .get(collection_id)
            .is_some_and(|c| c.modes.iter().any(|m| m.mode_id == id));
        if real {
            return Ok(id.to_string());
        }
        self.modes
            .get(&(collection_id.to_string(), id.to_string()))
            .cloned()
            .ok_or_else(|| RemoteError::UnknownTempId { id: id.to_string() })
    }

    fn variable_id(&self, id: &str) -> Result<String> {
        if self.state.meta.variables.contains_key(id) {
            return Ok(id.to_string());
        }
        self.variables
            .get(id)
            .cloned()
            .ok_or_else(|| RemoteError::UnknownTempId { id: id.to_string() })
    }

    fn collection(&mut self, change: &VariableCollectionChange) -> Result<()> {
        match change.action {
            ChangeAction::Create => {
                let temp_id = required(&change.id, "collection id")?;
                let name = change.name.as_deref().unwrap_or(temp_id);
                let real_id = format!("VariableCollectionId:{}", Uuid::new_v4());
                let mode_id = Uuid::new_v4().to_string();
                debug!("create collection '{name}' as {real_id}");

                if let Some(initial) = &change.initial_mode_id {
                    self.modes
                        .insert((real_id.clone(), initial.clone()), mode_id.clone());
                    self.temp_id_to_real_id
                        .insert(initial.clone(), mode_id.clone());
                }
                self.collections.insert(temp_id.to_string(), real_id.clone());
                self.temp_id_to_real_id
                    .insert(temp_id.to_string(), real_id.clone());
                self.state.meta.variable_collections.insert(
                    real_id.clone(),
                    VariableCollection {
                        id: real_id,
                        name: name.to_string(),
                        modes: vec![VariableMode {
                            mode_id: mode_id.clone(),
                            name: DEFAULT_MODE_NAME.to_string(),
                        }],
                        default_mode_id: mode_id,
                        remote: false,
                    },
                );
            }
            ChangeAction::Update => {
                let id = self.collection_id(required(&change.id, "collection id")?)?;
                if let Some(name) = &change.name {
                    self.collection_mut(&id)?.name = name.clone();
                }
            }
            ChangeAction::Delete => {
                let id = self.collection_id(required(&change.id, "collection id")?)?;
                self.state.meta.variable_collections.remove(&id);
                self.state
                    .meta
                    .variables
                    .retain(|_, v| v.variable_collection_id != id);
            }
        }
        Ok(())
    }

    fn mode(&mut self, change: &VariableModeChange) -> Result<()> {
        let collection_id = self.collection_id(&change.variable_collection_id)?;
        match change.action {
            ChangeAction::Create => {
                let temp_id = required(&change.id, "mode id")?;
                let name = change.name.as_deref().unwrap_or(temp_id).to_string();
                let real_id = Uuid::new_v4().to_string();
                debug!("create mode '{name}' in {collection_id}");

                self.collection_mut(&collection_id)?.modes.push(VariableMode {
                    mode_id: real_id.clone(),
                    name,
                });
                self.modes
                    .insert((collection_id, temp_id.to_string()), real_id.clone());
                self.temp_id_to_real_id.insert(temp_id.to_string(), real_id);
            }
            ChangeAction::Update => {
                let id = self.mode_id(&collection_id, required(&change.id, "mode id")?)?;
                if let Some(name) = &change.name {
                    let collection = self.collection_mut(&collection_id)?;
                    if let Some(mode) = collection.modes.iter_mut().find(|m| m.mode_id == id) {
                        mode.name = name.clone();
                    }
                }
            }
            ChangeAction::Delete => {
                let id = self.mode_id(&collection_id, required(&change.id, "mode id")?)?;
                self.collection_mut(&collection_id)?
                    .modes
                    .retain(|m| m.mode_id != id);
                for variable in self.state.meta.variables.values_mut() {
                    variable.values_by_mode.remove(&id);
                }
            }
        }
        Ok(())
    }

    fn variable(&mut self, change: &VariableChange) -> Result<()> {
        match change.action {
            ChangeAction::Create => {
                let temp_id = required(&change.id, "variable id")?;
                if self.variables.contains_key(temp_id) {
                    return Err(RemoteError::InvalidChange {
                        detail: format!("temporary id '{temp_id}' is used twice"),
                    });
                }
                let collection_id = self.collection_id(required(
                    &change.variable_collection_id,
                    "variableCollectionId",
                )?)?;
                let resolved_type = change.resolved_type.ok_or_else(|| RemoteError::InvalidChange {
                    detail: format!("resolvedType is required for '{temp_id}'"),
                })?;
                let real_id = format!("VariableID:{}", Uuid::new_v4());
                debug!("create variable '{temp_id}' as {real_id}");

                self.state.meta.variables.insert(
                    real_id.clone(),
                    Variable {
                        id: real_id.clone(),
                        name: change.name.as_deref().unwrap_or(temp_id).to_string(),
                        key: Uuid::new_v4().simple().to_string(),
                        variable_collection_id: collection_id,
                        resolved_type,
                        values_by_mode: BTreeMap::new(),
                        remote: false,
                        description: change.description.clone(),
                        hidden_from_publishing: change.hidden_from_publishing,
                        scopes: change.scopes.clone(),
                        code_syntax: change.code_syntax.clone(),
                    },
                );
                self.variables.insert(temp_id.to_string(), real_id.clone());
                self.temp_id_to_real_id.insert(temp_id.to_string(), real_id);
            }
            ChangeAction::Update => {
                let id = self.variable_id(required(&change.id, "variable id")?)?;
                let variable = self
                    .state
                    .meta
                    .variables
                    .get_mut(&id)
                    .ok_or_else(|| RemoteError::UnknownTempId { id: id.clone() })?;
                if let Some(name) = &change.name {
                    variable.name = name.clone();
                }
                if change.description.is_some() {
                    variable.description = change.description.clone();
                }
                if change.hidden_from_publishing.is_some() {
                    variable.hidden_from_publishing = change.hidden_from_publishing;
                }
                if change.scopes.is_some() {
                    variable.scopes = change.scopes.clone();
                }
                if change.code_syntax.is_some() {
                    variable.code_syntax = change.code_syntax.clone();
                }
            }
            ChangeAction::Delete => {
                let id = self.variable_id(required(&change.id, "variable id")?)?;
                self.state.meta.variables.remove(&id);
            }
        }
        Ok(())
    }

    fn mode_value(&mut self, change: &VariableModeValue) -> Result<()> {
        let variable_id = self.variable_id(&change.variable_id)?;
        let collection_id = self
            .state
            .meta
            .variables
            .get(&variable_id)
            .map(|v| v.variable_collection_id.clone())
            .ok_or_else(|| RemoteError::UnknownTempId {
                id: change.variable_id.clone(),
            })?;
        let mode_id = self.mode_id(&collection_id, &change.mode_id)?;

        let value = match &change.value {
            VariableValue::Alias(alias) => VariableValue::alias(self.variable_id(&alias.id)?),
            other => other.clone(),
        };

        if let Some(variable) = self.state.meta.variables.get_mut(&variable_id) {
            variable.values_by_mode.insert(mode_id, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokensync_core::{generate_change_set, Color, Token, TokenFile, TokenKind};

    fn file(name: &str, tokens: Vec<(&str, Token)>) -> TokenFile {
        TokenFile::new(name, tokens.into_iter().collect())
    }

    fn token_files() -> Vec<TokenFile> {
        vec![
            file(
                "primitives.light.json",
                vec![
                    ("spacing/1", Token::number(8.0)),
                    ("color/brand", Token::color("#ffbe16")),
                ],
            ),
            file(
                "primitives.dark.json",
                vec![
                    ("spacing/1", Token::number(8.0)),
                    ("color/brand", Token::color("#010101")),
                ],
            ),
            file(
                "tokens.default.json",
                vec![(
                    "surface/brand",
                    Token::alias(TokenKind::Color, "color.brand"),
                )],
            ),
        ]
    }

    fn collection_named<'a>(snapshot: &'a LocalVariables, name: &str) -> &'a VariableCollection {
        snapshot
            .meta
            .variable_collections
            .values()
            .find(|c| c.name == name)
            .unwrap()
    }

    fn variable_named<'a>(snapshot: &'a LocalVariables, name: &str) -> &'a Variable {
        snapshot
            .meta
            .variables
            .values()
            .find(|v| v.name == name)
            .unwrap()
    }

    #[test]
    fn missing_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(matches!(
            store.local_variables("abc"),
            Err(RemoteError::SnapshotNotFound { .. })
        ));
    }

    #[test]
    fn snapshots_live_under_the_store_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("remote"));
        let changes = generate_change_set(&token_files(), &LocalVariables::empty()).unwrap();

        store.post_variables("abc", &changes).unwrap();
        assert!(dir.path().join("remote/abc.json").is_file());
        assert!(store.local_variables("abc").is_ok());
    }

    #[test]
    fn initial_sync_creates_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let changes = generate_change_set(&token_files(), &LocalVariables::empty()).unwrap();

        let response = store.post_variables("abc", &changes).unwrap();
        assert_eq!(response.status, 200);
        assert!(!response.error);

        let snapshot = store.local_variables("abc").unwrap();
        let primitives = collection_named(&snapshot, "primitives");
        let mode_names: Vec<_> = primitives.modes.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(mode_names, vec!["light", "dark"]);
        assert_eq!(primitives.default_mode_id, primitives.modes[0].mode_id);

        let brand = variable_named(&snapshot, "color/brand");
        assert_eq!(brand.variable_collection_id, primitives.id);
        assert_eq!(
            brand.values_by_mode[&primitives.modes[0].mode_id],
            VariableValue::Color(Color::rgb(1.0, 0.7451, 0.08627))
        );

        let tokens = collection_named(&snapshot, "tokens");
        let surface = variable_named(&snapshot, "surface/brand");
        assert_eq!(
            surface.values_by_mode[&tokens.modes[0].mode_id],
            VariableValue::alias(brand.id.clone())
        );

        let map = &response.meta.temp_id_to_real_id;
        assert_eq!(map["primitives"], primitives.id);
        assert_eq!(map["color/brand"], brand.id);
        assert_eq!(map["dark"], primitives.modes[1].mode_id);
    }

    #[test]
    fn reconcile_apply_reconcile_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let files = token_files();

        let first = generate_change_set(&files, &LocalVariables::empty()).unwrap();
        assert!(!first.is_empty());
        store.post_variables("abc", &first).unwrap();

        let snapshot = store.local_variables("abc").unwrap();
        let second = generate_change_set(&files, &snapshot).unwrap();
        assert!(second.is_empty(), "unexpected changes: {second:?}");
    }

    #[test]
    fn changed_value_is_applied_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let mut files = token_files();
        store
            .post_variables("abc", &generate_change_set(&files, &LocalVariables::empty()).unwrap())
            .unwrap();
        let before = store.local_variables("abc").unwrap();

        files[0] = file(
            "primitives.light.json",
            vec![
                ("spacing/1", Token::number(12.0)),
                ("color/brand", Token::color("#ffbe16")),
            ],
        );
        let changes = generate_change_set(&files, &before).unwrap();
        assert_eq!(changes.len(), 1);
        let response = store.post_variables("abc", &changes).unwrap();
        assert!(response.meta.temp_id_to_real_id.is_empty());

        let after = store.local_variables("abc").unwrap();
        assert_eq!(after.meta.variables.len(), before.meta.variables.len());
        let light = &collection_named(&after, "primitives").modes[0].mode_id;
        assert_eq!(
            variable_named(&after, "spacing/1").values_by_mode[light],
            VariableValue::Float(12.0)
        );
    }

    #[test]
    fn unknown_temp_id_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store.save("abc", &LocalVariables::empty()).unwrap();

        let mut changes = generate_change_set(&token_files(), &LocalVariables::empty()).unwrap();
        changes.variable_mode_values.push(VariableModeValue {
            variable_id: "nope".into(),
            mode_id: "light".into(),
            value: VariableValue::Float(1.0),
        });

        match store.post_variables("abc", &changes) {
            Err(RemoteError::UnknownTempId { id }) => assert_eq!(id, "nope"),
            other => panic!("expected unknown id, got {other:?}"),
        }
        assert_eq!(store.local_variables("abc").unwrap(), LocalVariables::empty());
    }

    #[test]
    fn mode_temp_ids_are_scoped_by_collection() {
        let mut snapshot = LocalVariables::empty();
        let changes = generate_change_set(
            &[
                file("a.mode1.json", vec![("x", Token::number(1.0))]),
                file("b.mode1.json", vec![("y", Token::number(2.0))]),
            ],
            &snapshot,
        )
        .unwrap();
        apply_change_set(&mut snapshot, &changes).unwrap();

        let a = collection_named(&snapshot, "a");
        let b = collection_named(&snapshot, "b");
        assert_ne!(a.modes[0].mode_id, b.modes[0].mode_id);
        assert_eq!(
            variable_named(&snapshot, "y").values_by_mode[&b.modes[0].mode_id],
            VariableValue::Float(2.0)
        );
    }

    #[test]
    fn created_variables_keep_metadata() {
        let mut snapshot = LocalVariables::empty();
        let mut token = Token::number(4.0);
        token.description = Some("Small gap".into());
        let changes =
            generate_change_set(&[file("sizes.base.json", vec![("gap", token)])], &snapshot).unwrap();
        apply_change_set(&mut snapshot, &changes).unwrap();

        assert_eq!(
            variable_named(&snapshot, "gap").description.as_deref(),
            Some("Small gap")
        );
    }
}
