//! Reconciliation of token files against a remote variables snapshot.
//!
//! Given the flattened tokens of every token file and the current remote
//! state, [`generate_change_set`] computes the creates and updates needed to
//! make the remote match the files. Values that already match are never
//! resubmitted, so running again after the change-set has been applied
//! produces an empty change-set.
//!
//! Entities whose id is not yet known are referred to by a temporary id:
//! the collection name for collections, the mode name for modes and the
//! token path for variables. The remote side maps them to real ids when the
//! change-set is applied.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use log::{debug, info};

use crate::error::{Result, SyncError};
use crate::file_name::decode_path;
use crate::flatten::FlattenedTokens;
use crate::resolve::{resolve_value, resolved_type, VariablesByCollection};
use crate::token::Token;
use crate::variables::{
    ChangeAction, ChangeSet, LocalVariables, Variable, VariableChange, VariableCollection,
    VariableCollectionChange, VariableModeChange, VariableModeValue,
};

/// The flattened tokens read from one file.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenFile {
    /// Path of the file; its base name selects collection and mode.
    pub path: PathBuf,
    pub tokens: FlattenedTokens,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>, tokens: FlattenedTokens) -> Self {
        TokenFile {
            path: path.into(),
            tokens,
        }
    }
}

/// Lookup tables over the modifiable part of a remote snapshot.
///
/// Collections and variables flagged `remote` belong to another file and are
/// left out entirely.
#[derive(Debug)]
pub struct RemoteIndex<'a> {
    collections_by_name: HashMap<&'a str, &'a VariableCollection>,
    variables: VariablesByCollection<'a>,
}

impl<'a> RemoteIndex<'a> {
    /// Index a snapshot.
    ///
    /// Fails with [`SyncError::DuplicateCollectionName`] when two modifiable
    /// collections share a name.
    pub fn build(snapshot: &'a LocalVariables) -> Result<Self> {
        let mut collections_by_name = HashMap::new();
        for collection in snapshot.meta.variable_collections.values() {
            if collection.remote {
                continue;
            }
            if collections_by_name
                .insert(collection.name.as_str(), collection)
                .is_some()
            {
                return Err(SyncError::DuplicateCollectionName(collection.name.clone()));
            }
        }

        let mut variables = VariablesByCollection::new();
        for variable in snapshot.meta.variables.values() {
            if variable.remote {
                continue;
            }
            variables
                .entry(variable.variable_collection_id.as_str())
                .or_default()
                .insert(variable.name.as_str(), variable);
        }

        Ok(RemoteIndex {
            collections_by_name,
            variables,
        })
    }

    /// Modifiable collection with the given name.
    pub fn collection(&self, name: &str) -> Option<&'a VariableCollection> {
        self.collections_by_name.get(name).copied()
    }

    /// Modifiable variable with the given name in a collection.
    pub fn variable(&self, collection_id: &str, name: &str) -> Option<&'a Variable> {
        self.variables
            .get(collection_id)
            .and_then(|by_name| by_name.get(name))
            .copied()
    }

    /// Names of the modifiable collections, sorted.
    pub fn collection_names(&self) -> Vec<&'a str> {
        let mut names: Vec<_> = self.collections_by_name.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn variables(&self) -> &VariablesByCollection<'a> {
        &self.variables
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum QueuedKind {
    Collection,
    Mode,
    Variable,
}

/// A change-set under construction, with an index of the creates queued so
/// far so repeated entities across mode files are only created once.
#[derive(Debug, Default)]
struct ChangeSetBuilder {
    changes: ChangeSet,
    created: HashSet<(QueuedKind, String, String)>,
    /// Initial mode temp id of each collection created in this change-set.
    initial_modes: HashMap<String, String>,
}

impl ChangeSetBuilder {
    fn is_created(&self, kind: QueuedKind, collection_id: &str, id: &str) -> bool {
        self.created
            .contains(&(kind, collection_id.to_string(), id.to_string()))
    }

    fn mark_created(&mut self, kind: QueuedKind, collection_id: &str, id: &str) {
        self.created
            .insert((kind, collection_id.to_string(), id.to_string()));
    }

    /// Queue a new collection whose automatically created initial mode is
    /// renamed to `mode_name`.
    fn create_collection(&mut self, collection_id: &str, mode_name: &str) {
        if self.is_created(QueuedKind::Collection, collection_id, collection_id) {
            return;
        }
        debug!("queue CREATE collection '{collection_id}' (initial mode '{mode_name}')");
        self.mark_created(QueuedKind::Collection, collection_id, collection_id);
        self.mark_created(QueuedKind::Mode, collection_id, mode_name);
        self.initial_modes
            .insert(collection_id.to_string(), mode_name.to_string());

        self.changes
            .variable_collections
            .push(VariableCollectionChange {
                action: ChangeAction::Create,
                id: Some(collection_id.to_string()),
                name: Some(collection_id.to_string()),
                initial_mode_id: Some(mode_name.to_string()),
            });
        self.changes.variable_modes.push(VariableModeChange {
            action: ChangeAction::Update,
            id: Some(mode_name.to_string()),
            name: Some(mode_name.to_string()),
            variable_collection_id: collection_id.to_string(),
        });
    }

    fn create_mode(&mut self, collection_id: &str, mode_name: &str) {
        if self.is_created(QueuedKind::Mode, collection_id, mode_name) {
            return;
        }
        debug!("queue CREATE mode '{mode_name}' in collection '{collection_id}'");
        self.mark_created(QueuedKind::Mode, collection_id, mode_name);
        self.changes.variable_modes.push(VariableModeChange {
            action: ChangeAction::Create,
            id: Some(mode_name.to_string()),
            name: Some(mode_name.to_string()),
            variable_collection_id: collection_id.to_string(),
        });
    }

    fn create_variable(&mut self, collection_id: &str, name: &str, token: &Token) {
        if self.is_created(QueuedKind::Variable, collection_id, name) {
            return;
        }
        debug!("queue CREATE variable '{name}' in collection '{collection_id}'");
        self.mark_created(QueuedKind::Variable, collection_id, name);

        let figma = token.figma_extensions();
        self.changes.variables.push(VariableChange {
            action: ChangeAction::Create,
            id: Some(name.to_string()),
            name: Some(name.to_string()),
            variable_collection_id: Some(collection_id.to_string()),
            resolved_type: Some(resolved_type(token)),
            description: token.description.clone(),
            hidden_from_publishing: figma.and_then(|f| f.hidden_from_publishing),
            scopes: figma.and_then(|f| f.scopes.clone()),
            code_syntax: figma.and_then(|f| f.code_syntax.clone()),
        });
    }
}

/// Compute the change-set that brings `snapshot` in line with `files`.
///
/// Files are processed in the given order and tokens in file order; the
/// entries of each change-set sequence follow that order.
pub fn generate_change_set(files: &[TokenFile], snapshot: &LocalVariables) -> Result<ChangeSet> {
    let index = RemoteIndex::build(snapshot)?;
    info!(
        "Local variable collections in file: {:?}",
        index.collection_names()
    );

    let mut builder = ChangeSetBuilder::default();
    for file in files {
        reconcile_file(file, &index, &mut builder)?;
    }

    let changes = builder.changes;
    info!(
        "change-set: {} collections, {} modes, {} variables, {} mode values",
        changes.variable_collections.len(),
        changes.variable_modes.len(),
        changes.variables.len(),
        changes.variable_mode_values.len()
    );
    Ok(changes)
}

fn reconcile_file(
    file: &TokenFile,
    index: &RemoteIndex<'_>,
    builder: &mut ChangeSetBuilder,
) -> Result<()> {
    let target = decode_path(&file.path);
    let collection_name = target.collection_name.as_str();
    let mode_name = target.mode_name.as_str();
    debug!(
        "reconciling {} as collection '{collection_name}', mode '{mode_name}'",
        file.path.display()
    );

    let collection = index.collection(collection_name);
    let collection_id = collection.map_or(collection_name, |c| c.id.as_str());
    let mode = collection.and_then(|c| c.mode_named(mode_name));
    let mode_id = mode.map_or(mode_name, |m| m.mode_id.as_str());

    if collection.is_none() {
        builder.create_collection(collection_id, mode_id);
    }

    let is_initial_mode = builder
        .initial_modes
        .get(collection_id)
        .is_some_and(|initial| initial == mode_id);
    if mode.is_none() && !is_initial_mode {
        builder.create_mode(collection_id, mode_id);
    }

    let empty = BTreeMap::new();
    let existing_variables = collection
        .and_then(|c| index.variables().get(c.id.as_str()))
        .unwrap_or(&empty);

    for (token_name, token) in file.tokens.iter() {
        let variable = existing_variables.get(token_name).copied();
        let variable_id = variable.map_or(token_name, |v| v.id.as_str());

        if variable.is_none() {
            builder.create_variable(collection_id, token_name, token);
        }

        let new_value = resolve_value(token, index.variables())?;
        let existing_value = match (variable, mode) {
            (Some(v), Some(_)) => v.values_by_mode.get(mode_id),
            _ => None,
        };

        if existing_value.is_some_and(|old| old.matches(&new_value)) {
            debug!("'{token_name}' unchanged in mode '{mode_name}'");
            continue;
        }

        builder.changes.variable_mode_values.push(VariableModeValue {
            variable_id: variable_id.to_string(),
            mode_id: mode_id.to_string(),
            value: new_value,
        });
    }

    Ok(())
}
