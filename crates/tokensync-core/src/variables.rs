//! Remote variables data model and change-set payload.
//!
//! These types mirror the JSON shapes of the variables REST API: the local
//! variables snapshot returned by `GET /v1/files/:key/variables/local` and the
//! change-set accepted by `POST /v1/files/:key/variables`. Field names are
//! camelCase on the wire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::{colors_approximately_equal, Color};

/// Type of a variable's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResolvedType {
    Boolean,
    Float,
    String,
    Color,
}

/// A mode within a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableMode {
    pub mode_id: String,
    pub name: String,
}

/// A named collection of variables and its modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableCollection {
    pub id: String,
    pub name: String,
    pub modes: Vec<VariableMode>,
    pub default_mode_id: String,
    /// Owned by another file; read-only here.
    #[serde(default)]
    pub remote: bool,
}

impl VariableCollection {
    /// Find a mode by display name.
    pub fn mode_named(&self, name: &str) -> Option<&VariableMode> {
        self.modes.iter().find(|m| m.name == name)
    }
}

/// Marker for the `type` field of an alias value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AliasType {
    #[serde(rename = "VARIABLE_ALIAS")]
    VariableAlias,
}

/// A value that points at another variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableAlias {
    #[serde(rename = "type")]
    pub kind: AliasType,
    pub id: String,
}

impl VariableAlias {
    pub fn new(id: impl Into<String>) -> Self {
        VariableAlias {
            kind: AliasType::VariableAlias,
            id: id.into(),
        }
    }
}

/// The value of a variable in one mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Boolean(bool),
    Float(f64),
    String(String),
    Alias(VariableAlias),
    Color(Color),
}

impl VariableValue {
    pub fn alias(id: impl Into<String>) -> Self {
        VariableValue::Alias(VariableAlias::new(id))
    }

    /// Compare with the comparator appropriate for the value kind.
    ///
    /// Aliases match on id, colors within the color tolerance, primitives
    /// exactly. Values of different kinds never match.
    pub fn matches(&self, other: &VariableValue) -> bool {
        match (self, other) {
            (VariableValue::Alias(a), VariableValue::Alias(b)) => a.id == b.id,
            (VariableValue::Color(a), VariableValue::Color(b)) => colors_approximately_equal(a, b),
            (VariableValue::Boolean(a), VariableValue::Boolean(b)) => a == b,
            (VariableValue::Float(a), VariableValue::Float(b)) => a == b,
            (VariableValue::String(a), VariableValue::String(b)) => a == b,
            _ => false,
        }
    }
}

/// A variable and its per-mode values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub key: String,
    pub variable_collection_id: String,
    pub resolved_type: ResolvedType,
    #[serde(default)]
    pub values_by_mode: BTreeMap<String, VariableValue>,
    /// Owned by another file; read-only here.
    #[serde(default)]
    pub remote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_from_publishing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_syntax: Option<BTreeMap<String, String>>,
}

/// Collections and variables keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalVariablesMeta {
    #[serde(default)]
    pub variable_collections: BTreeMap<String, VariableCollection>,
    #[serde(default)]
    pub variables: BTreeMap<String, Variable>,
}

/// Snapshot of a file's variables as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalVariables {
    #[serde(default = "ok_status")]
    pub status: u16,
    #[serde(default)]
    pub error: bool,
    pub meta: LocalVariablesMeta,
}

fn ok_status() -> u16 {
    200
}

impl LocalVariables {
    /// A snapshot with no collections or variables.
    pub fn empty() -> Self {
        LocalVariables {
            status: 200,
            error: false,
            meta: LocalVariablesMeta::default(),
        }
    }
}

/// Kind of change requested for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableCollectionChange {
    pub action: ChangeAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_mode_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableModeChange {
    pub action: ChangeAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub variable_collection_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableChange {
    pub action: ChangeAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_collection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_type: Option<ResolvedType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_from_publishing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_syntax: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableModeValue {
    pub variable_id: String,
    pub mode_id: String,
    pub value: VariableValue,
}

/// The full set of changes to submit in one request.
///
/// Entries keep the order in which token files and tokens were processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    #[serde(default)]
    pub variable_collections: Vec<VariableCollectionChange>,
    #[serde(default)]
    pub variable_modes: Vec<VariableModeChange>,
    #[serde(default)]
    pub variables: Vec<VariableChange>,
    #[serde(default)]
    pub variable_mode_values: Vec<VariableModeValue>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.variable_collections.is_empty()
            && self.variable_modes.is_empty()
            && self.variables.is_empty()
            && self.variable_mode_values.is_empty()
    }

    /// Number of entries across all four sequences.
    pub fn len(&self) -> usize {
        self.variable_collections.len()
            + self.variable_modes.len()
            + self.variables.len()
            + self.variable_mode_values.len()
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostVariablesMeta {
    #[serde(default)]
    pub temp_id_to_real_id: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostVariablesResponse {
    #[serde(default = "ok_status")]
    pub status: u16,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub meta: PostVariablesMeta,
}
