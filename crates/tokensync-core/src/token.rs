//! Design tokens and the nested token tree.
//!
//! A token document is a JSON object whose keys are group names. Any object
//! carrying a `$value` is a [`Token`]; any other object is a group of further
//! nodes. Keys starting with [`SIGIL`] are metadata and never become tokens or
//! groups.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SyncError};
use crate::variables::ResolvedType;

/// Prefix marking reserved metadata keys (`$type`, `$value`, `$description`, ...).
pub const SIGIL: char = '$';

/// Declared kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Color,
    Number,
    String,
    Boolean,
}

impl TokenKind {
    /// The variable type a token of this kind materializes as.
    pub fn resolved_type(self) -> ResolvedType {
        match self {
            TokenKind::Color => ResolvedType::Color,
            TokenKind::Number => ResolvedType::Float,
            TokenKind::String => ResolvedType::String,
            TokenKind::Boolean => ResolvedType::Boolean,
        }
    }

    /// The token kind used when exporting a variable of the given type.
    pub fn from_resolved_type(resolved: ResolvedType) -> Self {
        match resolved {
            ResolvedType::Color => TokenKind::Color,
            ResolvedType::Float => TokenKind::Number,
            ResolvedType::String => TokenKind::String,
            ResolvedType::Boolean => TokenKind::Boolean,
        }
    }
}

/// Raw value of a token as written in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Boolean(bool),
    #[serde(serialize_with = "serialize_number")]
    Number(f64),
    String(String),
}

/// Whole numbers are written without a fractional part (`8`, not `8.0`).
fn serialize_number<S: serde::Serializer>(
    value: &f64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

impl TokenValue {
    /// The textual value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TokenValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value references another token (`{group.token}`).
    pub fn is_alias(&self) -> bool {
        self.as_str()
            .map(|s| s.trim_start().starts_with('{'))
            .unwrap_or(false)
    }
}

/// Variable metadata under `$extensions."com.figma"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaExtensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_from_publishing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_syntax: Option<BTreeMap<String, String>>,
}

impl FigmaExtensions {
    pub fn is_empty(&self) -> bool {
        self.hidden_from_publishing.is_none() && self.scopes.is_none() && self.code_syntax.is_none()
    }
}

/// The `$extensions` object of a token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenExtensions {
    #[serde(rename = "com.figma", default, skip_serializing_if = "Option::is_none")]
    pub figma: Option<FigmaExtensions>,
}

/// A leaf design token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "$type")]
    pub kind: TokenKind,
    #[serde(rename = "$value")]
    pub value: TokenValue,
    #[serde(rename = "$description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "$extensions", default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<TokenExtensions>,
}

impl Token {
    /// A token with no metadata.
    pub fn new(kind: TokenKind, value: TokenValue) -> Self {
        Token {
            kind,
            value,
            description: None,
            extensions: None,
        }
    }

    pub fn number(value: f64) -> Self {
        Token::new(TokenKind::Number, TokenValue::Number(value))
    }

    pub fn color(value: &str) -> Self {
        Token::new(TokenKind::Color, TokenValue::String(value.to_string()))
    }

    pub fn string(value: &str) -> Self {
        Token::new(TokenKind::String, TokenValue::String(value.to_string()))
    }

    pub fn boolean(value: bool) -> Self {
        Token::new(TokenKind::Boolean, TokenValue::Boolean(value))
    }

    /// A token of the given kind whose value references another token.
    pub fn alias(kind: TokenKind, target: &str) -> Self {
        Token::new(kind, TokenValue::String(format!("{{{target}}}")))
    }

    /// Figma-specific metadata, if any was given.
    pub fn figma_extensions(&self) -> Option<&FigmaExtensions> {
        self.extensions
            .as_ref()
            .and_then(|e| e.figma.as_ref())
            .filter(|f| !f.is_empty())
    }
}

/// A node in a token document: either a token or a group of named nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenNode {
    Token(Token),
    Group(TokenGroup),
}

/// An ordered group of named token nodes. Field order follows the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenGroup {
    children: Vec<(String, TokenNode)>,
}

impl TokenGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child node.
    pub fn insert(&mut self, name: impl Into<String>, node: TokenNode) {
        self.children.push((name.into(), node));
    }

    /// Iterate over children in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenNode)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Place a token at a `/`-separated path, creating intermediate groups.
    ///
    /// A token already stored at the same path is replaced.
    pub fn insert_path(&mut self, path: &str, token: Token) {
        match path.split_once('/') {
            None => {
                let node = TokenNode::Token(token);
                match self.children.iter().position(|(name, _)| name == path) {
                    Some(index) => self.children[index].1 = node,
                    None => self.insert(path, node),
                }
            }
            Some((head, rest)) => {
                let existing = self
                    .children
                    .iter()
                    .position(|(name, node)| name == head && matches!(node, TokenNode::Group(_)));
                let index = existing.unwrap_or_else(|| {
                    self.insert(head, TokenNode::Group(TokenGroup::new()));
                    self.children.len() - 1
                });
                if let TokenNode::Group(group) = &mut self.children[index].1 {
                    group.insert_path(rest, token);
                }
            }
        }
    }

    /// Build a token tree from a parsed JSON document.
    ///
    /// Sigil-prefixed keys and non-object values are dropped. A non-object
    /// document yields an empty group.
    pub fn from_json(document: &Value) -> Result<Self> {
        let mut group = TokenGroup::new();
        if let Value::Object(map) = document {
            for (key, child) in map {
                if key.starts_with(SIGIL) {
                    continue;
                }
                if let Some(node) = TokenNode::from_json(key, child)? {
                    group.insert(key.clone(), node);
                }
            }
        }
        Ok(group)
    }

    /// Serialize the group back to a JSON object.
    pub fn to_json(&self) -> Result<Value> {
        let mut map = serde_json::Map::new();
        for (name, node) in self.iter() {
            let value = match node {
                TokenNode::Token(token) => serde_json::to_value(token)?,
                TokenNode::Group(group) => group.to_json()?,
            };
            map.insert(name.to_string(), value);
        }
        Ok(Value::Object(map))
    }
}

impl TokenNode {
    /// Classify one JSON value found under `path`.
    ///
    /// Returns `None` for values that are neither tokens nor groups.
    fn from_json(path: &str, value: &Value) -> Result<Option<Self>> {
        let Value::Object(map) = value else {
            return Ok(None);
        };

        match map.get("$value") {
            Some(_) => {
                let token: Token =
                    serde_json::from_value(value.clone()).map_err(|e| SyncError::InvalidToken {
                        path: path.to_string(),
                        detail: e.to_string(),
                    })?;
                Ok(Some(TokenNode::Token(token)))
            }
            None => {
                let mut group = TokenGroup::new();
                for (key, child) in map {
                    if key.starts_with(SIGIL) {
                        continue;
                    }
                    let child_path = format!("{path}/{key}");
                    if let Some(node) = TokenNode::from_json(&child_path, child)? {
                        group.insert(key.clone(), node);
                    }
                }
                Ok(Some(TokenNode::Group(group)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_deserializes_with_metadata() {
        let token: Token = serde_json::from_value(json!({
            "$type": "color",
            "$value": "#ffffff",
            "$description": "Page background",
            "$extensions": {
                "com.figma": {
                    "hiddenFromPublishing": true,
                    "scopes": ["FRAME_FILL"],
                    "codeSyntax": { "WEB": "--bg" }
                },
                "org.other": { "ignored": 1 }
            }
        }))
        .unwrap();

        assert_eq!(token.kind, TokenKind::Color);
        assert_eq!(token.value, TokenValue::String("#ffffff".into()));
        assert_eq!(token.description.as_deref(), Some("Page background"));
        let figma = token.figma_extensions().unwrap();
        assert_eq!(figma.hidden_from_publishing, Some(true));
        assert_eq!(figma.scopes.as_deref(), Some(&["FRAME_FILL".to_string()][..]));
        assert_eq!(figma.code_syntax.as_ref().unwrap()["WEB"], "--bg");
    }

    #[test]
    fn alias_detection() {
        assert!(TokenValue::String("{spacing.1}".into()).is_alias());
        assert!(TokenValue::String("  {color.brand}".into()).is_alias());
        assert!(!TokenValue::String("#fff".into()).is_alias());
        assert!(!TokenValue::Number(8.0).is_alias());
    }

    #[test]
    fn kind_maps_to_resolved_type() {
        assert_eq!(TokenKind::Color.resolved_type(), ResolvedType::Color);
        assert_eq!(TokenKind::Number.resolved_type(), ResolvedType::Float);
        assert_eq!(TokenKind::String.resolved_type(), ResolvedType::String);
        assert_eq!(TokenKind::Boolean.resolved_type(), ResolvedType::Boolean);
        for kind in [
            TokenKind::Color,
            TokenKind::Number,
            TokenKind::String,
            TokenKind::Boolean,
        ] {
            assert_eq!(TokenKind::from_resolved_type(kind.resolved_type()), kind);
        }
    }

    #[test]
    fn tree_distinguishes_tokens_and_groups() {
        let group = TokenGroup::from_json(&json!({
            "spacing": {
                "$description": "group metadata",
                "1": { "$type": "number", "$value": 8 }
            },
            "stray": "not a token"
        }))
        .unwrap();

        let children: Vec<_> = group.iter().collect();
        assert_eq!(children.len(), 1);
        let (name, node) = children[0];
        assert_eq!(name, "spacing");
        let TokenNode::Group(spacing) = node else {
            panic!("expected a group");
        };
        let (leaf_name, leaf) = spacing.iter().next().unwrap();
        assert_eq!(leaf_name, "1");
        assert_eq!(leaf, &TokenNode::Token(Token::number(8.0)));
    }

    #[test]
    fn invalid_token_reports_path() {
        let err = TokenGroup::from_json(&json!({
            "color": { "bad": { "$type": "gradient", "$value": "x" } }
        }))
        .unwrap_err();
        match err {
            SyncError::InvalidToken { path, .. } => assert_eq!(path, "color/bad"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn null_value_is_an_invalid_token() {
        let err = TokenGroup::from_json(&json!({
            "spacing": { "gap": { "$type": "number", "$value": null } }
        }))
        .unwrap_err();
        match err {
            SyncError::InvalidToken { path, .. } => assert_eq!(path, "spacing/gap"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn insert_path_builds_nested_groups() {
        let mut root = TokenGroup::new();
        root.insert_path("color/brand/radish", Token::color("#ffbe16"));
        root.insert_path("color/brand/pear", Token::color("#010101"));
        root.insert_path("color/brand/pear", Token::color("#020202"));
        root.insert_path("spacing", Token::number(4.0));

        assert_eq!(
            root.to_json().unwrap(),
            json!({
                "color": { "brand": {
                    "radish": { "$type": "color", "$value": "#ffbe16" },
                    "pear": { "$type": "color", "$value": "#020202" }
                } },
                "spacing": { "$type": "number", "$value": 4 }
            })
        );
    }

    #[test]
    fn group_serializes_back_to_json() {
        let mut inner = TokenGroup::new();
        inner.insert("1", TokenNode::Token(Token::number(8.0)));
        let mut root = TokenGroup::new();
        root.insert("spacing", TokenNode::Group(inner));

        assert_eq!(
            root.to_json().unwrap(),
            json!({ "spacing": { "1": { "$type": "number", "$value": 8 } } })
        );
    }

    #[test]
    fn whole_numbers_serialize_without_fraction() {
        assert_eq!(
            serde_json::to_string(&TokenValue::Number(8.0)).unwrap(),
            "8"
        );
        assert_eq!(
            serde_json::to_string(&TokenValue::Number(-2.0)).unwrap(),
            "-2"
        );
        assert_eq!(
            serde_json::to_string(&TokenValue::Number(1.5)).unwrap(),
            "1.5"
        );
    }
}
