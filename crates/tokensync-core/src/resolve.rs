//! Conversion of tokens into variable values.

use std::collections::BTreeMap;

use crate::color::parse_color;
use crate::error::Result;
use crate::token::{Token, TokenKind, TokenValue};
use crate::variables::{ResolvedType, Variable, VariableValue};

/// Modifiable variables grouped by collection id, then by name.
///
/// Collections are ordered by id so alias lookups scan them deterministically.
pub type VariablesByCollection<'a> = BTreeMap<&'a str, BTreeMap<&'a str, &'a Variable>>;

/// Turn an alias like `{color.brand.radish}` into a variable name
/// (`color/brand/radish`).
pub fn alias_target(value: &str) -> String {
    value
        .trim()
        .replace(['{', '}'], "")
        .replace('.', "/")
}

/// Convert a token into the value to store on its variable.
///
/// Aliases resolve to the id of an existing variable with the referenced
/// name, searching every collection. When none exists the referenced name
/// itself is used as the id, pointing at a variable created in the same
/// change-set. Colors are parsed and rounded; other values pass through.
pub fn resolve_value(token: &Token, known: &VariablesByCollection<'_>) -> Result<VariableValue> {
    match &token.value {
        TokenValue::String(text) if token.value.is_alias() => {
            let target = alias_target(text);
            let existing = known
                .values()
                .find_map(|by_name| by_name.get(target.as_str()));
            Ok(match existing {
                Some(variable) => VariableValue::alias(variable.id.clone()),
                None => VariableValue::alias(target),
            })
        }
        TokenValue::String(text) if token.kind == TokenKind::Color => {
            Ok(VariableValue::Color(parse_color(text)?.rounded()))
        }
        TokenValue::String(text) => Ok(VariableValue::String(text.clone())),
        TokenValue::Number(n) => Ok(VariableValue::Float(*n)),
        TokenValue::Boolean(b) => Ok(VariableValue::Boolean(*b)),
    }
}

/// The variable type for a token.
pub fn resolved_type(token: &Token) -> ResolvedType {
    token.kind.resolved_type()
}
