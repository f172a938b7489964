//! Flattening of nested token trees into slash-joined names.

use std::collections::HashMap;

use crate::token::{Token, TokenGroup, TokenNode};

/// Tokens keyed by their full `/`-joined path.
///
/// Iteration follows first-insertion order; inserting an existing path
/// replaces the token in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedTokens {
    entries: Vec<(String, Token)>,
    index: HashMap<String, usize>,
}

impl FlattenedTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, token: Token) {
        let path = path.into();
        match self.index.get(&path) {
            Some(&i) => self.entries[i].1 = token,
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push((path, token));
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&Token> {
        self.index.get(path).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Token)> {
        self.entries.iter().map(|(path, token)| (path.as_str(), token))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Token)> for FlattenedTokens {
    fn from_iter<I: IntoIterator<Item = (S, Token)>>(iter: I) -> Self {
        let mut tokens = FlattenedTokens::new();
        for (path, token) in iter {
            tokens.insert(path, token);
        }
        tokens
    }
}

/// Flatten a token tree. Nested group names are joined with `/`.
pub fn flatten(root: &TokenGroup) -> FlattenedTokens {
    let mut tokens = FlattenedTokens::new();
    for (name, node) in root.iter() {
        collect(name.to_string(), node, &mut tokens);
    }
    tokens
}

fn collect(path: String, node: &TokenNode, tokens: &mut FlattenedTokens) {
    match node {
        TokenNode::Token(token) => tokens.insert(path, token.clone()),
        TokenNode::Group(group) => {
            for (name, child) in group.iter() {
                collect(format!("{path}/{name}"), child, tokens);
            }
        }
    }
}
