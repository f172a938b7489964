//! Design-token to variables reconciliation.
//!
//! Token files are nested JSON documents named `<collection>.<mode>.json`.
//! This crate reads and flattens them, and compares them against a snapshot
//! of a remote variables store to compute a minimal [`ChangeSet`]: new
//! collections, modes and variables, plus only those per-mode values that
//! actually differ from what is stored.
//!
//! # Pipeline
//!
//! 1. [`source`] reads token files and builds [`TokenGroup`] trees.
//! 2. [`flatten`] turns each tree into `/`-joined token names.
//! 3. [`reconcile`] indexes the snapshot and emits the change-set, using
//!    [`resolve`] to convert token values and [`color`] to compare colors.
//!
//! [`export`] runs the other direction, writing token documents from a
//! snapshot. No I/O against the remote store happens here.

pub mod color;
pub mod error;
pub mod export;
pub mod file_name;
pub mod flatten;
pub mod reconcile;
pub mod resolve;
pub mod source;
pub mod token;
pub mod variables;

pub use color::{colors_approximately_equal, format_color, parse_color, rgb_to_hex, Color};
pub use error::{Result, SyncError};
pub use export::{render_documents, token_files_from_variables, TokenDocuments};
pub use file_name::{decode_file_name, decode_path, encode_file_name, FileTarget};
pub use flatten::{flatten, FlattenedTokens};
pub use reconcile::{generate_change_set, RemoteIndex, TokenFile};
pub use resolve::{resolve_value, resolved_type};
pub use source::{discover_token_files, read_token_files};
pub use token::{Token, TokenGroup, TokenKind, TokenNode, TokenValue};
pub use variables::{
    ChangeAction, ChangeSet, LocalVariables, PostVariablesResponse, ResolvedType, Variable,
    VariableAlias, VariableCollection, VariableMode, VariableValue,
};
