//! The variables store boundary.
//!
//! `VariablesBackend` abstracts over where the variables of a design file
//! live: the REST API ([`crate::http::FigmaApi`]) or a JSON file on disk
//! ([`crate::local::LocalStore`]) for development and testing.

use tokensync_core::{ChangeSet, LocalVariables, PostVariablesResponse};

use crate::error::Result;

/// A store holding the variables of design files, addressed by file key.
pub trait VariablesBackend {
    /// Fetch the current snapshot of a file's local variables.
    fn local_variables(&self, file_key: &str) -> Result<LocalVariables>;

    /// Submit a change-set. The response maps temporary ids to real ids.
    fn post_variables(&self, file_key: &str, changes: &ChangeSet) -> Result<PostVariablesResponse>;
}
