//! Variables store backends for tokensync.
//!
//! The reconciliation core only computes change-sets; this crate fetches the
//! snapshot it reconciles against and submits the result. Two backends
//! implement [`VariablesBackend`]:
//!
//! - [`FigmaApi`] talks to the variables REST API over HTTPS.
//! - [`LocalStore`] keeps snapshots as JSON files and applies change-sets
//!   itself, for offline use and tests.

pub mod client;
pub mod error;
pub mod http;
pub mod local;

pub use client::VariablesBackend;
pub use error::{RemoteError, Result};
pub use http::{FigmaApi, DEFAULT_API_BASE, DEFAULT_TOKEN_ENV};
pub use local::{apply_change_set, LocalStore};
