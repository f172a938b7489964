//! REST API backend.

use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::{Client, Response};
use tokensync_core::{ChangeSet, LocalVariables, PostVariablesResponse};

use crate::client::VariablesBackend;
use crate::error::{RemoteError, Result};

/// Default API host.
pub const DEFAULT_API_BASE: &str = "https://api.figma.com";

/// Default name of the environment variable holding the access token.
pub const DEFAULT_TOKEN_ENV: &str = "PERSONAL_ACCESS_TOKEN";

const TOKEN_HEADER: &str = "X-Figma-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the variables endpoints of the design tool's REST API.
///
/// Requests are made once; failures are reported, never retried.
pub struct FigmaApi {
    http: Client,
    api_base: String,
    token: String,
}

impl FigmaApi {
    /// Create a client against `api_base` authenticating with `token`.
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(FigmaApi {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Create a client reading the access token from the environment variable `var`.
    pub fn from_env(api_base: impl Into<String>, var: &str) -> Result<Self> {
        let token = std::env::var(var)
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RemoteError::MissingToken {
                var: var.to_string(),
            })?;
        Self::new(api_base, token)
    }

    fn variables_url(&self, file_key: &str) -> String {
        format!("{}/v1/files/{file_key}/variables", self.api_base)
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

impl VariablesBackend for FigmaApi {
    fn local_variables(&self, file_key: &str) -> Result<LocalVariables> {
        let url = format!("{}/local", self.variables_url(file_key));
        debug!("GET {url}");
        let response = self
            .http
            .get(&url)
            .header(TOKEN_HEADER, &self.token)
            .send()?;
        let snapshot: LocalVariables = check_status(response)?.json()?;
        info!(
            "fetched {} collections, {} variables",
            snapshot.meta.variable_collections.len(),
            snapshot.meta.variables.len()
        );
        Ok(snapshot)
    }

    fn post_variables(&self, file_key: &str, changes: &ChangeSet) -> Result<PostVariablesResponse> {
        let url = self.variables_url(file_key);
        debug!("POST {url} ({} changes)", changes.len());
        let response = self
            .http
            .post(&url)
            .header(TOKEN_HEADER, &self.token)
            .json(changes)
            .send()?;
        Ok(check_status(response)?.json()?)
    }
}
