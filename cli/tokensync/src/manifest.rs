//! `tokensync.toml` parsing and project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokensync_remote::{FigmaApi, LocalStore, VariablesBackend, DEFAULT_API_BASE, DEFAULT_TOKEN_ENV};

pub const MANIFEST_FILE: &str = "tokensync.toml";

/// The top-level configuration of a tokensync project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokensyncManifest {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub tokens: TokensConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Project metadata section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: String,
}

/// Where token files are read from and exported to, relative to the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensConfig {
    #[serde(default = "default_tokens_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

impl Default for TokensConfig {
    fn default() -> Self {
        TokensConfig {
            dir: default_tokens_dir(),
            export_dir: default_export_dir(),
        }
    }
}

fn default_tokens_dir() -> PathBuf {
    PathBuf::from("tokens")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("tokens_new")
}

/// Which variables store to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The design tool's REST API.
    #[default]
    Figma,
    /// JSON snapshots under `local_root`.
    Local,
}

/// Remote store section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub file_key: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Name of the environment variable holding the access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            backend: BackendKind::default(),
            file_key: None,
            api_base: default_api_base(),
            token_env: default_token_env(),
            local_root: default_local_root(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

fn default_local_root() -> PathBuf {
    PathBuf::from(".tokensync/remote")
}

impl TokensyncManifest {
    /// Search upward from `start_dir` for a `tokensync.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: TokensyncManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing tokensync.toml")
    }

    /// Pick the file key: explicit value first, then the config.
    pub fn file_key(&self, explicit: Option<&str>) -> Result<String> {
        explicit
            .or(self.remote.file_key.as_deref())
            .map(str::to_string)
            .context("no file key: pass --file-key, set FILE_KEY, or set remote.file_key in tokensync.toml")
    }

    /// Open the configured variables store.
    pub fn open_backend(&self, project_dir: &Path) -> Result<Box<dyn VariablesBackend>> {
        let backend: Box<dyn VariablesBackend> = match self.remote.backend {
            BackendKind::Figma => Box::new(
                FigmaApi::from_env(self.remote.api_base.as_str(), &self.remote.token_env)
                    .context("configuring variables API client")?,
            ),
            BackendKind::Local => Box::new(LocalStore::new(project_dir.join(&self.remote.local_root))),
        };
        Ok(backend)
    }

    /// Generate the default template for `tokensync init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[project]
name = "{name}"

[tokens]
dir = "tokens"
export_dir = "tokens_new"

[remote]
backend = "figma"
# file_key = "your-file-key"
# The access token is read from this environment variable.
token_env = "{DEFAULT_TOKEN_ENV}"
"#
        )
    }
}
