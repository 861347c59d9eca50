use crate::error::{RelnotesError, Result};
use crate::github::{FetchMode, DEFAULT_API_URL};
use crate::paths::DEFAULT_ARTIFACTS_DIR;
use crate::repo::{parse_repo_entries, parse_repo_list, RepositoryId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

pub const ENV_REPOS: &str = "GITHUB_REPOS";
pub const ENV_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_ARTIFACTS_PATH: &str = "ARTIFACTS_PATH";
pub const ENV_HISTORY: &str = "ARTIFACT_HISTORY";
pub const ENV_DEBUG: &str = "GITHUB_RELEASES_DEBUG";
pub const ENV_API_URL: &str = "GITHUB_API_URL";

pub const CONFIG_FILE_NAMES: &[&str] = &["relnotes.yaml", "relnotes.yml"];

// ---------------------------------------------------------------------------
// RepoList
// ---------------------------------------------------------------------------

/// `repos` as written in a source: `a/b,c/d` or, in YAML, a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepoList {
    Csv(String),
    List(Vec<String>),
}

impl RepoList {
    pub fn parse(&self) -> Result<Vec<RepositoryId>> {
        match self {
            RepoList::Csv(s) => parse_repo_list(s),
            RepoList::List(items) => parse_repo_entries(items),
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigLayer
// ---------------------------------------------------------------------------

/// One configuration source. Unset options are `None` and fall through to the
/// next layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default)]
    pub repos: Option<RepoList>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub artifacts_path: Option<PathBuf>,
    #[serde(default)]
    pub debug: Option<bool>,
    #[serde(default)]
    pub history: Option<bool>,
    #[serde(default)]
    pub api_url: Option<String>,
}

/// `true`, `1`, `yes`, `on` (any case) are true; everything else is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

impl ConfigLayer {
    /// Build the environment layer through `lookup`. Empty values count as unset.
    pub fn from_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            repos: get(ENV_REPOS).map(RepoList::Csv),
            token: get(ENV_TOKEN),
            artifacts_path: get(ENV_ARTIFACTS_PATH).map(PathBuf::from),
            debug: get(ENV_DEBUG).map(|v| parse_bool(&v)),
            history: get(ENV_HISTORY).map(|v| parse_bool(&v)),
            api_url: get(ENV_API_URL),
        }
    }

    pub fn from_process_env() -> Self {
        Self::from_env(|key| std::env::var(key).ok())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| RelnotesError::ConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&data).map_err(|e| RelnotesError::ConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Collapse `layers`, highest priority first, into one layer.
    pub fn merge<I>(layers: I) -> ConfigLayer
    where
        I: IntoIterator<Item = ConfigLayer>,
    {
        layers
            .into_iter()
            .fold(ConfigLayer::default(), |acc, layer| acc.or(layer))
    }

    /// Fill every unset option from `lower`.
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            repos: self.repos.or(lower.repos),
            token: self.token.or(lower.token),
            artifacts_path: self.artifacts_path.or(lower.artifacts_path),
            debug: self.debug.or(lower.debug),
            history: self.history.or(lower.history),
            api_url: self.api_url.or(lower.api_url),
        }
    }
}

/// The config file to read: `explicit` if given (it must exist), otherwise the
/// first default name present in `dir`.
pub fn find_config_file(dir: &Path, explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(RelnotesError::ConfigFile {
                path: path.to_path_buf(),
                message: "file not found".to_string(),
            });
        }
        return Ok(Some(path.to_path_buf()));
    }
    Ok(CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file()))
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub repos: Vec<RepositoryId>,
    pub token: Option<String>,
    pub artifacts_path: PathBuf,
    pub debug: bool,
    pub history: bool,
    pub api_url: String,
}

impl Settings {
    /// Merge `layers`, highest priority first, and apply defaults.
    pub fn resolve<I>(layers: I) -> Result<Self>
    where
        I: IntoIterator<Item = ConfigLayer>,
    {
        let merged = ConfigLayer::merge(layers);
        let repos = merged
            .repos
            .as_ref()
            .ok_or(RelnotesError::MissingRepos)?
            .parse()?;
        Ok(Self {
            repos,
            token: merged.token.filter(|t| !t.trim().is_empty()),
            artifacts_path: merged
                .artifacts_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR)),
            debug: merged.debug.unwrap_or(false),
            history: merged.history.unwrap_or(false),
            api_url: merged.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        })
    }

    pub fn fetch_mode(&self) -> FetchMode {
        FetchMode::from_history(self.history)
    }
}
