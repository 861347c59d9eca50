use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelnotesError {
    #[error("no repositories configured: set GITHUB_REPOS, pass --repos, or add 'repos' to the config file")]
    MissingRepos,

    #[error("invalid repository '{0}': expected owner/name")]
    InvalidRepository(String),

    #[error("config file {}: {message}", .path.display())]
    ConfigFile { path: PathBuf, message: String },

    #[error("GitHub token contains characters that are not valid in an HTTP header")]
    InvalidToken,

    #[error("malformed release tag '{0}'")]
    MalformedTag(String),

    #[error("invalid {segment} path segment '{value}'")]
    InvalidPathSegment {
        segment: &'static str,
        value: String,
    },

    #[error("repository not found: {0}")]
    RepoNotFound(String),

    #[error("authentication failed for {0}: check GITHUB_TOKEN")]
    Unauthorized(String),

    #[error("GitHub API rate limit reached{}", .reset.map(|r| format!(", resets at {r}")).unwrap_or_default())]
    RateLimited { reset: Option<DateTime<Utc>> },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("GitHub API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RelnotesError {
    /// True for rate limits and transport failures.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RelnotesError::RateLimited { .. } | RelnotesError::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RelnotesError>;
