use crate::error::{RelnotesError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// RepositoryId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryId {
    pub owner: String,
    pub name: String,
}

static PART_RE: OnceLock<Regex> = OnceLock::new();

fn part_re() -> &'static Regex {
    PART_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap())
}

fn valid_part(part: &str) -> bool {
    part != "." && part != ".." && part_re().is_match(part)
}

impl RepositoryId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `owner/name`, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let Some((owner, name)) = trimmed.split_once('/') else {
            return Err(RelnotesError::InvalidRepository(s.to_string()));
        };
        if !valid_part(owner) || !valid_part(name) {
            return Err(RelnotesError::InvalidRepository(s.to_string()));
        }
        Ok(Self::new(owner, name))
    }

    /// GitHub treats owner and repository names case-insensitively.
    fn key(&self) -> (String, String) {
        (self.owner.to_ascii_lowercase(), self.name.to_ascii_lowercase())
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl std::str::FromStr for RepositoryId {
    type Err = RelnotesError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Repository lists
// ---------------------------------------------------------------------------

/// Parse a comma-separated `owner/name` list.
///
/// Empty items are ignored. Duplicates (compared case-insensitively) are
/// dropped, keeping the first spelling and the configured order.
pub fn parse_repo_list(list: &str) -> Result<Vec<RepositoryId>> {
    let entries: Vec<&str> = list.split(',').collect();
    parse_repo_entries(&entries)
}

pub fn parse_repo_entries<S: AsRef<str>>(entries: &[S]) -> Result<Vec<RepositoryId>> {
    let mut seen = HashSet::new();
    let mut repos = Vec::new();
    for entry in entries {
        let entry = entry.as_ref();
        if entry.trim().is_empty() {
            continue;
        }
        let repo = RepositoryId::parse(entry)?;
        if seen.insert(repo.key()) {
            repos.push(repo);
        }
    }
    if repos.is_empty() {
        return Err(RelnotesError::MissingRepos);
    }
    Ok(repos)
}
