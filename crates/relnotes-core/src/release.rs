use crate::classify::ReleaseKind;
use crate::tag::parse_tag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const EMPTY_BODY_PLACEHOLDER: &str = "No release notes provided.";

// ---------------------------------------------------------------------------
// RawRelease
// ---------------------------------------------------------------------------

/// One release as reported by the remote API, drafts already removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRelease {
    pub tag: String,
    pub is_prerelease: bool,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl RawRelease {
    pub fn new(tag: impl Into<String>, is_prerelease: bool, body: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            is_prerelease,
            body: body.into(),
            published_at: None,
        }
    }

    pub fn kind(&self) -> ReleaseKind {
        ReleaseKind::from_flag(self.is_prerelease)
    }

    /// Grouping key for latest-release selection. Tags that fail to parse
    /// fall in with the bare tags so they still surface downstream.
    pub fn artifact_key(&self) -> Option<String> {
        parse_tag(&self.tag).ok().and_then(|p| p.artifact)
    }
}

// ---------------------------------------------------------------------------
// GitHub wire format
// ---------------------------------------------------------------------------

/// The subset of GitHub's release object that relnotes reads.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl GithubRelease {
    /// `None` for drafts.
    pub fn into_raw(self) -> Option<RawRelease> {
        if self.draft {
            return None;
        }
        let body = match self.body {
            Some(b) if !b.is_empty() => b,
            _ => EMPTY_BODY_PLACEHOLDER.to_string(),
        };
        Some(RawRelease {
            tag: self.tag_name,
            is_prerelease: self.prerelease,
            body,
            published_at: self.published_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Ordering and selection
// ---------------------------------------------------------------------------

/// Stable sort, newest first. Releases without a timestamp keep their
/// relative order and go last.
pub fn sort_newest_first(releases: &mut [RawRelease]) {
    releases.sort_by(|a, b| match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// The newest release of `kind` for one artifact group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    pub kind: ReleaseKind,
    pub tag: String,
}

/// Pick, per artifact group, the first stable and first pre-release in
/// `releases` (expected newest first). Output keeps input order.
pub fn select_latest(releases: Vec<RawRelease>) -> Vec<RawRelease> {
    let mut taken: Vec<(Option<String>, ReleaseKind)> = Vec::new();
    releases
        .into_iter()
        .filter(|r| {
            let key = (r.artifact_key(), r.kind());
            if taken.contains(&key) {
                false
            } else {
                taken.push(key);
                true
            }
        })
        .collect()
}

/// True once every artifact group in `releases` has both a stable and a
/// pre-release. An empty listing is never complete.
pub fn latest_is_complete(releases: &[RawRelease]) -> bool {
    let mut groups: Vec<(Option<String>, bool, bool)> = Vec::new();
    for r in releases {
        let key = r.artifact_key();
        let idx = match groups.iter().position(|(k, _, _)| *k == key) {
            Some(i) => i,
            None => {
                groups.push((key, false, false));
                groups.len() - 1
            }
        };
        match r.kind() {
            ReleaseKind::Stable => groups[idx].1 = true,
            ReleaseKind::PreRelease => groups[idx].2 = true,
        }
    }
    !groups.is_empty() && groups.iter().all(|(_, stable, pre)| *stable && *pre)
}

/// Summary entries for the newest stable and pre-release per artifact group,
/// in order of first appearance.
pub fn latest_entries(releases: &[RawRelease]) -> Vec<LatestEntry> {
    select_latest(releases.to_vec())
        .into_iter()
        .map(|r| LatestEntry {
            artifact: r.artifact_key(),
            kind: r.kind(),
            tag: r.tag,
        })
        .collect()
}
