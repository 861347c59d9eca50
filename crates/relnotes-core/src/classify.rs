use crate::tag::ParsedTag;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ReleaseKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseKind {
    Stable,
    PreRelease,
}

impl ReleaseKind {
    pub fn from_flag(is_prerelease: bool) -> Self {
        if is_prerelease {
            ReleaseKind::PreRelease
        } else {
            ReleaseKind::Stable
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReleaseKind::Stable => "stable",
            ReleaseKind::PreRelease => "pre_release",
        }
    }

    /// Human-readable label used in rendered notes.
    pub fn label(self) -> &'static str {
        match self {
            ReleaseKind::Stable => "Stable",
            ReleaseKind::PreRelease => "Pre-release",
        }
    }
}

impl fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub is_monorepo_artifact: bool,
    pub release_kind: ReleaseKind,
}

/// Classify a parsed release. The API's pre-release flag is authoritative;
/// the version string is never consulted.
pub fn classify(parsed: &ParsedTag, raw_is_prerelease: bool) -> Classification {
    Classification {
        is_monorepo_artifact: parsed.artifact.is_some(),
        release_kind: ReleaseKind::from_flag(raw_is_prerelease),
    }
}
