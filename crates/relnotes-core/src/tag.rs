use crate::error::{RelnotesError, Result};
use serde::{Deserialize, Serialize};

/// A release tag split into its optional monorepo namespace and version.
///
/// `payments-service/v2.1.0-rc.1` has artifact `payments-service` and version
/// `v2.1.0-rc.1`; `v1.0.0` has no artifact. The version is never validated as
/// semver and is always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    pub version: String,
}

impl ParsedTag {
    pub fn bare(version: impl Into<String>) -> Self {
        Self {
            artifact: None,
            version: version.into(),
        }
    }

    pub fn namespaced(artifact: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            artifact: Some(artifact.into()),
            version: version.into(),
        }
    }
}

/// Split a tag on its first `/`.
///
/// Everything after the first slash, further slashes included, is the version.
pub fn parse_tag(tag: &str) -> Result<ParsedTag> {
    match tag.split_once('/') {
        None if tag.is_empty() => Err(RelnotesError::MalformedTag(tag.to_string())),
        None => Ok(ParsedTag::bare(tag)),
        Some((artifact, version)) if artifact.is_empty() || version.is_empty() => {
            Err(RelnotesError::MalformedTag(tag.to_string()))
        }
        Some((artifact, version)) => Ok(ParsedTag::namespaced(artifact, version)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_tags_have_no_artifact() {
        for tag in ["v1.0.0", "v2.0.0-rc1", "release-2024", "1.0", "v1.0.0\\evil"] {
            assert_eq!(parse_tag(tag).unwrap(), ParsedTag::bare(tag));
        }
    }

    #[test]
    fn namespaced_tag_splits_artifact() {
        let parsed = parse_tag("payments-service/v2.1.0-rc.1").unwrap();
        assert_eq!(parsed.artifact.as_deref(), Some("payments-service"));
        assert_eq!(parsed.version, "v2.1.0-rc.1");
    }

    #[test]
    fn splits_on_first_slash_only() {
        let parsed = parse_tag("op-node/v1.10.2/hotfix").unwrap();
        assert_eq!(parsed, ParsedTag::namespaced("op-node", "v1.10.2/hotfix"));
    }

    #[test]
    fn version_string_is_not_interpreted() {
        let parsed = parse_tag("svc/not-a-version at all").unwrap();
        assert_eq!(parsed.version, "not-a-version at all");
    }

    #[test]
    fn empty_tag_is_malformed() {
        assert!(matches!(parse_tag(""), Err(RelnotesError::MalformedTag(_))));
    }

    #[test]
    fn empty_namespace_halves_are_malformed() {
        for tag in ["/v1.0.0", "svc/", "/"] {
            match parse_tag(tag) {
                Err(RelnotesError::MalformedTag(t)) => assert_eq!(t, tag),
                other => panic!("expected MalformedTag for {tag:?}, got {other:?}"),
            }
        }
    }
}
