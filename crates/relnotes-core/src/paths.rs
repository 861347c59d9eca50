use crate::error::{RelnotesError, Result};
use crate::repo::RepositoryId;
use crate::tag::ParsedTag;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
pub const NOTE_EXTENSION: &str = "md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn repo_dir(root: &Path, repo: &RepositoryId) -> PathBuf {
    root.join(&repo.owner).join(&repo.name)
}

/// Destination of a release note.
///
/// `root/owner/name/<version>.md` for bare tags and
/// `root/owner/name/<artifact>/<version>.md` for namespaced ones. Pure: the
/// filesystem is not touched.
pub fn resolve_note_path(root: &Path, repo: &RepositoryId, parsed: &ParsedTag) -> Result<PathBuf> {
    validate_segment("version", &parsed.version)?;
    let mut dir = repo_dir(root, repo);
    if let Some(artifact) = &parsed.artifact {
        validate_segment("artifact", artifact)?;
        dir.push(artifact);
    }
    Ok(dir.join(format!("{}.{NOTE_EXTENSION}", parsed.version)))
}

/// Reject anything that would leave its directory: separators, `.`, `..`,
/// and the empty string.
pub fn validate_segment(segment: &'static str, value: &str) -> Result<()> {
    let escapes = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\'])
        || value.contains(std::path::MAIN_SEPARATOR);
    if escapes {
        return Err(RelnotesError::InvalidPathSegment {
            segment,
            value: value.to_string(),
        });
    }
    Ok(())
}
