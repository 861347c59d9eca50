use crate::classify::Classification;
use crate::repo::RepositoryId;
use crate::tag::ParsedTag;

/// Render the markdown document for one release.
///
/// The body is inserted verbatim; output is byte-identical for identical input.
pub fn render_note(
    repo: &RepositoryId,
    parsed: &ParsedTag,
    classification: &Classification,
    body: &str,
) -> String {
    let mut title = repo.to_string();
    if let Some(artifact) = &parsed.artifact {
        title.push('/');
        title.push_str(artifact);
    }
    format!(
        "# {title} - {version} ({label})\n\n## Release Notes\n\n{body}\n",
        version = parsed.version,
        label = classification.release_kind.label(),
    )
}
