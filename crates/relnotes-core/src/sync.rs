use crate::classify::classify;
use crate::error::Result;
use crate::github::{FetchMode, ReleaseSource};
use crate::io::NoteStore;
use crate::paths::resolve_note_path;
use crate::release::{latest_entries, LatestEntry, RawRelease};
use crate::render::render_note;
use crate::repo::RepositoryId;
use crate::tag::parse_tag;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What happened to one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteOutcome {
    Written(PathBuf),
    Skipped(PathBuf),
}

/// Written and unchanged notes for one artifact group; `None` is the
/// repository's own tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactCounts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    pub written: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RepoReport {
    pub repo: String,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latest: Vec<LatestEntry>,
    pub artifacts: Vec<ArtifactCounts>,
}

impl RepoReport {
    /// Counts for `artifact`, added in order of first appearance.
    fn artifact_mut(&mut self, artifact: Option<String>) -> &mut ArtifactCounts {
        let idx = match self.artifacts.iter().position(|a| a.artifact == artifact) {
            Some(i) => i,
            None => {
                self.artifacts.push(ArtifactCounts {
                    artifact,
                    ..Default::default()
                });
                self.artifacts.len() - 1
            }
        };
        &mut self.artifacts[idx]
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub repos: Vec<RepoReport>,
}

impl SyncReport {
    pub fn written(&self) -> usize {
        self.repos.iter().map(|r| r.written).sum()
    }

    pub fn skipped(&self) -> usize {
        self.repos.iter().map(|r| r.skipped).sum()
    }

    pub fn failed(&self) -> usize {
        self.repos.iter().map(|r| r.failed).sum()
    }

    pub fn failed_repos(&self) -> usize {
        self.repos.iter().filter(|r| r.error.is_some()).count()
    }
}

// ---------------------------------------------------------------------------
// Syncer
// ---------------------------------------------------------------------------

/// Drives one sync run: repositories in order, releases in order, one at a
/// time. Existing notes are never rewritten.
pub struct Syncer<S, W> {
    source: S,
    store: W,
    root: PathBuf,
    mode: FetchMode,
}

impl<S: ReleaseSource, W: NoteStore> Syncer<S, W> {
    pub fn new(source: S, store: W, root: impl Into<PathBuf>, mode: FetchMode) -> Self {
        Self {
            source,
            store,
            root: root.into(),
            mode,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &W {
        &self.store
    }

    /// Process every repository. Failures are logged and recorded in the
    /// report; none of them stop the run.
    pub fn run(&mut self, repos: &[RepositoryId]) -> SyncReport {
        let mut report = SyncReport::default();
        for repo in repos {
            info!(repo = %repo, mode = ?self.mode, "processing repository");
            report.repos.push(self.sync_repo(repo));
        }
        report
    }

    pub fn sync_repo(&mut self, repo: &RepositoryId) -> RepoReport {
        let mut report = RepoReport {
            repo: repo.to_string(),
            ..Default::default()
        };
        let releases = match self.source.releases(repo, self.mode) {
            Ok(releases) => releases,
            Err(e) => {
                warn!(repo = %repo, "skipping repository: {e}");
                report.error = Some(e.to_string());
                return report;
            }
        };
        if releases.is_empty() {
            warn!(repo = %repo, "no releases found");
        }
        report.latest = latest_entries(&releases);

        for release in &releases {
            match self.sync_release(repo, release) {
                Ok(NoteOutcome::Written(path)) => {
                    debug!(path = %path.display(), "wrote release notes");
                    report.written += 1;
                    report.artifact_mut(release.artifact_key()).written += 1;
                }
                Ok(NoteOutcome::Skipped(path)) => {
                    debug!(path = %path.display(), "skipping existing file");
                    report.skipped += 1;
                    report.artifact_mut(release.artifact_key()).skipped += 1;
                }
                Err(e) => {
                    warn!(repo = %repo, tag = %release.tag, "skipping release: {e}");
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Parse, classify, resolve, and write one release unless its note exists.
    pub fn sync_release(&mut self, repo: &RepositoryId, release: &RawRelease) -> Result<NoteOutcome> {
        let parsed = parse_tag(&release.tag)?;
        let classification = classify(&parsed, release.is_prerelease);
        let path = resolve_note_path(&self.root, repo, &parsed)?;
        if self.store.exists(&path) {
            return Ok(NoteOutcome::Skipped(path));
        }
        let note = render_note(repo, &parsed, &classification, &release.body);
        self.store.write(&path, &note)?;
        Ok(NoteOutcome::Written(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelnotesError;
    use crate::io::FsStore;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Canned listings per repository; unknown repositories are not found.
    #[derive(Default)]
    struct FakeSource {
        listings: HashMap<String, Vec<RawRelease>>,
        calls: Vec<(String, FetchMode)>,
    }

    impl FakeSource {
        fn with(mut self, repo: &str, releases: Vec<RawRelease>) -> Self {
            self.listings.insert(repo.to_string(), releases);
            self
        }
    }

    impl ReleaseSource for FakeSource {
        fn releases(&mut self, repo: &RepositoryId, mode: FetchMode) -> Result<Vec<RawRelease>> {
            self.calls.push((repo.to_string(), mode));
            self.listings
                .get(&repo.to_string())
                .cloned()
                .ok_or_else(|| RelnotesError::RepoNotFound(repo.to_string()))
        }
    }

    /// Counts writes on top of the real filesystem.
    #[derive(Default)]
    struct CountingStore {
        writes: usize,
    }

    impl NoteStore for CountingStore {
        fn exists(&self, path: &Path) -> bool {
            FsStore.exists(path)
        }

        fn write(&mut self, path: &Path, content: &str) -> Result<()> {
            self.writes += 1;
            FsStore.write(path, content)
        }
    }

    fn repo(s: &str) -> RepositoryId {
        RepositoryId::parse(s).unwrap()
    }

    #[test]
    fn writes_monorepo_prerelease_note() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("artifacts");
        let source = FakeSource::default().with(
            "acme/widgets",
            vec![RawRelease::new("alpha/v0.1.0-beta.2", true, "Fixed bug")],
        );
        let mut syncer = Syncer::new(source, FsStore, &root, FetchMode::Latest);
        let report = syncer.run(&[repo("acme/widgets")]);

        assert_eq!(report.written(), 1);
        let path = root.join("acme/widgets/alpha/v0.1.0-beta.2.md");
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("Pre-release"));
        assert!(content.contains("Fixed bug"));
    }

    #[test]
    fn second_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let releases = vec![
            RawRelease::new("v1.0.0", false, "Regular release notes"),
            RawRelease::new("op-node/v1.10.2", false, "Monorepo release notes"),
            RawRelease::new("v2.0.0-rc1", true, "Pre-release notes"),
        ];
        let source = || FakeSource::default().with("test/repo", releases.clone());
        let repos = [repo("test/repo")];

        let mut first = Syncer::new(source(), CountingStore::default(), dir.path(), FetchMode::History);
        let report = first.run(&repos);
        assert_eq!(first.store().writes, 3);
        assert_eq!(report.written(), 3);

        let mut second = Syncer::new(source(), CountingStore::default(), dir.path(), FetchMode::History);
        let report = second.run(&repos);
        assert_eq!(second.store().writes, 0);
        assert_eq!(report.skipped(), 3);
        assert!(dir.path().join("test/repo/op-node/v1.10.2.md").exists());
        assert!(dir.path().join("test/repo/v2.0.0-rc1.md").exists());
    }

    #[test]
    fn existing_note_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("o/r/v1.0.0.md");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "hand edited").unwrap();

        let source = FakeSource::default().with("o/r", vec![RawRelease::new("v1.0.0", false, "new body")]);
        let mut syncer = Syncer::new(source, FsStore, dir.path(), FetchMode::Latest);
        let outcome = syncer
            .sync_release(&repo("o/r"), &RawRelease::new("v1.0.0", false, "new body"))
            .unwrap();
        assert_eq!(outcome, NoteOutcome::Skipped(path.clone()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hand edited");
    }

    #[test]
    fn bad_releases_are_skipped_and_run_continues() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::default().with(
            "o/r",
            vec![
                RawRelease::new("", false, "empty tag"),
                RawRelease::new("svc/v1/../../escape", false, "traversal"),
                RawRelease::new("v1.0.0", false, "fine"),
            ],
        );
        let mut syncer = Syncer::new(source, FsStore, dir.path(), FetchMode::History);
        let report = syncer.run(&[repo("o/r")]);

        assert_eq!(report.failed(), 2);
        assert_eq!(report.written(), 1);
        assert!(dir.path().join("o/r/v1.0.0.md").exists());
        assert!(!dir.path().join("escape.md").exists());
    }

    #[test]
    fn failing_repository_does_not_stop_the_next() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::default().with("acme/widgets", vec![RawRelease::new("v1", false, "b")]);
        let mut syncer = Syncer::new(source, FsStore, dir.path(), FetchMode::Latest);
        let report = syncer.run(&[repo("acme/missing"), repo("acme/widgets")]);

        assert_eq!(report.failed_repos(), 1);
        assert!(report.repos[0].error.as_deref().unwrap().contains("acme/missing"));
        assert_eq!(report.repos[1].written, 1);
    }

    #[test]
    fn mode_is_passed_to_source() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::default().with("a/b", vec![]);
        let mut syncer = Syncer::new(source, FsStore, dir.path(), FetchMode::History);
        syncer.run(&[repo("a/b")]);
        assert_eq!(syncer.source.calls, vec![("a/b".to_string(), FetchMode::History)]);
    }

    #[test]
    fn report_lists_latest_per_artifact() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::default().with(
            "o/r",
            vec![
                RawRelease::new("svc/v2", false, ""),
                RawRelease::new("v1.1.0-rc.1", true, ""),
                RawRelease::new("v1.0.0", false, ""),
            ],
        );
        let mut syncer = Syncer::new(source, FsStore, dir.path(), FetchMode::Latest);
        let report = syncer.run(&[repo("o/r")]);
        let tags: Vec<&str> = report.repos[0].latest.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["svc/v2", "v1.1.0-rc.1", "v1.0.0"]);
    }

    #[test]
    fn counts_are_kept_per_artifact() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("o/r/svc")).unwrap();
        std::fs::write(dir.path().join("o/r/svc/v1.md"), "old").unwrap();
        let source = FakeSource::default().with(
            "o/r",
            vec![
                RawRelease::new("svc/v2", false, ""),
                RawRelease::new("v1.0.0", false, ""),
                RawRelease::new("svc/v1", false, ""),
                RawRelease::new("web/v3-rc.1", true, ""),
            ],
        );
        let mut syncer = Syncer::new(source, FsStore, dir.path(), FetchMode::History);
        let report = syncer.run(&[repo("o/r")]);

        let counts = &report.repos[0].artifacts;
        assert_eq!(
            counts,
            &vec![
                ArtifactCounts { artifact: Some("svc".into()), written: 1, skipped: 1 },
                ArtifactCounts { artifact: None, written: 1, skipped: 0 },
                ArtifactCounts { artifact: Some("web".into()), written: 1, skipped: 0 },
            ]
        );
    }
}
