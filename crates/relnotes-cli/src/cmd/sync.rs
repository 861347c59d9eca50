use crate::output::print_json;
use crate::settings::Sources;
use anyhow::Context;
use relnotes_core::classify::ReleaseKind;
use relnotes_core::github::GithubClient;
use relnotes_core::io::FsStore;
use relnotes_core::sync::{SyncReport, Syncer};
use std::fmt::Write;

/// `relnotes sync` — fetch releases for every configured repository and write
/// any notes not already on disk.
///
/// Per-release and per-repository failures are logged and summarized; only
/// configuration errors make this return `Err`.
pub fn run(sources: &Sources, json: bool) -> anyhow::Result<()> {
    let settings = sources.settings()?;

    let client = GithubClient::new(&settings.api_url, settings.token.as_deref())
        .context("failed to build GitHub client")?;
    if !client.has_token() {
        tracing::warn!(
            "no GITHUB_TOKEN found, API rate limits will be restricted; set GITHUB_TOKEN to raise them"
        );
    }
    check_rate_limit(&client);

    let mut syncer = Syncer::new(
        client,
        FsStore,
        &settings.artifacts_path,
        settings.fetch_mode(),
    );
    tracing::debug!(root = %syncer.root().display(), repos = settings.repos.len(), "starting sync");
    let report = syncer.run(&settings.repos);

    if json {
        print_json(&report)?;
    } else {
        println!("{}", format_summary(&report));
    }
    Ok(())
}

fn check_rate_limit(client: &GithubClient) {
    match client.rate_limit() {
        Ok(status) => {
            tracing::debug!(remaining = status.remaining, limit = status.limit, "GitHub API rate limit status");
            if status.is_low() {
                tracing::warn!(
                    "only {} API calls remaining, resets at {}",
                    status.remaining,
                    status.reset
                );
            }
        }
        Err(e) => tracing::warn!("could not check rate limit status: {e}"),
    }
}

/// Label for the repository's own (non-namespaced) tags.
const ROOT_LABEL: &str = "(root)";

fn format_summary(report: &SyncReport) -> String {
    let mut out = String::new();
    for repo in &report.repos {
        match &repo.error {
            Some(err) => {
                let _ = writeln!(out, "{}: {err}", repo.repo);
                continue;
            }
            None => {
                let _ = writeln!(
                    out,
                    "{}: {} written, {} unchanged, {} failed",
                    repo.repo, repo.written, repo.skipped, repo.failed
                );
            }
        }

        let labels: Vec<&str> = repo
            .artifacts
            .iter()
            .map(|a| a.artifact.as_deref().unwrap_or(ROOT_LABEL))
            .collect();
        let width = labels.iter().map(|l| l.len()).max().unwrap_or(0);
        for (label, counts) in labels.iter().zip(&repo.artifacts) {
            let _ = writeln!(
                out,
                "  {label:width$}  {} written, {} unchanged",
                counts.written, counts.skipped
            );
        }

        for entry in &repo.latest {
            let prefix = entry
                .artifact
                .as_deref()
                .map(|a| format!("{a} "))
                .unwrap_or_default();
            let kind = match entry.kind {
                ReleaseKind::Stable => "stable",
                ReleaseKind::PreRelease => "pre-release",
            };
            let _ = writeln!(out, "  {prefix}latest {kind}: {}", entry.tag);
        }
    }

    let _ = write!(
        out,
        "\n{} written, {} unchanged, {} failed",
        report.written(),
        report.skipped(),
        report.failed()
    );
    out
}
