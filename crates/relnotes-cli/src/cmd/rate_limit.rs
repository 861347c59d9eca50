use crate::output::print_json;
use crate::settings::Sources;
use anyhow::Context;
use relnotes_core::github::{GithubClient, DEFAULT_API_URL};

/// `relnotes rate-limit` — show the remaining GitHub API quota. Does not
/// need `repos` to be configured.
pub fn run(sources: &Sources, json: bool) -> anyhow::Result<()> {
    let merged = sources.merged();
    let api_url = merged.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
    let token = merged.token.as_deref().filter(|t| !t.trim().is_empty());
    let client = GithubClient::new(api_url, token)
        .context("failed to build GitHub client")?;
    let status = client
        .rate_limit()
        .context("failed to query GitHub rate limit")?;

    if json {
        return print_json(&status);
    }

    println!("Remaining: {}/{}", status.remaining, status.limit);
    println!("Resets at: {}", status.reset);
    if !client.has_token() {
        println!("Tip: set GITHUB_TOKEN to raise the limit.");
    }
    Ok(())
}
