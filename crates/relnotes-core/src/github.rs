//! GitHub REST client for release listings.
//!
//! Everything here is blocking and sequential: one request in flight, retried
//! with exponential backoff on rate limits and transport failures.

use crate::error::{RelnotesError, Result};
use crate::release::{
    latest_is_complete, select_latest, sort_newest_first, GithubRelease, RawRelease,
};
use crate::repo::RepositoryId;
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const PER_PAGE: usize = 100;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Below this many remaining calls the CLI warns about the quota.
pub const LOW_RATE_LIMIT: u64 = 100;

const USER_AGENT: &str = concat!("relnotes/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// FetchMode / ReleaseSource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Newest stable and newest pre-release per artifact.
    Latest,
    /// Every published release, newest first.
    History,
}

impl FetchMode {
    pub fn from_history(history: bool) -> Self {
        if history {
            FetchMode::History
        } else {
            FetchMode::Latest
        }
    }
}

/// Supplies release listings to the sync engine.
pub trait ReleaseSource {
    fn releases(&mut self, repo: &RepositoryId, mode: FetchMode) -> Result<Vec<RawRelease>>;
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    fn next_delay(&self, delay: Duration) -> Duration {
        std::cmp::min(
            Duration::from_secs_f64(delay.as_secs_f64() * self.multiplier),
            self.max_delay,
        )
    }

    /// A rate limit that resets after the longest backoff step is not waited out.
    fn worth_waiting(&self, err: &RelnotesError) -> bool {
        match err {
            RelnotesError::RateLimited { reset: Some(reset) } => {
                let wait = reset.signed_duration_since(Utc::now());
                wait.to_std().map(|w| w <= self.max_delay).unwrap_or(true)
            }
            other => other.is_retryable(),
        }
    }
}

/// Run `op`, retrying retryable failures with exponential backoff.
pub fn with_retry<T, F>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 0;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < policy.max_retries && policy.worth_waiting(&e) => {
                attempt += 1;
                warn!("{e} ({what}), retry {attempt} after {delay:?}");
                std::thread::sleep(delay);
                delay = policy.next_delay(delay);
            }
            Err(e) => return Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// RateLimitStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub limit: u64,
    pub remaining: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub reset: DateTime<Utc>,
}

impl RateLimitStatus {
    pub fn is_low(&self) -> bool {
        self.remaining < LOW_RATE_LIMIT
    }
}

#[derive(Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Deserialize)]
struct RateLimitResources {
    core: RateLimitStatus,
}

// ---------------------------------------------------------------------------
// GithubClient
// ---------------------------------------------------------------------------

pub struct GithubClient {
    http: Client,
    api_url: String,
    has_token: bool,
    retry: RetryPolicy,
}

fn transport(e: reqwest::Error) -> RelnotesError {
    RelnotesError::Transport(e.to_string())
}

impl GithubClient {
    pub fn new(api_url: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("token {token}"))
                .map_err(|_| RelnotesError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            has_token: token.is_some(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn has_token(&self) -> bool {
        self.has_token
    }

    /// One page of `GET /repos/{owner}/{name}/releases`, drafts included.
    pub fn list_page(&self, repo: &RepositoryId, page: u32) -> Result<Vec<GithubRelease>> {
        let url = format!("{}/repos/{}/{}/releases", self.api_url, repo.owner, repo.name);
        debug!(repo = %repo, page, "fetching releases page");
        let resp = self
            .http
            .get(&url)
            .query(&[("page", page.to_string()), ("per_page", PER_PAGE.to_string())])
            .send()
            .map_err(transport)?;
        let text = check_status(&repo.to_string(), resp)?.text().map_err(transport)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Core quota from `GET /rate_limit`.
    pub fn rate_limit(&self) -> Result<RateLimitStatus> {
        let url = format!("{}/rate_limit", self.api_url);
        let text = with_retry(&self.retry, "rate_limit", || {
            let resp = self.http.get(&url).send().map_err(transport)?;
            check_status("rate_limit", resp)?.text().map_err(transport)
        })?;
        let parsed: RateLimitResponse = serde_json::from_str(&text)?;
        Ok(parsed.resources.core)
    }
}

impl ReleaseSource for GithubClient {
    fn releases(&mut self, repo: &RepositoryId, mode: FetchMode) -> Result<Vec<RawRelease>> {
        let label = repo.to_string();
        let mut releases = Vec::new();
        let mut page = 1;
        loop {
            let batch = match with_retry(&self.retry, &label, || self.list_page(repo, page)) {
                Ok(batch) => batch,
                Err(e @ RelnotesError::RateLimited { .. }) if page > 1 => {
                    warn!(repo = %repo, page, "{e}; keeping {} releases already fetched", releases.len());
                    break;
                }
                Err(e) => return Err(e),
            };
            let full = batch.len() == PER_PAGE;
            releases.extend(batch.into_iter().filter_map(GithubRelease::into_raw));
            if !full || (mode == FetchMode::Latest && latest_is_complete(&releases)) {
                break;
            }
            page += 1;
        }
        sort_newest_first(&mut releases);
        Ok(match mode {
            FetchMode::Latest => select_latest(releases),
            FetchMode::History => releases,
        })
    }
}

/// Map GitHub status codes onto the error taxonomy.
fn check_status(label: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let headers = resp.headers();
    let exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false);
    let reset = headers
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0));

    match status {
        StatusCode::NOT_FOUND => Err(RelnotesError::RepoNotFound(label.to_string())),
        StatusCode::UNAUTHORIZED => Err(RelnotesError::Unauthorized(label.to_string())),
        StatusCode::TOO_MANY_REQUESTS => Err(RelnotesError::RateLimited { reset }),
        StatusCode::FORBIDDEN if exhausted => Err(RelnotesError::RateLimited { reset }),
        StatusCode::FORBIDDEN => Err(RelnotesError::Unauthorized(label.to_string())),
        s if s.is_server_error() => Err(RelnotesError::Transport(format!("{s} for {label}"))),
        s => {
            let message = resp.text().unwrap_or_default();
            Err(RelnotesError::Api {
                status: s.as_u16(),
                message: message.chars().take(200).collect(),
            })
        }
    }
}
