//! Paginated issue listing against the GitHub REST API.
//!
//! Pages are requested sequentially until an empty page comes back or the
//! page ceiling is reached. Each page is retried with a linear back-off on
//! transport errors, rate limiting and server errors; any other non-success
//! status fails immediately.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::Value;

use pulse_core::error::{PulseError, Result};
use pulse_core::settings::Credentials;
use pulse_core::time_utils::format_api_timestamp;

/// Records requested per page (the API maximum).
pub const PAGE_SIZE: u32 = 100;

/// Hard ceiling on pages per listing, guarding against runaway pagination.
pub const MAX_PAGES: u32 = 100;

/// Attempts per page before the error is surfaced.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Back-off step between attempts: 0 ms, 500 ms, 1000 ms.
const RETRY_BACKOFF_MS: u64 = 500;

// ── ListQuery ─────────────────────────────────────────────────────────────────

/// Which issues to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

/// Parameters of one issue listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub state: IssueState,
    /// `created` or `updated`; results are always newest first.
    pub sort: &'static str,
    /// Only items updated at or after this time.
    pub since: Option<DateTime<Utc>>,
}

impl ListQuery {
    /// Every currently-open item, newest first.
    pub fn open() -> Self {
        Self {
            state: IssueState::Open,
            sort: "created",
            since: None,
        }
    }

    /// Closed items updated since `since`, most recently updated first.
    pub fn closed_since(since: DateTime<Utc>) -> Self {
        Self {
            state: IssueState::Closed,
            sort: "updated",
            since: Some(since),
        }
    }

    fn params(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("state", self.state.as_str().to_string()),
            ("sort", self.sort.to_string()),
            ("direction", "desc".to_string()),
            ("per_page", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(since) = self.since {
            params.push(("since", format_api_timestamp(since)));
        }
        params
    }
}

// ── GitHubClient ──────────────────────────────────────────────────────────────

/// Minimal GitHub client for issue listings.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    credentials: Credentials,
    max_pages: u32,
    backoff: Duration,
}

impl GitHubClient {
    /// Create a client for `api_base` (e.g. `https://api.github.com`).
    pub fn new(api_base: &str, credentials: Credentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("github-pulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PulseError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            credentials,
            max_pages: MAX_PAGES,
            backoff: Duration::from_millis(RETRY_BACKOFF_MS),
        })
    }

    /// Override the page ceiling.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Override the retry back-off step.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Every currently-open issue and pull request.
    pub async fn fetch_open(&self, owner: &str, repo: &str) -> Result<Vec<Value>> {
        self.list_issues(owner, repo, &ListQuery::open()).await
    }

    /// Closed issues and pull requests updated since `since`.
    pub async fn fetch_closed_since(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Value>> {
        self.list_issues(owner, repo, &ListQuery::closed_since(since))
            .await
    }

    /// Concatenate pages of `query` until an empty page or the page ceiling.
    pub async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        query: &ListQuery,
    ) -> Result<Vec<Value>> {
        let url = format!("{}/repos/{}/{}/issues", self.api_base, owner, repo);
        let mut result = Vec::new();

        for page in 1..=self.max_pages {
            tracing::info!("Getting {} issues page #{:02}.", query.state.as_str(), page);

            let items = self.get_page_with_retry(&url, &query.params(page)).await?;

            tracing::info!("Got {} issues.", items.len());

            if items.is_empty() {
                return Ok(result);
            }
            result.extend(items);
        }

        tracing::warn!(
            max_pages = self.max_pages,
            "page ceiling reached for {} issues of {}/{}; listing may be truncated",
            query.state.as_str(),
            owner,
            repo
        );
        Ok(result)
    }

    // ── Private helpers ───────────────────────────────────────────────────

    async fn get_page_with_retry(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> Result<Vec<Value>> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let sleep = self.backoff * attempt;
                tracing::debug!(
                    attempt,
                    sleep_ms = sleep.as_millis() as u64,
                    "retrying page after back-off"
                );
                tokio::time::sleep(sleep).await;
            }

            match self.get_page(url, params).await {
                Ok(items) => return Ok(items),
                Err(e) if attempt + 1 < MAX_RETRY_ATTEMPTS && is_retryable(&e) => {
                    tracing::warn!(attempt, error = %e, "page request failed");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_page(&self, url: &str, params: &[(&'static str, String)]) -> Result<Vec<Value>> {
        let request = self
            .http
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .query(params);

        let request = match &self.credentials {
            Credentials::Anonymous => request,
            Credentials::Token(token) => request.bearer_auth(token),
            Credentials::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| PulseError::Http(format!("failed to fetch {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response.text().await));
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| PulseError::Http(format!("failed to decode issue page from {url}: {e}")))
    }
}

/// Error for a non-success response; a body that cannot be read is described
/// in place of the body.
fn api_error<E: std::fmt::Display>(
    status: StatusCode,
    body: std::result::Result<String, E>,
) -> PulseError {
    let body = match body {
        Ok(body) => body,
        Err(e) => format!("<failed to read response body: {e}>"),
    };
    PulseError::Api {
        status: status.as_u16(),
        body,
    }
}

/// Transport failures, rate limiting and server errors are worth retrying.
fn is_retryable(err: &PulseError) -> bool {
    match err {
        PulseError::Http(_) => true,
        PulseError::Api { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
        }
        _ => false,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
