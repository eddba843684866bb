//! Fetch-or-load data manager for the report runtime.
//!
//! Callers use [`DataManager::get_data`] to obtain the raw open and closed
//! listings for one repository, either freshly fetched from GitHub (and then
//! written to the [`RecordCache`]) or loaded from a previous run's cache.
//! [`DataManager::build_report`] runs the full pipeline on top of that.

use std::path::Path;

use chrono::{DateTime, Utc};

use pulse_core::error::Result;
use pulse_data::analysis::{analyze_raw, ActivityReport, ReportWindow};
use pulse_data::reader::{RawCollections, RecordCache};

use crate::github::GitHubClient;

// ── DataSource ────────────────────────────────────────────────────────────────

/// Where the raw listings come from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Fetch from the API and refresh the cache.
    Live(GitHubClient),
    /// Reuse the listings saved by the last live run.
    Cached,
}

// ── DataManager ───────────────────────────────────────────────────────────────

/// Resolves the raw listings for one repository.
///
/// # Example
/// ```no_run
/// use std::path::Path;
///
/// use pulse_core::settings::Credentials;
/// use pulse_runtime::data_manager::{DataManager, DataSource};
/// use pulse_runtime::github::GitHubClient;
///
/// # async fn run() -> pulse_core::Result<()> {
/// let client = GitHubClient::new("https://api.github.com", Credentials::Anonymous)?;
/// let cache_root = Path::new("/tmp/cache");
/// let mgr = DataManager::new(DataSource::Live(client), cache_root, "rust-lang", "rust");
/// let since = chrono::Utc::now();
/// let raw = mgr.get_data(since).await?;
/// println!("{} open", raw.open.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DataManager {
    source: DataSource,
    cache: RecordCache,
    owner: String,
    repo: String,
}

impl DataManager {
    /// Create a manager for `owner/repo` caching under `cache_root`.
    pub fn new(source: DataSource, cache_root: &Path, owner: &str, repo: &str) -> Self {
        Self {
            source,
            cache: RecordCache::new(cache_root, owner, repo),
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the open listing and the closed listing updated since `since`.
    pub async fn get_data(&self, since: DateTime<Utc>) -> Result<RawCollections> {
        match &self.source {
            DataSource::Cached => {
                tracing::info!("Using cached data from {}", self.cache.dir().display());
                let raw = self.cache.load()?;
                if let Some(cached_since) = self.cache_gap(since)? {
                    tracing::warn!(
                        "Cached closed issues start at {}, after the requested {}; \
                         closures in between are missing. Run without --cached to refresh.",
                        cached_since.to_rfc3339(),
                        since.to_rfc3339()
                    );
                }
                Ok(raw)
            }
            DataSource::Live(client) => {
                let raw = self.fetch_fresh(client, since).await?;
                self.cache.save(&raw, since)?;
                Ok(raw)
            }
        }
    }

    /// Start of the cached closed listing when it begins after `since`, i.e.
    /// when the cache cannot cover the requested window.
    pub fn cache_gap(&self, since: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .cache
            .fetched_since()?
            .filter(|cached_since| *cached_since > since))
    }

    /// Resolve the listings for `window` and aggregate them into a report.
    pub async fn build_report(&self, window: &ReportWindow) -> Result<ActivityReport> {
        let since = window.since()?;
        let raw = self.get_data(since).await?;
        analyze_raw(window, &raw)
    }

    // ── Private helpers ───────────────────────────────────────────────────

    async fn fetch_fresh(
        &self,
        client: &GitHubClient,
        since: DateTime<Utc>,
    ) -> Result<RawCollections> {
        tracing::info!("Fetching issues of {}/{}", self.owner, self.repo);

        let open = client.fetch_open(&self.owner, &self.repo).await?;
        tracing::info!("{} open issues.", open.len());

        let closed = client
            .fetch_closed_since(&self.owner, &self.repo, since)
            .await?;
        tracing::info!("{} closed issues.", closed.len());

        Ok(RawCollections { open, closed })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
