mod bootstrap;

use anyhow::{Context, Result};
use chrono::Utc;

use pulse_core::settings::Settings;
use pulse_data::analysis::ReportWindow;
use pulse_report::{render, ReportFormat};
use pulse_runtime::data_manager::{DataManager, DataSource};
use pulse_runtime::github::GitHubClient;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;

    let cache_root = settings.cache_root();
    bootstrap::ensure_directories(&cache_root)
        .with_context(|| format!("failed to create {}", cache_root.display()))?;
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("GitHub Pulse v{} starting", env!("CARGO_PKG_VERSION"));

    let (owner, repo) = settings.repository()?;
    let format: ReportFormat = settings.format.parse()?;

    let source = if settings.cached {
        DataSource::Cached
    } else {
        DataSource::Live(GitHubClient::new(&settings.api_base, settings.credentials())?)
    };
    let manager = DataManager::new(source, &cache_root, &owner, &repo);

    let window = ReportWindow::new(owner, repo, settings.months, Utc::now());
    tracing::info!(
        "Reporting on {} for the last {} months",
        window.slug(),
        window.months
    );

    let report = manager
        .build_report(&window)
        .await
        .with_context(|| format!("failed to build report for {}", window.slug()))?;

    println!("{}", render(&report, format)?);

    tracing::info!("Finished.");
    Ok(())
}
