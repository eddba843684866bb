use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PulseError, Result};

/// Public GitHub REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default lookback window in months.
pub const DEFAULT_MONTHS: u32 = 12;

/// Longest accepted lookback window in months.
pub const MAX_MONTHS: u32 = 120;

/// Name of the per-user state directory under `$HOME`.
pub const APP_DIR_NAME: &str = ".github-pulse";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Monthly issue and pull-request activity report for a GitHub repository
#[derive(Parser, Debug, Clone)]
#[command(
    name = "github-pulse",
    about = "Monthly issue and pull-request activity report for a GitHub repository",
    version
)]
pub struct Settings {
    /// Owner of the repository (user or organisation)
    #[arg(long)]
    pub user: Option<String>,

    /// Name of the repository
    #[arg(long)]
    pub repo: Option<String>,

    /// Number of months to look back
    #[arg(
        long,
        default_value = "12",
        value_parser = clap::value_parser!(u32).range(1..=MAX_MONTHS as i64)
    )]
    pub months: u32,

    /// GitHub personal access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub login for basic authentication
    #[arg(long, requires = "password")]
    pub username: Option<String>,

    /// GitHub password for basic authentication
    #[arg(long, requires = "username")]
    pub password: Option<String>,

    /// Reuse the records saved by the previous run instead of querying GitHub
    #[arg(long)]
    pub cached: bool,

    /// Report format
    #[arg(long, default_value = "markdown", value_parser = ["markdown", "json"])]
    pub format: String,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding fetched records
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// GitHub API base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Credentials ────────────────────────────────────────────────────────────────

/// How requests to the tracker are authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Anonymous,
    Token(String),
    Basic { username: String, password: String },
}

// ── ConfigFile ─────────────────────────────────────────────────────────────────

/// Repository and credential defaults read from `~/.github-pulse/config.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

/// The `github` section of the configuration file.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct GithubConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// The `report` section of the configuration file.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ReportConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ConfigFile {
    /// `~/.github-pulse/config.json`.
    pub fn default_path() -> PathBuf {
        Self::path_in(&home_dir())
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(APP_DIR_NAME).join("config.json")
    }

    /// Load the configuration at `path`.
    ///
    /// A missing file yields the default (empty) configuration; a file that
    /// exists but cannot be read or parsed is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no configuration file at {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| PulseError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|e| {
            PulseError::Config(format!(
                "configuration file {} could not be parsed: {e}",
                path.display()
            ))
        })
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments and fill unset values from the configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from_args(std::env::args_os().collect())
    }

    /// Same as [`load`](Self::load) but accepts an explicit argument list.
    pub fn load_from_args(args: Vec<std::ffi::OsString>) -> Result<Self> {
        let matches = Settings::command().get_matches_from(args.clone());
        let settings = Settings::parse_from(args);

        let config_path = settings
            .config
            .clone()
            .unwrap_or_else(ConfigFile::default_path);
        let config = ConfigFile::load_from(&config_path)?;

        let settings = settings.merge_config(config, &matches);
        settings.validate()?;
        Ok(settings)
    }

    /// Re-check limits that clap only enforces for command-line values.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_MONTHS).contains(&self.months) {
            return Err(PulseError::Config(format!(
                "months must be between 1 and {MAX_MONTHS}, got {}",
                self.months
            )));
        }
        Ok(())
    }

    /// Fill every value that was not given on the command line from `config`.
    pub fn merge_config(mut self, config: ConfigFile, matches: &clap::ArgMatches) -> Self {
        if self.user.is_none() {
            self.user = config.github.user;
        }
        if self.repo.is_none() {
            self.repo = config.github.repo;
        }
        if self.token.is_none() {
            self.token = config.github.token;
        }
        if self.cache_dir.is_none() {
            self.cache_dir = config.cache_dir;
        }
        if !is_arg_explicitly_set(matches, "api_base") {
            if let Some(v) = config.github.api_base {
                self.api_base = v;
            }
        }
        if !is_arg_explicitly_set(matches, "months") {
            if let Some(v) = config.report.months {
                self.months = v;
            }
        }
        if !is_arg_explicitly_set(matches, "format") {
            if let Some(v) = config.report.format {
                self.format = v;
            }
        }

        if self.debug {
            self.log_level = "DEBUG".to_string();
        }

        self
    }

    /// The `(owner, repo)` pair to report on.
    pub fn repository(&self) -> Result<(String, String)> {
        match (self.user.as_deref(), self.repo.as_deref()) {
            (Some(user), Some(repo)) if !user.is_empty() && !repo.is_empty() => {
                Ok((user.to_string(), repo.to_string()))
            }
            _ => Err(PulseError::Config(
                "a GitHub user and repository must be provided via the command line or configuration file"
                    .to_string(),
            )),
        }
    }

    /// Credentials to send with each API request. Basic auth wins over a token.
    pub fn credentials(&self) -> Credentials {
        match (&self.username, &self.password, &self.token) {
            (Some(username), Some(password), _) => Credentials::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            (_, _, Some(token)) if !token.is_empty() => Credentials::Token(token.clone()),
            _ => Credentials::Anonymous,
        }
    }

    /// Resolved record cache directory (`~/.github-pulse/cache` by default).
    pub fn cache_root(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| home_dir().join(APP_DIR_NAME).join("cache"))
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────────

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
