//! Report rendering for GitHub Pulse.
//!
//! Turns an [`ActivityReport`](pulse_data::analysis::ActivityReport) into
//! Markdown tables or pretty JSON.

pub mod json;
pub mod markdown;

use std::str::FromStr;

use pulse_core::error::{PulseError, Result};
use pulse_data::analysis::ActivityReport;

pub use pulse_core as core;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

impl FromStr for ReportFormat {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "json" => Ok(ReportFormat::Json),
            other => Err(PulseError::Config(format!("unknown report format: {other}"))),
        }
    }
}

/// Render `report` in `format`.
pub fn render(report: &ActivityReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Markdown => Ok(markdown::render_markdown(report)),
        ReportFormat::Json => json::render_json(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("markdown".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert_eq!("MD".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert_eq!("json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!(matches!(
            "yaml".parse::<ReportFormat>(),
            Err(PulseError::Config(msg)) if msg.contains("yaml")
        ));
    }
}
