use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by GitHub Pulse.
#[derive(Error, Debug)]
pub enum PulseError {
    /// A record in the open collection carries a closure timestamp.
    #[error("Open record {id} has a closed_at timestamp")]
    OpenRecordClosed { id: String },

    /// A record in the closed collection has no closure timestamp.
    #[error("Closed record {id} is missing its closed_at timestamp")]
    ClosedRecordMissingClosedAt { id: String },

    /// A closed record claims to have been closed before it was created.
    #[error("Closed record {id} was closed before it was created")]
    ClosedBeforeCreated { id: String },

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written to disk.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `--cached` was requested but no cache file exists.
    #[error("No cached records at {0}; run once without --cached first")]
    CacheMissing(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The HTTP request itself failed (connection, TLS, decoding).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The issue tracker answered with a non-success status.
    #[error("GitHub API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the pulse crates.
pub type Result<T> = std::result::Result<T, PulseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_open_record_closed() {
        let err = PulseError::OpenRecordClosed {
            id: "42".to_string(),
        };
        assert_eq!(err.to_string(), "Open record 42 has a closed_at timestamp");
    }

    #[test]
    fn test_error_display_missing_closed_at() {
        let err = PulseError::ClosedRecordMissingClosedAt {
            id: "7".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Closed record 7 is missing its closed_at timestamp"
        );
    }

    #[test]
    fn test_error_display_closed_before_created() {
        let err = PulseError::ClosedBeforeCreated {
            id: "9".to_string(),
        };
        assert!(err.to_string().contains("closed before it was created"));
    }

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = PulseError::FileRead {
            path: PathBuf::from("/some/open_issues.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/some/open_issues.json"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_cache_missing() {
        let err = PulseError::CacheMissing(PathBuf::from("/cache/foo/bar"));
        assert!(err.to_string().contains("/cache/foo/bar"));
    }

    #[test]
    fn test_error_display_api() {
        let err = PulseError::Api {
            status: 404,
            body: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "GitHub API error 404: Not Found");
    }

    #[test]
    fn test_error_display_config() {
        let err = PulseError::Config("missing repository".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing repository");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PulseError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: PulseError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
