//! Raw issue payload handling and the on-disk record cache.
//!
//! Payloads are kept as [`serde_json::Value`] so that a cached run sees
//! exactly what the tracker returned; they are only narrowed to
//! [`IssueRecord`]s right before aggregation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use pulse_core::error::{PulseError, Result};
use pulse_core::models::IssueRecord;
use pulse_core::time_utils::parse_timestamp;

const OPEN_FILE: &str = "open_issues.json";
const CLOSED_FILE: &str = "closed_issues.json";
const META_FILE: &str = "fetch.json";

// ── RawCollections ────────────────────────────────────────────────────────────

/// The two issue listings exactly as returned by the tracker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCollections {
    pub open: Vec<Value>,
    pub closed: Vec<Value>,
}

impl RawCollections {
    /// Narrow both listings to [`IssueRecord`]s, failing on the first
    /// malformed payload.
    pub fn to_records(&self) -> Result<(Vec<IssueRecord>, Vec<IssueRecord>)> {
        Ok((records_from_values(&self.open)?, records_from_values(&self.closed)?))
    }
}

// ── Payload mapping ───────────────────────────────────────────────────────────

/// Map one raw issue payload to an [`IssueRecord`].
///
/// * `id`: the issue `number`, falling back to the global `id`.
/// * `is_pull_request`: `true` when `pull_request.html_url` is a non-null
///   string.
/// * `created_at`: required.
/// * `closed_at`: `null` or absent means the item is open.
pub fn record_from_value(value: &Value) -> Result<IssueRecord> {
    let id = value
        .get("number")
        .filter(|v| !v.is_null())
        .or_else(|| value.get("id"))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "<unknown>".to_string());

    let created_at = match value.get("created_at").and_then(Value::as_str) {
        Some(s) => parse_timestamp(s)?,
        None => {
            return Err(PulseError::TimestampParse(format!(
                "record {id} has no created_at"
            )))
        }
    };

    let closed_at = match value.get("closed_at") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(parse_timestamp(s)?),
        Some(other) => {
            return Err(PulseError::TimestampParse(format!(
                "record {id} has a non-string closed_at: {other}"
            )))
        }
    };

    let is_pull_request = value
        .get("pull_request")
        .and_then(|pr| pr.get("html_url"))
        .map(|url| !url.is_null())
        .unwrap_or(false);

    Ok(IssueRecord {
        id,
        is_pull_request,
        created_at,
        closed_at,
    })
}

/// Map a listing of raw payloads, preserving order.
pub fn records_from_values(values: &[Value]) -> Result<Vec<IssueRecord>> {
    values.iter().map(record_from_value).collect()
}

// ── RecordCache ───────────────────────────────────────────────────────────────

/// Per-repository directory holding the last fetched listings.
///
/// Layout: `<root>/<owner>/<repo>/open_issues.json`, `closed_issues.json` and
/// `fetch.json`, which records the window start the closed listing was
/// fetched with.
#[derive(Debug, Clone)]
pub struct RecordCache {
    dir: PathBuf,
}

impl RecordCache {
    pub fn new(root: &Path, owner: &str, repo: &str) -> Self {
        Self {
            dir: root
                .join(sanitize_path_component(owner))
                .join(sanitize_path_component(repo)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn open_path(&self) -> PathBuf {
        self.dir.join(OPEN_FILE)
    }

    pub fn closed_path(&self) -> PathBuf {
        self.dir.join(CLOSED_FILE)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE)
    }

    /// Persist both listings, replacing any previous cache. `since` is the
    /// window start the closed listing was fetched with.
    pub fn save(&self, raw: &RawCollections, since: DateTime<Utc>) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|source| PulseError::FileWrite {
            path: self.dir.clone(),
            source,
        })?;
        write_json_atomic(&self.open_path(), &raw.open)?;
        write_json_atomic(&self.closed_path(), &raw.closed)?;
        write_json_atomic(&self.meta_path(), &FetchMeta { since })?;
        debug!(
            "Cached {} open and {} closed records in {}",
            raw.open.len(),
            raw.closed.len(),
            self.dir.display()
        );
        Ok(())
    }

    /// Load both listings saved by a previous run.
    pub fn load(&self) -> Result<RawCollections> {
        let open = read_json_array(&self.open_path())?;
        let closed = read_json_array(&self.closed_path())?;
        debug!("{} open issues.", open.len());
        debug!("{} closed issues.", closed.len());
        Ok(RawCollections { open, closed })
    }

    /// Window start of the cached closed listing, if recorded.
    pub fn fetched_since(&self) -> Result<Option<DateTime<Utc>>> {
        let path = self.meta_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|source| PulseError::FileRead {
            path: path.clone(),
            source,
        })?;
        let meta: FetchMeta = serde_json::from_str(&content)?;
        Ok(Some(meta.since))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FetchMeta {
    since: DateTime<Utc>,
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn read_json_array(path: &Path) -> Result<Vec<Value>> {
    if !path.exists() {
        return Err(PulseError::CacheMissing(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| PulseError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Write to a sibling temp file, then rename over `path`.
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|source| PulseError::FileWrite {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| PulseError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace anything that is not safe in a single path component.
fn sanitize_path_component(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    // ── record_from_value ─────────────────────────────────────────────────

    #[test]
    fn test_open_issue_payload() {
        let value = json!({
            "id": 1001,
            "number": 12,
            "created_at": "2013-06-10T08:00:00Z",
            "closed_at": null,
            "pull_request": { "html_url": null, "diff_url": null, "patch_url": null },
        });
        let rec = record_from_value(&value).unwrap();
        assert_eq!(rec.id, "12");
        assert!(!rec.is_pull_request);
        assert_eq!(rec.created_at, Utc.with_ymd_and_hms(2013, 6, 10, 8, 0, 0).unwrap());
        assert!(rec.closed_at.is_none());
    }

    #[test]
    fn test_closed_pull_payload() {
        let value = json!({
            "number": 13,
            "created_at": "2013-06-10T00:00:00Z",
            "closed_at": "2013-06-15T00:00:00Z",
            "pull_request": { "html_url": "https://github.com/o/r/pull/13" },
        });
        let rec = record_from_value(&value).unwrap();
        assert!(rec.is_pull_request);
        assert_eq!(
            rec.closed_at,
            Some(Utc.with_ymd_and_hms(2013, 6, 15, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_missing_pull_request_key_is_issue() {
        let value = json!({ "number": 14, "created_at": "2013-06-10T00:00:00Z" });
        let rec = record_from_value(&value).unwrap();
        assert!(!rec.is_pull_request);
        assert!(rec.closed_at.is_none());
    }

    #[test]
    fn test_id_falls_back_to_global_id() {
        let value = json!({ "id": 99, "created_at": "2013-06-10T00:00:00Z" });
        assert_eq!(record_from_value(&value).unwrap().id, "99");
    }

    #[test]
    fn test_missing_created_at_fails() {
        let value = json!({ "number": 15 });
        assert!(matches!(
            record_from_value(&value),
            Err(PulseError::TimestampParse(msg)) if msg.contains("15")
        ));
    }

    #[test]
    fn test_bad_closed_at_fails() {
        let value = json!({
            "number": 16,
            "created_at": "2013-06-10T00:00:00Z",
            "closed_at": "not a date",
        });
        assert!(record_from_value(&value).is_err());
    }

    #[test]
    fn test_records_from_values_preserves_order() {
        let values = vec![
            json!({ "number": 2, "created_at": "2013-06-10T00:00:00Z" }),
            json!({ "number": 1, "created_at": "2013-06-09T00:00:00Z" }),
        ];
        let ids: Vec<String> = records_from_values(&values)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    // ── RecordCache ───────────────────────────────────────────────────────

    #[test]
    fn test_cache_save_then_load() {
        let tmp = TempDir::new().expect("tempdir");
        let cache = RecordCache::new(tmp.path(), "joomla", "joomla-framework");
        let raw = RawCollections {
            open: vec![json!({
                "number": 1,
                "created_at": "2013-06-10T00:00:00Z",
                "title": "keep me",
            })],
            closed: vec![],
        };

        let since = Utc.with_ymd_and_hms(2013, 6, 1, 0, 0, 0).unwrap();

        cache.save(&raw, since).expect("save");
        assert!(cache.open_path().exists());
        assert!(cache.closed_path().exists());

        let loaded = cache.load().expect("load");
        assert_eq!(loaded, raw);
        assert_eq!(loaded.open[0]["title"], "keep me");
        assert_eq!(cache.fetched_since().expect("meta"), Some(since));
    }

    #[test]
    fn test_cache_without_meta_has_no_since() {
        let tmp = TempDir::new().expect("tempdir");
        let cache = RecordCache::new(tmp.path(), "joomla", "joomla-framework");
        assert_eq!(cache.fetched_since().expect("meta"), None);
    }

    #[test]
    fn test_cache_missing_is_reported() {
        let tmp = TempDir::new().expect("tempdir");
        let cache = RecordCache::new(tmp.path(), "nobody", "nothing");
        assert!(matches!(cache.load(), Err(PulseError::CacheMissing(_))));
    }

    #[test]
    fn test_cache_layout_sanitises_names() {
        let tmp = TempDir::new().expect("tempdir");
        let cache = RecordCache::new(tmp.path(), "../evil", "repo name");
        assert_eq!(cache.dir(), tmp.path().join(".._evil").join("repo_name"));
    }

    #[test]
    fn test_sanitize_all_dots() {
        assert_eq!(sanitize_path_component(".."), "_");
        assert_eq!(sanitize_path_component(""), "_");
        assert_eq!(sanitize_path_component("rust-lang"), "rust-lang");
    }
}
