//! JSON rendering of an [`ActivityReport`].

use pulse_core::error::Result;
use pulse_data::analysis::ActivityReport;

/// Pretty-printed JSON of the whole report.
pub fn render_json(report: &ActivityReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pulse_core::models::IssueRecord;
    use pulse_data::analysis::{analyze_records, ReportWindow};

    #[test]
    fn test_json_contains_buckets_and_statistics() {
        let now = Utc.with_ymd_and_hms(2013, 9, 12, 9, 30, 0).unwrap();
        let window = ReportWindow::new("joomla", "joomla-framework", 3, now);
        let closed = vec![IssueRecord::closed(
            "4",
            false,
            Utc.with_ymd_and_hms(2013, 7, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2013, 7, 2, 6, 0, 0).unwrap(),
        )];
        let report = analyze_records(&window, &[], &closed).unwrap();

        let json = render_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["repository"], "joomla/joomla-framework");
        assert_eq!(value["months"], 3);
        let bucket = &value["buckets"][0];
        assert_eq!(bucket["month"], "2013-07");
        assert_eq!(bucket["new_issues"], 1);
        assert_eq!(bucket["closed_issue_cycle_times"]["count"], 1);
        assert_eq!(bucket["closed_issue_cycle_times"]["mean"], 1.25);
        assert!(bucket["closed_pull_cycle_times"]["min"].is_null());
        assert!(json.contains('\n'));
    }
}
