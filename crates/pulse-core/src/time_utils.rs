use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, Utc};

use crate::error::{PulseError, Result};
use crate::models::MonthKey;

// ── Month keys ────────────────────────────────────────────────────────────────

/// The calendar month (UTC) that `ts` falls in.
pub fn month_key(ts: DateTime<Utc>) -> MonthKey {
    MonthKey::new(ts.year(), ts.month())
}

// ── Lookback window ───────────────────────────────────────────────────────────

/// Start of the reporting window: midnight UTC on the first day of the month
/// `months` calendar months before `now`'s month.
///
/// The day is pinned to the 1st before stepping back, so a `now` of
/// 31 March never overflows into a short month.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use pulse_core::time_utils::lookback_since;
///
/// let now = Utc.with_ymd_and_hms(2013, 7, 19, 15, 30, 0).unwrap();
/// let since = lookback_since(now, 3).unwrap();
/// assert_eq!(since, Utc.with_ymd_and_hms(2013, 4, 1, 0, 0, 0).unwrap());
/// ```
pub fn lookback_since(now: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|first| first.checked_sub_months(Months::new(months)))
        .and_then(|start| start.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            PulseError::Config(format!(
                "a lookback of {months} months from {now} is out of range"
            ))
        })
}

// ── Cycle time ────────────────────────────────────────────────────────────────

/// Elapsed time from `created` to `closed` in fractional days.
///
/// Computed as whole days + hours / 24 + minutes / 1440. Seconds are
/// dropped, so the result is floored to the minute.
pub fn cycle_time_days(created: DateTime<Utc>, closed: DateTime<Utc>) -> f64 {
    let elapsed = closed - created;
    let days = elapsed.num_days();
    let hours = elapsed.num_hours() - days * 24;
    let minutes = elapsed.num_minutes() - elapsed.num_hours() * 60;

    days as f64 + hours as f64 / 24.0 + minutes as f64 / 1440.0
}

// ── Timestamp parsing ─────────────────────────────────────────────────────────

/// Parse an ISO 8601 / RFC 3339 timestamp string into a UTC [`DateTime`].
///
/// Accepts the `Z`-suffix form GitHub emits, any fixed offset, and naive
/// date-times (interpreted as UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if s.is_empty() {
        return Err(PulseError::TimestampParse(s.to_string()));
    }

    let normalised = if let Some(stripped) = s.strip_suffix('Z') {
        format!("{}+00:00", stripped)
    } else {
        s.to_string()
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
        return Ok(dt.with_timezone(&Utc));
    }

    const FMTS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in FMTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    Err(PulseError::TimestampParse(s.to_string()))
}

/// Format a UTC timestamp the way GitHub's API expects (`2013-06-01T00:00:00Z`).
pub fn format_api_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    // ── month_key ────────────────────────────────────────────────────────────

    #[test]
    fn test_month_key_formats_zero_padded() {
        let key = month_key(utc(2013, 7, 4, 12, 0, 0));
        assert_eq!(key.to_string(), "2013-07");
    }

    #[test]
    fn test_month_key_last_second_of_month() {
        let key = month_key(utc(2013, 12, 31, 23, 59, 59));
        assert_eq!(key, MonthKey::new(2013, 12));
    }

    // ── lookback_since ───────────────────────────────────────────────────────

    #[test]
    fn test_lookback_since_same_year() {
        let since = lookback_since(utc(2013, 9, 18, 10, 5, 3), 3).unwrap();
        assert_eq!(since, utc(2013, 6, 1, 0, 0, 0));
    }

    #[test]
    fn test_lookback_since_crosses_year() {
        let since = lookback_since(utc(2014, 2, 10, 0, 0, 0), 12).unwrap();
        assert_eq!(since, utc(2013, 2, 1, 0, 0, 0));
    }

    #[test]
    fn test_lookback_since_end_of_long_month() {
        // 31 March minus one month must not land in March.
        let since = lookback_since(utc(2013, 3, 31, 23, 0, 0), 1).unwrap();
        assert_eq!(since, utc(2013, 2, 1, 0, 0, 0));
    }

    #[test]
    fn test_lookback_since_zero_months_is_start_of_month() {
        let since = lookback_since(utc(2013, 7, 19, 8, 0, 0), 0).unwrap();
        assert_eq!(since, utc(2013, 7, 1, 0, 0, 0));
    }

    // ── cycle_time_days ──────────────────────────────────────────────────────

    #[test]
    fn test_cycle_time_whole_days() {
        let days = cycle_time_days(utc(2013, 6, 10, 0, 0, 0), utc(2013, 6, 15, 0, 0, 0));
        assert_eq!(days, 5.0);
    }

    #[test]
    fn test_cycle_time_hours_and_minutes() {
        // 1 day, 6 hours, 36 minutes.
        let days = cycle_time_days(utc(2013, 6, 1, 0, 0, 0), utc(2013, 6, 2, 6, 36, 0));
        let expected = 1.0 + 6.0 / 24.0 + 36.0 / 1440.0;
        assert!((days - expected).abs() < 1e-12, "days = {days}");
    }

    #[test]
    fn test_cycle_time_ignores_seconds() {
        let with_secs = cycle_time_days(utc(2013, 6, 1, 0, 0, 0), utc(2013, 6, 1, 0, 10, 59));
        let without = cycle_time_days(utc(2013, 6, 1, 0, 0, 0), utc(2013, 6, 1, 0, 10, 0));
        assert_eq!(with_secs, without);
    }

    #[test]
    fn test_cycle_time_spans_months() {
        // Whole days are counted across month boundaries.
        let days = cycle_time_days(utc(2013, 1, 15, 0, 0, 0), utc(2013, 3, 15, 12, 0, 0));
        assert_eq!(days, 59.5);
    }

    #[test]
    fn test_cycle_time_zero() {
        let t = utc(2013, 6, 1, 9, 0, 0);
        assert_eq!(cycle_time_days(t, t), 0.0);
    }

    // ── parse_timestamp ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_timestamp_z_suffix() {
        let ts = parse_timestamp("2013-06-10T14:22:05Z").unwrap();
        assert_eq!(ts, utc(2013, 6, 10, 14, 22, 5));
    }

    #[test]
    fn test_parse_timestamp_offset() {
        let ts = parse_timestamp("2013-06-10T16:22:05+02:00").unwrap();
        assert_eq!(ts, utc(2013, 6, 10, 14, 22, 5));
    }

    #[test]
    fn test_parse_timestamp_naive_is_utc() {
        let ts = parse_timestamp("2013-06-10 14:22:05").unwrap();
        assert_eq!(ts, utc(2013, 6, 10, 14, 22, 5));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(PulseError::TimestampParse(_))
        ));
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn test_format_api_timestamp() {
        assert_eq!(
            format_api_timestamp(utc(2013, 6, 1, 0, 0, 0)),
            "2013-06-01T00:00:00Z"
        );
    }
}
