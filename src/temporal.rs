//! Parsing and formatting of temporal cell values.
//!
//! Dates render as `YYYY-MM-DD`; datetimes as `YYYY-MM-DDTHH:MM:SS`, with
//! milliseconds appended only when they are non-zero.

use chrono::{NaiveDate, NaiveDateTime, Timelike};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO 8601 date (`YYYY-MM-DD`).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse an ISO 8601 datetime. A bare date is read as midnight and a trailing
/// `Z` is ignored.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_end_matches('Z');
    if let Some(date) = parse_date(s) {
        return date.and_hms_opt(0, 0, 0);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// True when the text looks like a datetime with a time part, as opposed to a
/// bare date.
pub fn has_time_part(s: &str) -> bool {
    let s = s.trim();
    (s.contains('T') || s.contains(' ')) && s.contains(':')
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() / 1_000_000 > 0 {
        dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let d = parse_date("2024-02-29").unwrap();
        assert_eq!(format_date(&d), "2024-02-29");
        assert!(parse_date("2023-02-29").is_none());
        assert!(parse_date("2024-2-9").is_none());
        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn test_parse_datetime_variants() {
        let a = parse_datetime("2024-01-15T10:30:00").unwrap();
        let b = parse_datetime("2024-01-15 10:30").unwrap();
        let c = parse_datetime("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);

        let midnight = parse_datetime("2024-01-15").unwrap();
        assert_eq!(format_datetime(&midnight), "2024-01-15T00:00:00");
    }

    #[test]
    fn test_format_datetime_millis() {
        let dt = parse_datetime("2024-01-15T10:30:00.250").unwrap();
        assert_eq!(format_datetime(&dt), "2024-01-15T10:30:00.250");
        assert!(has_time_part("2024-01-15 10:30"));
        assert!(!has_time_part("2024-01-15"));
    }
}
