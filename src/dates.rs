//! Timestamp normalisation for the two sources the pipeline reads.
//!
//! Raw logger files stamp detections as `DD/MM/YY HH:MM:SS`; the trigger
//! table written by this crate uses `YYYY-MM-DD HH:MM:SS`. Placement sheets
//! carry bare dates with either a two- or four-digit year.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::ResolveError;

/// Output format for every timestamp this crate writes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// `%y` must be tried before `%Y`: chrono accepts a two-digit `%Y` and would
// read "21" as the year 21.
const TIMESTAMP_PATTERNS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_PATTERNS: &[&str] = &["%d/%m/%y", "%d/%m/%Y", "%Y-%m-%d"];

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ResolveError> {
    let trimmed = value.trim();
    TIMESTAMP_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(trimmed, pattern).ok())
        .ok_or_else(|| ResolveError::MalformedTimestamp {
            value: value.to_string(),
        })
}

/// Parses a placement effective date. Only day granularity is kept.
pub fn parse_date(value: &str) -> Result<NaiveDate, ResolveError> {
    let trimmed = value.trim();
    DATE_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDate::parse_from_str(trimmed, pattern).ok())
        .ok_or_else(|| ResolveError::MalformedTimestamp {
            value: value.to_string(),
        })
}

pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, s))
            .unwrap()
    }

    #[test]
    fn parses_processed_trigger_format() {
        assert_eq!(
            parse_timestamp("2021-06-14 10:02:30").unwrap(),
            at(2021, 6, 14, 10, 2, 30)
        );
    }

    #[test]
    fn parses_raw_logger_format_with_two_digit_year() {
        assert_eq!(
            parse_timestamp("14/06/21 10:02:30").unwrap(),
            at(2021, 6, 14, 10, 2, 30)
        );
    }

    #[test]
    fn both_formats_compare_as_the_same_instant() {
        let raw = parse_timestamp("01/02/22 00:00:05").unwrap();
        let processed = parse_timestamp("2022-02-01 00:00:05").unwrap();
        assert_eq!(raw, processed);
        assert_eq!(
            (parse_timestamp("01/02/22 00:03:05").unwrap() - raw).num_minutes(),
            3
        );
    }

    #[test]
    fn rejects_unknown_layouts() {
        let err = parse_timestamp("June 14th, 10am").unwrap_err();
        assert_eq!(
            err,
            ResolveError::MalformedTimestamp {
                value: "June 14th, 10am".to_string()
            }
        );
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn placement_dates_accept_both_year_widths() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 9).unwrap();
        assert_eq!(parse_date("09/03/21").unwrap(), expected);
        assert_eq!(parse_date("09/03/2021").unwrap(), expected);
        assert!(parse_date("2021/03/09x").is_err());
    }

    #[test]
    fn formats_back_to_processed_layout() {
        assert_eq!(
            format_timestamp(&at(2021, 6, 14, 9, 5, 0)),
            "2021-06-14 09:05:00"
        );
    }
}
