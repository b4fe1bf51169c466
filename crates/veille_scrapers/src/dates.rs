//! Raw published-date parsing for heterogeneous source formats.
//!
//! Sources publish dates as RFC 3339 `datetime` attributes, bare ISO dates,
//! day-first numeric forms, or French prose ("12 janvier 2026").

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

const FRENCH_MONTHS: &[(&str, &str)] = &[
    ("janvier", "January"),
    ("février", "February"),
    ("mars", "March"),
    ("avril", "April"),
    ("mai", "May"),
    ("juin", "June"),
    ("juillet", "July"),
    ("août", "August"),
    ("septembre", "September"),
    ("octobre", "October"),
    ("novembre", "November"),
    ("décembre", "December"),
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// WordPress permalink date segments, e.g. `/2026/03/14/slug/`.
static URL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(\d{4})/(\d{2})/(\d{2})/").unwrap());

/// Parses a raw date string from a listing block or article page. Returns
/// None when no known format matches; the caller drops such stubs.
pub fn parse_raw_date(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // RFC 3339 datetime attributes first: keep the clock time as written.
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }

    let anglicized = anglicize_months(trimmed);
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(&anglicized, format) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Extracts a publication date from a WordPress-style permalink.
pub fn date_from_url(url: &str) -> Option<NaiveDateTime> {
    let captures = URL_DATE.captures(url)?;
    let year: i32 = captures[1].parse().ok()?;
    let month: u32 = captures[2].parse().ok()?;
    let day: u32 = captures[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}

fn anglicize_months(raw: &str) -> String {
    let mut text = raw.to_lowercase();
    for (fr, en) in FRENCH_MONTHS {
        if text.contains(fr) {
            text = text.replace(fr, en);
            break;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_rfc3339_datetime_attribute() {
        assert_eq!(
            parse_raw_date("2026-03-14T14:50:03+00:00"),
            Some(dt(2026, 3, 14, 14, 50, 3))
        );
    }

    #[test]
    fn test_bare_iso_date() {
        assert_eq!(parse_raw_date("2026-03-14"), Some(dt(2026, 3, 14, 0, 0, 0)));
    }

    #[test]
    fn test_day_first_numeric() {
        assert_eq!(parse_raw_date("14/03/2026"), Some(dt(2026, 3, 14, 0, 0, 0)));
        assert_eq!(
            parse_raw_date("14/03/2026 09:15"),
            Some(dt(2026, 3, 14, 9, 15, 0))
        );
    }

    #[test]
    fn test_french_prose_date() {
        assert_eq!(
            parse_raw_date("14 mars 2026"),
            Some(dt(2026, 3, 14, 0, 0, 0))
        );
        assert_eq!(
            parse_raw_date("1 août 2026"),
            Some(dt(2026, 8, 1, 0, 0, 0))
        );
    }

    #[test]
    fn test_unparseable_returns_none() {
        assert_eq!(parse_raw_date("il y a 3 heures"), None);
        assert_eq!(parse_raw_date(""), None);
    }

    #[test]
    fn test_date_from_wordpress_url() {
        assert_eq!(
            date_from_url("https://ledjely.com/2026/03/14/ceni-calendrier/"),
            Some(dt(2026, 3, 14, 0, 0, 0))
        );
        assert_eq!(date_from_url("https://ledjely.com/a-propos/"), None);
    }
}
