//! Date helper functions

use chrono::{DateTime, Datelike, FixedOffset, TimeZone};
use chrono_tz::Tz;

use crate::i18n::Locale;

/// Tokens understood by [`format_date`], longest first
///
/// Both date-fns (`dd`, `yyyy`) and Moment.js (`DD`, `YYYY`) spellings are
/// accepted for day and year.
const TOKENS: &[&str] = &[
    "yyyy", "YYYY", "MMMM", "MMM", "yy", "YY", "MM", "dd", "DD", "HH", "mm", "ss", "M", "d", "D",
];

/// Format a date with a date-fns style pattern and localized month names
///
/// # Examples
/// ```ignore
/// format_date(&date, "dd MMM yyyy", &PT_BR) // -> "25 mar 2021"
/// ```
pub fn format_date<Tz2: TimeZone>(date: &DateTime<Tz2>, pattern: &str, locale: &Locale) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;

    while !rest.is_empty() {
        match TOKENS.iter().find(|token| rest.starts_with(**token)) {
            Some(token) => {
                out.push_str(&format_token(date, token, locale));
                rest = &rest[token.len()..];
            }
            None => {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    out.push(c);
                }
                rest = chars.as_str();
            }
        }
    }

    out
}

fn format_token<Tz2: TimeZone>(date: &DateTime<Tz2>, token: &str, locale: &Locale) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    match token {
        "yyyy" | "YYYY" => date.format("%Y").to_string(),
        "yy" | "YY" => date.format("%y").to_string(),
        "MMMM" => locale.month(date.month()).to_string(),
        "MMM" => locale.month_short(date.month()).to_string(),
        "MM" => date.format("%m").to_string(),
        "M" => date.month().to_string(),
        "dd" | "DD" => date.format("%d").to_string(),
        "d" | "D" => date.day().to_string(),
        "HH" => date.format("%H").to_string(),
        "mm" => date.format("%M").to_string(),
        "ss" => date.format("%S").to_string(),
        other => other.to_string(),
    }
}

/// Parse a repository timestamp
///
/// Accepts RFC 3339 and the `+0000` offset form the repository emits.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

/// Formats publication dates with the site's pattern, locale and timezone
#[derive(Debug, Clone)]
pub struct DateFormatter {
    pattern: String,
    locale: &'static Locale,
    timezone: Tz,
}

impl DateFormatter {
    pub fn new(pattern: &str, locale: &'static Locale, timezone: Tz) -> Self {
        Self {
            pattern: pattern.to_string(),
            locale,
            timezone,
        }
    }

    /// Format a parsed timestamp in the site's timezone
    pub fn format(&self, date: &DateTime<FixedOffset>) -> String {
        format_date(
            &date.with_timezone(&self.timezone),
            &self.pattern,
            self.locale,
        )
    }

    /// Format a raw timestamp; absent or unparseable input gives `None`
    pub fn format_raw(&self, raw: Option<&str>) -> Option<String> {
        let raw = raw?;
        match parse_timestamp(raw) {
            Some(date) => Some(self.format(&date)),
            None => {
                tracing::debug!("Ignoring unparseable timestamp {:?}", raw);
                None
            }
        }
    }
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz2: TimeZone>(date: &DateTime<Tz2>) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{EN, PT_BR};

    fn utc() -> DateFormatter {
        DateFormatter::new("dd MMM yyyy", &PT_BR, Tz::UTC)
    }

    #[test]
    fn test_format_date_pt_br() {
        let date = parse_timestamp("2021-03-25T00:00:00Z").unwrap();
        assert_eq!(format_date(&date, "dd MMM yyyy", &PT_BR), "25 mar 2021");
        assert_eq!(format_date(&date, "d MMMM", &PT_BR), "25 março");
        assert_eq!(format_date(&date, "YYYY-MM-DD", &EN), "2021-03-25");
    }

    #[test]
    fn test_parse_repository_offsets() {
        assert!(parse_timestamp("2021-03-25T19:25:28+0000").is_some());
        assert!(parse_timestamp("2021-03-25T19:25:28+00:00").is_some());
        assert!(parse_timestamp("2021-03-25T19:25:28.123+0000").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_formatter_timezone() {
        let sao_paulo = DateFormatter::new("dd MMM yyyy", &PT_BR, chrono_tz::America::Sao_Paulo);
        assert_eq!(
            sao_paulo.format_raw(Some("2021-03-25T00:00:00Z")).as_deref(),
            Some("24 mar 2021")
        );
        assert_eq!(
            utc().format_raw(Some("2021-03-25T00:00:00Z")).as_deref(),
            Some("25 mar 2021")
        );
    }

    #[test]
    fn test_formatter_missing_dates() {
        assert_eq!(utc().format_raw(None), None);
        assert_eq!(utc().format_raw(Some("not a date")), None);
    }

    #[test]
    fn test_date_xml() {
        let date = parse_timestamp("2021-03-25T19:25:28+0000").unwrap();
        assert_eq!(date_xml(&date), "2021-03-25T19:25:28+00:00");
    }
}
