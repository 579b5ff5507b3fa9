//! Best-effort publication dates.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Layout used for the human-readable date, e.g. "October 19, 2026 at 3:04 PM".
const DISPLAY_FORMAT: &str = "%B %-d, %Y at %-I:%M %p";

/// Timezone-less layouts, read as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Outcome of reading a feed's date text. Parsing never fails outright:
/// text that matches no known layout is carried as [`PublishedAt::Unparsed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PublishedAt {
    Parsed(DateTime<FixedOffset>),
    Unparsed(String),
    Missing,
}

impl PublishedAt {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::Missing;
        }
        match parse_date(raw) {
            Some(dt) => Self::Parsed(dt),
            None => {
                tracing::debug!(date = raw, "Unrecognized date format");
                Self::Unparsed(raw.to_owned())
            }
        }
    }

    /// Formatted in the offset the feed declared; `None` when nothing was given.
    pub fn display(&self) -> Option<String> {
        match self {
            Self::Parsed(dt) => Some(dt.format(DISPLAY_FORMAT).to_string()),
            Self::Unparsed(raw) => Some(raw.clone()),
            Self::Missing => None,
        }
    }
}

fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    // ISO 8601 with a compact offset, e.g. 2024-01-15T10:30:00+0000
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt);
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc2822() {
        let parsed = PublishedAt::parse("Mon, 19 Oct 2026 15:04:00 +0000");
        assert!(matches!(parsed, PublishedAt::Parsed(_)));
        assert_eq!(parsed.display().as_deref(), Some("October 19, 2026 at 3:04 PM"));
    }

    #[test]
    fn test_rfc2822_with_zone_name() {
        let parsed = PublishedAt::parse("Tue, 02 Jan 2024 08:05:00 GMT");
        assert_eq!(parsed.display().as_deref(), Some("January 2, 2024 at 8:05 AM"));
    }

    #[test]
    fn test_rfc3339_keeps_declared_offset() {
        let parsed = PublishedAt::parse("2024-03-05T21:30:00-05:00");
        assert_eq!(parsed.display().as_deref(), Some("March 5, 2024 at 9:30 PM"));
        let PublishedAt::Parsed(dt) = parsed else {
            panic!("expected a parsed date, got {parsed:?}");
        };
        assert_eq!(dt.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_naive_variants_are_utc() {
        for raw in ["2024-01-15 10:30:00", "2024-01-15T10:30:00", "2024-01-15T10:30:00.250", "2024-01-15T10:30"] {
            let parsed = PublishedAt::parse(raw);
            assert_eq!(
                parsed.display().as_deref(),
                Some("January 15, 2024 at 10:30 AM"),
                "{raw}"
            );
        }
        assert_eq!(
            PublishedAt::parse("2024-01-15").display().as_deref(),
            Some("January 15, 2024 at 12:00 AM")
        );
    }

    #[test]
    fn test_unparseable_is_kept_raw() {
        let parsed = PublishedAt::parse("  sometime last week ");
        assert_eq!(parsed, PublishedAt::Unparsed("sometime last week".into()));
        assert_eq!(parsed.display().as_deref(), Some("sometime last week"));
    }

    #[test]
    fn test_missing() {
        assert_eq!(PublishedAt::parse(""), PublishedAt::Missing);
        assert_eq!(PublishedAt::parse("   \n"), PublishedAt::Missing);
        assert_eq!(PublishedAt::Missing.display(), None);
    }
}
