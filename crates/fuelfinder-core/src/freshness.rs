//! Price freshness buckets.
//!
//! Each price carries the time it was last communicated, as
//! `DD/MM/YYYY HH:MM:SS` local time. The age relative to a reference time
//! picks a bucket, and each bucket has a fixed display colour.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const PRICE_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Timestamps this far ahead of the reference time are treated as clock
/// skew rather than bad data.
const FUTURE_TOLERANCE_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Updated within the last 24 hours.
    Fresh,
    /// Updated within the last 3 days.
    Recent,
    /// Updated within the last 7 days.
    Stale,
    Old,
    /// Missing or unparsable timestamp.
    Unknown,
}

impl Freshness {
    /// Bucket for a raw timestamp string.
    ///
    /// Never fails: anything that does not parse as a real calendar date
    /// (e.g. `31/02/2024 10:00:00`) is [`Freshness::Unknown`].
    #[must_use]
    pub fn classify(raw: Option<&str>, reference: NaiveDateTime) -> Self {
        raw.and_then(parse_price_date)
            .map_or(Freshness::Unknown, |updated| {
                Self::from_age(reference - updated)
            })
    }

    #[must_use]
    pub fn from_age(age: Duration) -> Self {
        if age < -Duration::minutes(FUTURE_TOLERANCE_MINUTES) {
            Freshness::Unknown
        } else if age < Duration::hours(24) {
            Freshness::Fresh
        } else if age < Duration::hours(72) {
            Freshness::Recent
        } else if age < Duration::days(7) {
            Freshness::Stale
        } else {
            Freshness::Old
        }
    }

    /// Hex colour used for markers and list badges.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Freshness::Fresh => "#2e7d32",
            Freshness::Recent => "#f9a825",
            Freshness::Stale => "#ef6c00",
            Freshness::Old => "#c62828",
            Freshness::Unknown => "#757575",
        }
    }
}

impl std::fmt::Display for Freshness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Freshness::Fresh => write!(f, "fresh"),
            Freshness::Recent => write!(f, "recent"),
            Freshness::Stale => write!(f, "stale"),
            Freshness::Old => write!(f, "old"),
            Freshness::Unknown => write!(f, "unknown"),
        }
    }
}

/// Parse a `DD/MM/YYYY HH:MM:SS` timestamp, or `None` if it is malformed.
#[must_use]
pub fn parse_price_date(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), PRICE_DATE_FORMAT).ok()
}
