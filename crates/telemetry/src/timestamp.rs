use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A sample timestamp exactly as the API sent it.
///
/// The raw text is kept so it can be sent back verbatim (e.g. as `timepick`);
/// [`Timestamp::parse`] interprets it for ordering and gap calculations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wall-clock time of the sample, accepting RFC 3339, RFC 2822 (`"Tue, 01 Jul 2025 10:00:00 GMT"`)
    /// and plain `YYYY-MM-DD[ T]HH:MM[:SS[.fff]]` forms.
    pub fn parse(&self) -> Option<NaiveDateTime> {
        let raw = self.0.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_local());
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
            return Some(dt.naive_local());
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }

    pub fn date_label(&self) -> Option<String> {
        self.parse().map(|dt| dt.format("%m/%d/%Y").to_string())
    }

    pub fn time_label(&self) -> Option<String> {
        self.parse().map(|dt| dt.format("%H:%M:%S").to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parse() {
            Some(dt) => write!(f, "{}", dt.format("%m/%d/%Y %H:%M:%S")),
            None => f.write_str(&self.0),
        }
    }
}

pub trait Timestamped {
    fn timestamp(&self) -> &Timestamp;
}

/// Sorts samples oldest first. Samples without a readable timestamp sort first.
pub fn sort_chronologically<T: Timestamped>(samples: &mut [T]) {
    samples.sort_by_key(|s| s.timestamp().parse());
}

/// The sample taken exactly at `picked`, or failing that the newest one taken before it.
pub fn at_or_before<'a, T: Timestamped>(samples: &'a [T], picked: &Timestamp) -> Option<&'a T> {
    if let Some(exact) = samples.iter().find(|s| s.timestamp() == picked) {
        return Some(exact);
    }

    let picked = picked.parse()?;

    samples
        .iter()
        .filter_map(|s| s.timestamp().parse().map(|t| (t, s)))
        .filter(|(t, _)| *t <= picked)
        .max_by_key(|(t, _)| *t)
        .map(|(_, s)| s)
}
