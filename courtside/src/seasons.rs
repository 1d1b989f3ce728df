// Season labels and season types.
//
// The stats API addresses a season by its short label ("2012-13") and one of
// two competition phases per season. Everything here is pure; the fetch loop
// owns the I/O.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("invalid year range: start year {start} is after end year {end}")]
pub struct InvalidRangeError {
    pub start: i32,
    pub end: i32,
}

// ---------------------------------------------------------------------------
// SeasonLabel
// ---------------------------------------------------------------------------

/// A season label in the API's short form, e.g. `"2012-13"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeasonLabel(String);

impl SeasonLabel {
    /// Build the label for the season starting in `start_year`
    /// (2012 → `"2012-13"`, 1999 → `"1999-00"`).
    pub fn from_start_year(start_year: i32) -> Self {
        SeasonLabel(format!("{}-{:02}", start_year, (start_year + 1).rem_euclid(100)))
    }

    /// Wrap an already-formatted label (used when reading persisted rows).
    pub fn from_raw(label: impl Into<String>) -> Self {
        SeasonLabel(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the starting year from the first four characters of the label.
    /// Returns `None` when the label does not begin with a four-digit year.
    pub fn start_year(&self) -> Option<i32> {
        self.0.get(..4)?.parse().ok()
    }
}

impl std::fmt::Display for SeasonLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SeasonType
// ---------------------------------------------------------------------------

/// The two disjoint competition phases of a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeasonType {
    Regular,
    Playoffs,
}

impl SeasonType {
    /// Fetch order within a season: regular season before playoffs.
    pub const ALL: [SeasonType; 2] = [SeasonType::Regular, SeasonType::Playoffs];

    /// The value sent as the `SeasonType` query parameter.
    pub fn api_value(self) -> &'static str {
        match self {
            SeasonType::Regular => "Regular Season",
            SeasonType::Playoffs => "Playoffs",
        }
    }

    /// Canonical short code stored in the master table.
    pub fn code(self) -> &'static str {
        match self {
            SeasonType::Regular => "RS",
            SeasonType::Playoffs => "Playoffs",
        }
    }

    /// Canonicalize a source-side label. Accepts the URL-encoded form the
    /// upstream API uses for the regular season as well as the short code.
    pub fn from_source_label(label: &str) -> Option<SeasonType> {
        match label {
            "Regular%20Season" | "Regular Season" | "RS" => Some(SeasonType::Regular),
            "Playoffs" => Some(SeasonType::Playoffs),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Year range expansion
// ---------------------------------------------------------------------------

/// Expand an inclusive `(start, end)` year pair into the ordered sequence of
/// season labels, ascending. Fails when `start > end`.
pub fn expand_year_range(start: i32, end: i32) -> Result<Vec<SeasonLabel>, InvalidRangeError> {
    if start > end {
        return Err(InvalidRangeError { start, end });
    }
    Ok((start..=end).map(SeasonLabel::from_start_year).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
