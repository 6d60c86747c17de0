//! Calendar dates as they travel on the wire.
//!
//! Dates are always `YYYY-MM-DD` on the wire; the display layer transposes
//! to `DD-MM-YYYY`. [`to_display_date`] and [`to_iso_date`] are exact
//! inverses for any valid ISO date string.

use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error returned when a wire date is not a real `YYYY-MM-DD` date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date format, use YYYY-MM-DD")]
pub struct InvalidDate;

fn iso_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static date pattern"))
}

/// Calendar date of a diary entry.
///
/// ## Invariants
/// - Parses only zero-padded `YYYY-MM-DD` strings naming real dates;
///   `2024-02-30` and `2024-1-1` are both rejected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "2024-01-01")]
pub struct EntryDate(NaiveDate);

impl EntryDate {
    /// Parse a strict `YYYY-MM-DD` wire date.
    pub fn parse(raw: &str) -> Result<Self, InvalidDate> {
        if !iso_regex().is_match(raw) {
            return Err(InvalidDate);
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| InvalidDate)
    }

    /// Underlying calendar date.
    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// Wrap an already-validated date.
    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Wire form, `YYYY-MM-DD`.
    pub fn iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// `YYYY-MM` prefix used by month filters.
    pub fn month_prefix(&self) -> String {
        self.0.format("%Y-%m").to_string()
    }

    /// `YYYY` prefix used by year filters.
    pub fn year_prefix(&self) -> String {
        self.0.format("%Y").to_string()
    }
}

impl fmt::Display for EntryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iso())
    }
}

impl TryFrom<String> for EntryDate {
    type Error = InvalidDate;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntryDate> for String {
    fn from(value: EntryDate) -> Self {
        value.iso()
    }
}

/// Transpose `YYYY-MM-DD` into the display form `DD-MM-YYYY`.
///
/// Anything that is not a wire date is passed through unchanged, matching
/// the forgiving behaviour the display layer relies on.
pub fn to_display_date(iso: &str) -> String {
    if !iso_regex().is_match(iso) {
        return iso.to_owned();
    }
    let mut parts = iso.splitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(y), Some(m), Some(d)) => format!("{d}-{m}-{y}"),
        _ => iso.to_owned(),
    }
}

/// Transpose `DD-MM-YYYY` back into the wire form `YYYY-MM-DD`.
///
/// Strings already in wire form are returned as-is; anything else is passed
/// through unchanged.
pub fn to_iso_date(maybe: &str) -> String {
    if iso_regex().is_match(maybe) {
        return maybe.to_owned();
    }
    static DISPLAY_RE: OnceLock<Regex> = OnceLock::new();
    let display = DISPLAY_RE
        .get_or_init(|| Regex::new(r"^(\d{2})-(\d{2})-(\d{4})$").expect("static display pattern"));
    match display.captures(maybe) {
        Some(caps) => format!("{}-{}-{}", &caps[3], &caps[2], &caps[1]),
        None => maybe.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2024-01-01")]
    #[case("1999-12-31")]
    #[case("2024-02-29")]
    fn parses_real_dates(#[case] raw: &str) {
        let date = EntryDate::parse(raw).expect("valid date");
        assert_eq!(date.iso(), raw);
    }

    #[rstest]
    #[case("2024-1-1")]
    #[case("2023-02-29")]
    #[case("2024-13-01")]
    #[case("01-01-2024")]
    #[case("yesterday")]
    fn rejects_malformed_dates(#[case] raw: &str) {
        assert_eq!(EntryDate::parse(raw), Err(InvalidDate));
    }

    #[rstest]
    #[case("2024-01-05")]
    #[case("2024-12-31")]
    #[case("1987-06-15")]
    fn display_round_trips(#[case] iso: &str) {
        assert_eq!(to_iso_date(&to_display_date(iso)), iso);
    }

    #[test]
    fn transposition_is_positional() {
        assert_eq!(to_display_date("2024-01-05"), "05-01-2024");
        assert_eq!(to_iso_date("05-01-2024"), "2024-01-05");
    }

    #[test]
    fn non_dates_pass_through() {
        assert_eq!(to_display_date("soon"), "soon");
        assert_eq!(to_iso_date("soon"), "soon");
    }

    #[test]
    fn prefixes_match_iso_form() {
        let date = EntryDate::parse("2024-03-09").expect("valid date");
        assert_eq!(date.month_prefix(), "2024-03");
        assert_eq!(date.year_prefix(), "2024");
    }
}
