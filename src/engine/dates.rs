//! Date normalization for heterogeneous report and eligibility exports.
//!
//! Accepted shapes:
//! - spreadsheet serials (days since 1899-12-30), as numbers or all-digit text
//! - `D/M/Y` or `M/D/Y` with 1-2 digit parts and a 2 or 4 digit year
//! - `D Mon Y` / `D-Mon-Y` with an English month name of 3+ letters
//! - ISO `YYYY-MM-DD` / `YYYY/MM/DD`, optionally followed by a `T` time
//!
//! Anything after the first whitespace is treated as a time of day and ignored.
//! Unparseable input yields `None`; nothing here panics on bad data.

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::records::{CellValue, SourceKind};

/// Serial 25569 is 1970-01-01
const UNIX_EPOCH_SERIAL: i64 = 25569;
/// Serial for 9999-12-31
const MAX_SERIAL: f64 = 2_958_465.0;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

static NUMERIC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[/\-](\d{1,2})[/\-](\d{2,4})$").unwrap());
static TEXTUAL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2})[/\- ]([a-z]{3,})[/\- ](\d{2,4})$").unwrap());
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[/\-](\d{1,2})[/\-](\d{1,2})(?:T.*)?$").unwrap());
static SERIAL_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(\.\d+)?$").unwrap());

/// Tie-break for numeric dates where both leading parts are <= 12
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateOrder {
    /// Month-first for comma-separated reports, day-first otherwise
    #[default]
    Auto,
    Dmy,
    Mdy,
}

impl DateOrder {
    /// Resolve the `preferMDY` flag for one run
    pub fn prefer_mdy(self, source: SourceKind) -> bool {
        match self {
            DateOrder::Auto => source == SourceKind::Csv,
            DateOrder::Dmy => false,
            DateOrder::Mdy => true,
        }
    }
}

impl fmt::Display for DateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateOrder::Auto => write!(f, "auto"),
            DateOrder::Dmy => write!(f, "dmy"),
            DateOrder::Mdy => write!(f, "mdy"),
        }
    }
}

impl FromStr for DateOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(DateOrder::Auto),
            "dmy" => Ok(DateOrder::Dmy),
            "mdy" => Ok(DateOrder::Mdy),
            other => Err(format!("unknown date order '{}' (expected auto, dmy or mdy)", other)),
        }
    }
}

/// Parse any supported cell into a calendar day
pub fn parse_date(cell: &CellValue, prefer_mdy: bool) -> Option<NaiveDate> {
    match cell {
        CellValue::Empty => None,
        CellValue::Number(serial) => parse_serial(*serial),
        CellValue::Text(text) => parse_text(text, prefer_mdy),
    }
}

/// Convert a spreadsheet serial to a date, dropping any fractional time
pub fn parse_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 || serial > MAX_SERIAL {
        return None;
    }

    let days = serial.floor() as i64 - UNIX_EPOCH_SERIAL;
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(Duration::days(days))
}

pub fn parse_text(input: &str, prefer_mdy: bool) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    // CSV exports carry serials as plain text
    if SERIAL_TEXT.is_match(trimmed) {
        return trimmed.parse::<f64>().ok().and_then(parse_serial);
    }

    let cleaned: String = trimmed.chars().filter(|c| *c != ',' && *c != '.').collect();
    let mut tokens = cleaned.split_whitespace();
    let first = tokens.next()?;

    if let Some(date) = parse_token(first, prefer_mdy) {
        return Some(date);
    }

    // "01 Mar 2024 10:30" spreads the date over three tokens
    let spaced: Vec<&str> = cleaned.split_whitespace().take(3).collect();
    if spaced.len() == 3 {
        return parse_textual(&spaced.join(" "));
    }

    None
}

fn parse_token(token: &str, prefer_mdy: bool) -> Option<NaiveDate> {
    if let Some(caps) = NUMERIC_DATE.captures(token) {
        let p1: u32 = caps[1].parse().ok()?;
        let p2: u32 = caps[2].parse().ok()?;
        let year = expand_year(caps[3].parse().ok()?);

        let (month, day) = if p1 > 12 && p2 <= 12 {
            (p2, p1)
        } else if p2 > 12 && p1 <= 12 {
            (p1, p2)
        } else if prefer_mdy {
            (p1, p2)
        } else {
            (p2, p1)
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(date) = parse_textual(token) {
        return Some(date);
    }

    if let Some(caps) = ISO_DATE.captures(token) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn parse_textual(text: &str) -> Option<NaiveDate> {
    let caps = TEXTUAL_DATE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let year = expand_year(caps[3].parse().ok()?);

    let prefix: String = caps[2].to_lowercase().chars().take(3).collect();
    let month = MONTHS.iter().position(|m| *m == prefix)? as u32 + 1;

    NaiveDate::from_ymd_opt(year, month, day)
}

fn expand_year(year: i32) -> i32 {
    if year < 100 {
        year + 2000
    } else {
        year
    }
}

/// Render as zero-padded `DD/MM/YYYY`
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Same calendar day; false when either side failed to parse
pub fn is_same_day(a: Option<NaiveDate>, b: Option<NaiveDate>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_spreadsheet_serials() {
        assert_eq!(parse_serial(25569.0), Some(ymd(1970, 1, 1)));
        assert_eq!(parse_serial(45352.0), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_serial(45352.75), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date(&CellValue::Number(45352.0), false), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date(&text("45352"), true), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_serial(f64::NAN), None);
        assert_eq!(parse_serial(-1.0), None);
    }

    #[test]
    fn test_unambiguous_numeric_dates_ignore_preference() {
        assert_eq!(parse_date(&text("25/03/2024"), true), Some(ymd(2024, 3, 25)));
        assert_eq!(parse_date(&text("03/25/2024"), false), Some(ymd(2024, 3, 25)));
    }

    #[test]
    fn test_ambiguous_numeric_dates_follow_preference() {
        assert_eq!(parse_date(&text("01/03/2024"), false), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date(&text("01/03/2024"), true), Some(ymd(2024, 1, 3)));
        assert_eq!(parse_date(&text("1-3-24"), false), Some(ymd(2024, 3, 1)));
    }

    #[test]
    fn test_out_of_range_parts_are_rejected() {
        assert_eq!(parse_date(&text("31/02/2024"), false), None);
        assert_eq!(parse_date(&text("13/13/2024"), false), None);
    }

    #[test]
    fn test_textual_months() {
        assert_eq!(parse_date(&text("01-Mar-2024"), false), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date(&text("7 September 24"), false), Some(ymd(2024, 9, 7)));
        assert_eq!(parse_date(&text("05 mar 2024 14:20"), false), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date(&text("05-Foo-2024"), false), None);
    }

    #[test]
    fn test_iso_dates() {
        assert_eq!(parse_date(&text("2024-03-01"), true), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date(&text("2024/03/01"), false), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date(&text("2024-03-01T09:15:00"), false), Some(ymd(2024, 3, 1)));
    }

    #[test]
    fn test_time_suffix_is_ignored() {
        assert_eq!(parse_date(&text("01/03/2024 10:45:00"), false), Some(ymd(2024, 3, 1)));
    }

    #[test]
    fn test_garbage_yields_none() {
        assert_eq!(parse_date(&CellValue::Empty, false), None);
        assert_eq!(parse_date(&text("   "), false), None);
        assert_eq!(parse_date(&text("not a date"), false), None);
    }

    #[test]
    fn test_format_and_same_day() {
        assert_eq!(format_date(&ymd(2024, 3, 1)), "01/03/2024");
        assert!(is_same_day(Some(ymd(2024, 3, 1)), Some(ymd(2024, 3, 1))));
        assert!(!is_same_day(Some(ymd(2024, 3, 1)), Some(ymd(2024, 3, 2))));
        assert!(!is_same_day(None, Some(ymd(2024, 3, 1))));
        assert!(!is_same_day(None, None));
    }

    #[test]
    fn test_date_order_resolution() {
        assert!(DateOrder::Auto.prefer_mdy(SourceKind::Csv));
        assert!(!DateOrder::Auto.prefer_mdy(SourceKind::Spreadsheet));
        assert!(DateOrder::Mdy.prefer_mdy(SourceKind::Spreadsheet));
        assert!(!DateOrder::Dmy.prefer_mdy(SourceKind::Csv));
        assert_eq!("MDY".parse::<DateOrder>(), Ok(DateOrder::Mdy));
        assert!("ymd".parse::<DateOrder>().is_err());
    }
}
