//! Cell values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::fmt;

/// Accepted textual date-time layouts, tried in order after RFC 3339.
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"];

/// Accepted textual date layouts.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Content of a single cell.
///
/// Documents loaded from text hold `Blank` or `Text` cells only; typed
/// writes store the typed variant, which is rendered back to text on flush.
/// Typed reads accept both the typed variant and a parseable `Text`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// No content.
    #[default]
    Blank,
    /// Free text.
    Text(String),
    /// Exact integer content.
    Integer(i64),
    /// Numeric content.
    Number(f64),
    /// Boolean content.
    Bool(bool),
    /// Instant in UTC.
    Date(DateTime<Utc>),
    /// Calendar day.
    Day(NaiveDate),
}

impl CellValue {
    /// Builds a cell from a raw field; the empty string is `Blank`.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            CellValue::Blank
        } else {
            CellValue::Text(field.to_string())
        }
    }

    /// Renders the cell as a raw field.
    pub fn to_field(&self) -> String {
        match self {
            CellValue::Blank => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            CellValue::Day(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Returns true if the cell has no content.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Blank => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Returns the textual content, `None` when blank.
    pub fn as_text(&self) -> Option<String> {
        if self.is_blank() {
            None
        } else {
            Some(self.to_field())
        }
    }

    /// Interprets the cell as a number.
    ///
    /// Returns `Err(raw)` with the raw content when it is not numeric.
    pub fn as_number(&self) -> Result<Option<f64>, String> {
        match self {
            _ if self.is_blank() => Ok(None),
            CellValue::Integer(i) => Ok(Some(*i as f64)),
            CellValue::Number(n) => Ok(Some(*n)),
            CellValue::Text(s) => s.trim().parse::<f64>().map(Some).map_err(|_| s.clone()),
            other => Err(other.to_field()),
        }
    }

    /// Interprets the cell as an exact integer.
    ///
    /// Integral text parses exactly; other numeric content is accepted only
    /// when it has no fraction and lies within `i64`.
    pub fn as_integer(&self) -> Result<Option<i64>, String> {
        match self {
            _ if self.is_blank() => Ok(None),
            CellValue::Integer(i) => Ok(Some(*i)),
            CellValue::Number(n) => integral(*n).map(Some).ok_or_else(|| n.to_string()),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Ok(Some(i));
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(integral)
                    .map(Some)
                    .ok_or_else(|| s.clone())
            }
            other => Err(other.to_field()),
        }
    }

    /// Interprets the cell as a boolean (`true`/`false`, any case).
    pub fn as_bool(&self) -> Result<Option<bool>, String> {
        match self {
            _ if self.is_blank() => Ok(None),
            CellValue::Bool(b) => Ok(Some(*b)),
            CellValue::Text(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Ok(Some(true))
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(Some(false))
                } else {
                    Err(s.to_string())
                }
            }
            other => Err(other.to_field()),
        }
    }

    /// Interprets the cell as an instant.
    ///
    /// Calendar days are read as midnight UTC.
    pub fn as_date(&self) -> Result<Option<DateTime<Utc>>, String> {
        match self {
            _ if self.is_blank() => Ok(None),
            CellValue::Date(d) => Ok(Some(*d)),
            CellValue::Day(d) => Ok(Some(midnight(*d))),
            CellValue::Text(s) => parse_date_time(s.trim()).map(Some).ok_or_else(|| s.clone()),
            other => Err(other.to_field()),
        }
    }

    /// Interprets the cell as a calendar day.
    pub fn as_day(&self) -> Result<Option<NaiveDate>, String> {
        match self {
            _ if self.is_blank() => Ok(None),
            CellValue::Day(d) => Ok(Some(*d)),
            CellValue::Date(d) => Ok(Some(d.date_naive())),
            CellValue::Text(s) => {
                let s = s.trim();
                DATE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                    .or_else(|| parse_date_time(s).map(|d| d.date_naive()))
                    .map(Some)
                    .ok_or_else(|| s.to_string())
            }
            other => Err(other.to_field()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_field())
    }
}

/// 2^63, the first float beyond `i64::MAX`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn integral(n: f64) -> Option<i64> {
    (n.fract() == 0.0 && n >= -I64_BOUND && n < I64_BOUND).then(|| n as i64)
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

fn parse_date_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    if let Some(naive) = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(naive.and_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(midnight)
}
