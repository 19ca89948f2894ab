//! The immutable set of non-working calendar dates.
//!
//! Holiday data arrives as loosely formatted JSON. Each entry is normalized to
//! a strict `YYYY-MM-DD` civil date; entries that cannot be normalized are
//! dropped individually, but a payload that yields no dates at all is rejected.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::error::{FetchError, WorkdayError};

/// Length of a normalized `YYYY-MM-DD` date.
const YMD_LEN: usize = 10;

/// Deduplicated, never-empty set of holiday dates in the local civil calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HolidaySet {
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    /// Build a set from already-parsed dates.
    ///
    /// # Errors
    ///
    /// Returns [`WorkdayError::EmptyHolidaySet`] if `dates` yields nothing.
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> crate::error::Result<Self> {
        let dates: BTreeSet<NaiveDate> = dates.into_iter().collect();
        if dates.is_empty() {
            return Err(WorkdayError::EmptyHolidaySet);
        }
        Ok(Self { dates })
    }

    /// Build a set from a holiday source payload.
    ///
    /// The payload must be a JSON array. Each element is coerced to text (see
    /// [`entry_text`]) and normalized with [`normalize_date`]; elements that do
    /// not normalize are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidFormat`] if the payload is not an array, or
    /// [`FetchError::NoValidDates`] if no element normalizes to a date.
    pub fn from_json(payload: &Value) -> Result<Self, FetchError> {
        let entries = payload.as_array().ok_or_else(|| {
            FetchError::InvalidFormat(format!("expected array, got {}", json_kind(payload)))
        })?;

        let dates: BTreeSet<NaiveDate> = entries
            .iter()
            .filter_map(|entry| normalize_date(&entry_text(entry)?))
            .collect();

        if dates.is_empty() {
            return Err(FetchError::NoValidDates);
        }
        Ok(Self { dates })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Dates in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }
}

/// Normalize a date-like string to a civil date.
///
/// Trims whitespace, turns `/` separators into `-`, keeps the first ten
/// characters and accepts the result only if it is exactly `YYYY-MM-DD` and
/// names a real calendar date.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use workday_engine::holidays::normalize_date;
///
/// assert_eq!(normalize_date(" 2025/04/17 "), NaiveDate::from_ymd_opt(2025, 4, 17));
/// assert_eq!(normalize_date("2025-04-18T00:00:00Z"), NaiveDate::from_ymd_opt(2025, 4, 18));
/// assert_eq!(normalize_date("17-04-2025"), None);
/// ```
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.trim().replace('/', "-");
    let ymd: String = cleaned.chars().take(YMD_LEN).collect();
    if !is_ymd_shape(&ymd) {
        return None;
    }
    NaiveDate::parse_from_str(&ymd, "%Y-%m-%d").ok()
}

/// Extract the date-like text carried by one payload element.
///
/// Strings are taken as-is. Objects contribute their `celebrationDate` or
/// `date` field. Other scalars are coerced to their JSON text.
pub fn entry_text(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) => Some(s.clone()),
        Value::Object(fields) => ["celebrationDate", "date"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        Value::Null | Value::Array(_) => None,
        other => Some(other.to_string()),
    }
}

/// `DDDD-DD-DD` with ASCII digits.
fn is_ymd_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == YMD_LEN
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
