//! Lenient cell coercion for the canonical columns.
//!
//! Nothing here fails: a value that cannot be coerced becomes `None`, the
//! missing marker, and the row is kept.

use time::{
    format_description::{well_known::Rfc3339, BorrowedFormatItem},
    macros::format_description,
    Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
};

use crate::sources::RawCell;

/// Text treated as "no value" rather than as a failed coercion.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-NaN", "-nan", "<NA>", "N/A", "NA", "NULL", "NaN", "None",
    "n/a", "nan", "null",
];

const DATETIME_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]/[month padding:none]/[day padding:none] [hour]:[minute]:[second]"),
    format_description!("[month padding:none]/[day padding:none]/[year] [hour]:[minute]:[second]"),
    format_description!("[month padding:none]/[day padding:none]/[year] [hour]:[minute]"),
];

const DATE_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day]"),
    format_description!("[year]/[month padding:none]/[day padding:none]"),
    format_description!("[month padding:none]/[day padding:none]/[year]"),
    format_description!("[day padding:none].[month padding:none].[year]"),
];

pub fn is_na_text(s: &str) -> bool {
    NA_VALUES.contains(&s.trim())
}

/// Parse a date or timestamp written as text.
///
/// Slash dates are month-first. Offsets in RFC 3339 input are normalized to
/// UTC before the offset is dropped.
pub fn parse_date_text(s: &str) -> Option<PrimitiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339) {
        let utc = ts.to_offset(UtcOffset::UTC);
        return Some(PrimitiveDateTime::new(utc.date(), utc.time()));
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| PrimitiveDateTime::parse(s, *fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| Date::parse(s, *fmt).ok())
                .map(|d| PrimitiveDateTime::new(d, Time::MIDNIGHT))
        })
}

/// `YYYY-MM-DD HH:MM:SS`, the text form of a date-typed cell outside the
/// `Date` column.
pub fn format_datetime(dt: PrimitiveDateTime) -> String {
    dt.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_default()
}

/// Outcome of coercing one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced<T> {
    Value(T),
    /// Empty or an NA marker.
    Missing,
    /// Present but not coercible.
    Invalid,
}

impl<T> Coerced<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Coerced::Value(v) => Some(v),
            Coerced::Missing | Coerced::Invalid => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Coerced::Invalid)
    }
}

/// Plain numbers are not dates; only text and date-typed cells coerce.
pub fn date_from_cell(cell: &RawCell) -> Coerced<PrimitiveDateTime> {
    match cell {
        RawCell::Empty => Coerced::Missing,
        RawCell::DateTime(dt) => Coerced::Value(*dt),
        RawCell::Text(s) if is_na_text(s) => Coerced::Missing,
        RawCell::Text(s) => parse_date_text(s).map_or(Coerced::Invalid, Coerced::Value),
        RawCell::Int(_) | RawCell::Float(_) | RawCell::Bool(_) => Coerced::Invalid,
    }
}

pub fn number_from_cell(cell: &RawCell) -> Coerced<f64> {
    match cell {
        RawCell::Empty => Coerced::Missing,
        RawCell::Int(i) => Coerced::Value(*i as f64),
        RawCell::Float(f) if f.is_nan() => Coerced::Missing,
        RawCell::Float(f) => Coerced::Value(*f),
        RawCell::Text(s) if is_na_text(s) => Coerced::Missing,
        RawCell::Text(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_nan() => Coerced::Missing,
            Ok(v) => Coerced::Value(v),
            Err(_) => Coerced::Invalid,
        },
        RawCell::Bool(_) | RawCell::DateTime(_) => Coerced::Invalid,
    }
}
