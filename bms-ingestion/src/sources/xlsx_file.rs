use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, ExcelDateTime, Reader, Xlsx};
use chrono::{Datelike, NaiveDateTime, Timelike};
use time::{Date, Month, PrimitiveDateTime, Time};

use super::{RawCell, RawTable};
use crate::{
    pipeline::{DataLoadError, TableSource},
    transform::coerce,
};

/// Spreadsheet upload. Only the first worksheet is read, and its first row is
/// the header.
pub struct XlsxTableSource<'a> {
    bytes: &'a [u8],
}

impl<'a> XlsxTableSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

fn from_naive(ndt: NaiveDateTime) -> Option<PrimitiveDateTime> {
    let month = Month::try_from(u8::try_from(ndt.month()).ok()?).ok()?;
    let date = Date::from_calendar_date(ndt.year(), month, u8::try_from(ndt.day()).ok()?).ok()?;
    let time = Time::from_hms_nano(
        u8::try_from(ndt.hour()).ok()?,
        u8::try_from(ndt.minute()).ok()?,
        u8::try_from(ndt.second()).ok()?,
        ndt.nanosecond(),
    )
    .ok()?;
    Some(PrimitiveDateTime::new(date, time))
}

/// Convert a date-formatted cell. Follows the workbook's date system (1900 or
/// 1904), including Excel's phantom 1900-02-29.
pub fn excel_datetime(dt: &ExcelDateTime) -> Option<PrimitiveDateTime> {
    if !dt.as_f64().is_finite() {
        return None;
    }
    dt.as_datetime().and_then(from_naive)
}

fn to_cell(data: &Data) -> RawCell {
    match data {
        Data::Empty => RawCell::Empty,
        Data::String(s) if s.is_empty() => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Int(i) => RawCell::Int(*i),
        Data::Float(f) => RawCell::Float(*f),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => RawCell::Float(dt.as_f64()),
        Data::DateTime(dt) => excel_datetime(dt)
            .map(RawCell::DateTime)
            .unwrap_or(RawCell::Empty),
        Data::DateTimeIso(s) => coerce::parse_date_text(s)
            .map(RawCell::DateTime)
            .unwrap_or_else(|| RawCell::Text(s.clone())),
        other => RawCell::Text(other.to_string()),
    }
}

impl TableSource for XlsxTableSource<'_> {
    fn read_table(&self) -> Result<RawTable, DataLoadError> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(self.bytes))
            .map_err(|e| DataLoadError::Workbook(format!("failed to open workbook: {e}")))?;

        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| DataLoadError::Workbook("workbook has no worksheets".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| DataLoadError::Workbook(format!("failed to read sheet '{sheet}': {e}")))?;

        tracing::debug!(sheet = %sheet, height = range.height(), width = range.width(), "reading worksheet");

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            return Err(DataLoadError::Structure(format!(
                "sheet '{sheet}' has no columns to parse"
            )));
        };

        Ok(RawTable {
            headers: header_row.iter().map(to_cell).collect(),
            rows: rows.map(|r| r.iter().map(to_cell).collect()).collect(),
        })
    }
}
