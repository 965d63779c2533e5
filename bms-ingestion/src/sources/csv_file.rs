use csv::StringRecord;

use super::{RawCell, RawTable};
use crate::pipeline::{DataLoadError, TableSource};

/// Comma-separated upload.
///
/// The first row is always the header. Rows shorter than the header are
/// padded with empty cells; a row with more fields than the header is an error.
pub struct CsvTableSource<'a> {
    bytes: &'a [u8],
}

impl<'a> CsvTableSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

fn to_cell(field: &str) -> RawCell {
    if field.is_empty() {
        RawCell::Empty
    } else {
        RawCell::Text(field.to_string())
    }
}

fn record_to_row(record: &StringRecord, width: usize) -> Result<Vec<RawCell>, DataLoadError> {
    if record.len() > width {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        return Err(DataLoadError::Csv(format!(
            "expected {width} fields in line {line}, saw {}",
            record.len()
        )));
    }

    let mut row: Vec<RawCell> = record.iter().map(to_cell).collect();
    row.resize(width, RawCell::Empty);
    Ok(row)
}

impl TableSource for CsvTableSource<'_> {
    fn read_table(&self) -> Result<RawTable, DataLoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(self.bytes);
        let headers = rdr
            .headers()
            .map_err(|e| DataLoadError::Csv(format!("failed to read CSV headers: {e}")))?
            .clone();

        if headers.is_empty() {
            return Err(DataLoadError::Csv("no columns to parse from file".to_string()));
        }

        let width = headers.len();
        let mut rows = Vec::new();
        for result in rdr.records() {
            let record =
                result.map_err(|e| DataLoadError::Csv(format!("failed to read CSV record: {e}")))?;
            rows.push(record_to_row(&record, width)?);
        }

        Ok(RawTable {
            headers: headers.iter().map(to_cell).collect(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    #[test]
    fn reads_header_and_rows() {
        let table = CsvTableSource::new(b"Timestamp,Power,Usage\n2024-01-01,300,80\n")
            .read_table()
            .unwrap();
        assert_eq!(table.headers, vec![text("Timestamp"), text("Power"), text("Usage")]);
        assert_eq!(table.rows, vec![vec![text("2024-01-01"), text("300"), text("80")]]);
    }

    #[test]
    fn short_rows_are_padded() {
        let table = CsvTableSource::new(b"a,b,c\n1\n1,,3\n").read_table().unwrap();
        assert_eq!(table.rows[0], vec![text("1"), RawCell::Empty, RawCell::Empty]);
        assert_eq!(table.rows[1], vec![text("1"), RawCell::Empty, text("3")]);
    }

    #[test]
    fn long_rows_are_rejected() {
        let err = CsvTableSource::new(b"a,b\n1,2\n1,2,3\n").read_table().unwrap_err();
        match err {
            DataLoadError::Csv(msg) => assert!(msg.contains("expected 2 fields in line 3, saw 3"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_input_has_no_columns() {
        let err = CsvTableSource::new(b"").read_table().unwrap_err();
        assert!(matches!(err, DataLoadError::Csv(_)));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = CsvTableSource::new(&[0xff, 0xfe, 0x00, 0xc3, 0x28, b'\n', 0x80])
            .read_table()
            .unwrap_err();
        assert!(matches!(err, DataLoadError::Csv(_)));
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let table = CsvTableSource::new(b"Date,Electricity_kWh,Water_Liters\n").read_table().unwrap();
        assert_eq!(table.width(), 3);
        assert!(table.rows.is_empty());
    }
}
