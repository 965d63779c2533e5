pub mod csv_file;
pub mod synthetic;
pub mod xlsx_file;

pub use csv_file::CsvTableSource;
pub use synthetic::{generate, SyntheticSource};
pub use xlsx_file::XlsxTableSource;

use time::PrimitiveDateTime;

/// A cell as read from the source, before any column has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(PrimitiveDateTime),
}

/// Header row plus data rows. Every data row is exactly `headers.len()` wide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<RawCell>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn width(&self) -> usize {
        self.headers.len()
    }
}
