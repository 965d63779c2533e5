use std::fmt;

use time::PrimitiveDateTime;

/// One row of building-utility readings.
///
/// `None` in any of the canonical fields is the explicit missing marker: the
/// source value was absent or could not be coerced, but the row is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRecord {
    pub date: Option<PrimitiveDateTime>,
    pub electricity_kwh: Option<f64>,
    pub water_liters: Option<f64>,
    /// Values of the non-canonical columns, aligned with
    /// [`Dataset::passthrough_labels`](super::Dataset::passthrough_labels).
    pub passthrough: Vec<Cell>,
}

impl TimeSeriesRecord {
    pub fn new(
        date: Option<PrimitiveDateTime>,
        electricity_kwh: Option<f64>,
        water_liters: Option<f64>,
    ) -> Self {
        Self {
            date,
            electricity_kwh,
            water_liters,
            passthrough: Vec::new(),
        }
    }

    pub fn with_passthrough(mut self, passthrough: Vec<Cell>) -> Self {
        self.passthrough = passthrough;
        self
    }
}

/// A passthrough value, kept as it came out of the source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
        }
    }
}
