use std::fmt;

use super::record::{Cell, TimeSeriesRecord};

/// The three columns every normalized dataset carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalColumn {
    Date,
    ElectricityKwh,
    WaterLiters,
}

impl CanonicalColumn {
    pub const ALL: [CanonicalColumn; 3] = [
        CanonicalColumn::Date,
        CanonicalColumn::ElectricityKwh,
        CanonicalColumn::WaterLiters,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CanonicalColumn::Date => "Date",
            CanonicalColumn::ElectricityKwh => "Electricity_kWh",
            CanonicalColumn::WaterLiters => "Water_Liters",
        }
    }

    /// Exact, case-sensitive match against the canonical labels.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Canonical(CanonicalColumn),
    Passthrough(String),
}

impl Column {
    pub fn label(&self) -> &str {
        match self {
            Column::Canonical(c) => c.label(),
            Column::Passthrough(label) => label,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DatasetError {
    #[error("canonical column '{0}' is missing from the layout")]
    MissingCanonical(CanonicalColumn),
    #[error("canonical column '{0}' appears more than once in the layout")]
    DuplicateCanonical(CanonicalColumn),
    #[error("record {row} has {actual} passthrough values, layout has {expected}")]
    PassthroughWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Ordered, immutable table of time-stamped utility readings.
///
/// Row order is import order. The column layout keeps the source order so
/// that an export reproduces the columns the way they were uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    records: Vec<TimeSeriesRecord>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>, records: Vec<TimeSeriesRecord>) -> Result<Self, DatasetError> {
        for canonical in CanonicalColumn::ALL {
            let count = columns
                .iter()
                .filter(|c| **c == Column::Canonical(canonical))
                .count();
            match count {
                0 => return Err(DatasetError::MissingCanonical(canonical)),
                1 => {}
                _ => return Err(DatasetError::DuplicateCanonical(canonical)),
            }
        }

        let expected = columns
            .iter()
            .filter(|c| matches!(c, Column::Passthrough(_)))
            .count();
        if let Some((row, r)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.passthrough.len() != expected)
        {
            return Err(DatasetError::PassthroughWidth {
                row,
                expected,
                actual: r.passthrough.len(),
            });
        }

        Ok(Self { columns, records })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn records(&self) -> &[TimeSeriesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(Column::label).collect()
    }

    pub fn has_column(&self, label: &str) -> bool {
        self.columns.iter().any(|c| c.label() == label)
    }

    pub fn passthrough_labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(|c| match c {
            Column::Passthrough(label) => Some(label.as_str()),
            Column::Canonical(_) => None,
        })
    }

    /// Value of a passthrough column for one row.
    pub fn passthrough_value(&self, row: usize, label: &str) -> Option<&Cell> {
        let idx = self.passthrough_labels().position(|l| l == label)?;
        self.records.get(row)?.passthrough.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeSeriesRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a TimeSeriesRecord;
    type IntoIter = std::slice::Iter<'a, TimeSeriesRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
