pub mod coerce;
pub mod columns;

pub use columns::{
    clean_labels, resolve_columns, AppliedRename, ColumnResolution, PositionalRule, RenameCollision,
    POSITIONAL_RULES,
};

use bms_client::domain::{CanonicalColumn, Cell, Column, Dataset, TimeSeriesRecord};
use time::macros::datetime;

use crate::{
    pipeline::DataLoadError,
    sources::{RawCell, RawTable},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    NegativeElectricity,
    NegativeWater,
    DateOutOfRange,
}

/// A record that loaded but looks implausible. The record is kept as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordIssue {
    pub row: usize,
    pub kind: IssueKind,
}

/// Plausibility checks on a normalized record.
///
/// Rules:
/// - kWh and liters must be non-negative.
/// - date must be within a broad sanity window [2000-01-01, 2100-01-01).
pub fn validate_record(row: usize, record: &TimeSeriesRecord) -> Vec<RecordIssue> {
    let min_ts = datetime!(2000-01-01 0:00);
    let max_ts = datetime!(2100-01-01 0:00);

    let mut issues = Vec::new();
    if record.electricity_kwh.is_some_and(|v| v < 0.0) {
        issues.push(RecordIssue {
            row,
            kind: IssueKind::NegativeElectricity,
        });
    }
    if record.water_liters.is_some_and(|v| v < 0.0) {
        issues.push(RecordIssue {
            row,
            kind: IssueKind::NegativeWater,
        });
    }
    if record.date.is_some_and(|d| d < min_ts || d >= max_ts) {
        issues.push(RecordIssue {
            row,
            kind: IssueKind::DateOutOfRange,
        });
    }
    issues
}

/// Output of [`normalize_table`].
#[derive(Debug, Clone)]
pub struct Normalized {
    pub dataset: Dataset,
    pub resolution: ColumnResolution,
    pub issues: Vec<RecordIssue>,
}

/// Where a source column ends up.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Canonical(CanonicalColumn),
    Passthrough,
}

fn passthrough_cell(cell: &RawCell) -> Cell {
    match cell {
        RawCell::Empty => Cell::Empty,
        RawCell::Text(s) => Cell::Text(s.clone()),
        RawCell::Int(i) => Cell::Number(*i as f64),
        RawCell::Float(f) => Cell::Number(*f),
        RawCell::Bool(b) => Cell::Bool(*b),
        RawCell::DateTime(dt) => Cell::Text(coerce::format_datetime(*dt)),
    }
}

#[derive(Default)]
struct CoercionCounts {
    dates: u64,
    numbers: u64,
}

fn build_record(row: &[RawCell], slots: &[Slot], counts: &mut CoercionCounts) -> TimeSeriesRecord {
    let mut record = TimeSeriesRecord::new(None, None, None);

    for (cell, slot) in row.iter().zip(slots) {
        match slot {
            Slot::Canonical(CanonicalColumn::Date) => {
                let coerced = coerce::date_from_cell(cell);
                counts.dates += u64::from(coerced.is_invalid());
                record.date = coerced.value();
            }
            Slot::Canonical(CanonicalColumn::ElectricityKwh) => {
                let coerced = coerce::number_from_cell(cell);
                counts.numbers += u64::from(coerced.is_invalid());
                record.electricity_kwh = coerced.value();
            }
            Slot::Canonical(CanonicalColumn::WaterLiters) => {
                let coerced = coerce::number_from_cell(cell);
                counts.numbers += u64::from(coerced.is_invalid());
                record.water_liters = coerced.value();
            }
            Slot::Passthrough => record.passthrough.push(passthrough_cell(cell)),
        }
    }

    record
}

/// Resolve canonical columns and coerce every row of a raw table.
pub fn normalize_table(table: RawTable) -> Result<Normalized, DataLoadError> {
    let width = table.width();
    if width == 0 {
        return Err(DataLoadError::Structure("no columns to parse from file".to_string()));
    }

    let resolution = resolve_columns(clean_labels(&table.headers));

    let mut columns = Vec::with_capacity(width + CanonicalColumn::ALL.len());
    let mut slots = Vec::with_capacity(width);
    for label in &resolution.labels {
        let canonical = CanonicalColumn::from_label(label)
            .filter(|c| !columns.contains(&Column::Canonical(*c)));
        match canonical {
            Some(c) => {
                columns.push(Column::Canonical(c));
                slots.push(Slot::Canonical(c));
            }
            None => {
                columns.push(Column::Passthrough(label.clone()));
                slots.push(Slot::Passthrough);
            }
        }
    }

    for canonical in CanonicalColumn::ALL {
        if !columns.contains(&Column::Canonical(canonical)) {
            tracing::debug!(column = %canonical, "canonical column absent, filling with missing values");
            columns.push(Column::Canonical(canonical));
        }
    }

    let passthrough_width = slots.iter().filter(|s| matches!(s, Slot::Passthrough)).count();
    let mut counts = CoercionCounts::default();
    let mut records = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        if row.len() > width {
            return Err(DataLoadError::Structure(format!(
                "row {} has {} cells, header has {width}",
                idx + 1,
                row.len()
            )));
        }
        let mut record = build_record(row, &slots, &mut counts);
        // Short rows: any passthrough column not reached is empty.
        record.passthrough.resize(passthrough_width, Cell::Empty);
        records.push(record);
    }

    if counts.dates > 0 {
        metrics::counter!("ingest_date_coercion_failures_total").increment(counts.dates);
        tracing::warn!(values = counts.dates, "unparseable dates replaced with missing values");
    }
    if counts.numbers > 0 {
        metrics::counter!("ingest_numeric_coercion_failures_total").increment(counts.numbers);
        tracing::warn!(values = counts.numbers, "non-numeric readings replaced with missing values");
    }

    let issues: Vec<RecordIssue> = records
        .iter()
        .enumerate()
        .flat_map(|(row, r)| validate_record(row, r))
        .collect();
    if !issues.is_empty() {
        metrics::counter!("validation_record_flagged_total").increment(issues.len() as u64);
        for issue in &issues {
            tracing::debug!(row = issue.row, kind = ?issue.kind, "record flagged");
        }
    }

    let dataset =
        Dataset::new(columns, records).map_err(|e| DataLoadError::Structure(e.to_string()))?;

    Ok(Normalized {
        dataset,
        resolution,
        issues,
    })
}
