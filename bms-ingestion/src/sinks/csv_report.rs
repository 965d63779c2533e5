use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use bms_client::domain::{CanonicalColumn, Column, Dataset, TimeSeriesRecord};
use time::{macros::format_description, PrimitiveDateTime, Time};

pub const REPORT_FILE_NAME: &str = "EPROM_BMS_Report.csv";

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("failed to write CSV report: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write report file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to format date: {0}")]
    Format(#[from] time::error::Format),
}

/// How the `Date` column is written; decided once per dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateStyle {
    DateOnly,
    Seconds,
    Micros,
    Nanos,
}

impl DateStyle {
    fn for_dataset(dataset: &Dataset) -> Self {
        let dates = || dataset.iter().filter_map(|r| r.date);
        if dates().all(|d| d.time() == Time::MIDNIGHT) {
            DateStyle::DateOnly
        } else if dates().all(|d| d.nanosecond() == 0) {
            DateStyle::Seconds
        } else if dates().all(|d| d.nanosecond() % 1_000 == 0) {
            DateStyle::Micros
        } else {
            DateStyle::Nanos
        }
    }

    fn format(self, dt: PrimitiveDateTime) -> Result<String, time::error::Format> {
        match self {
            DateStyle::DateOnly => dt.format(format_description!("[year]-[month]-[day]")),
            DateStyle::Seconds => {
                dt.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
            }
            DateStyle::Micros => dt.format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
            )),
            DateStyle::Nanos => dt.format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:9]"
            )),
        }
    }
}

fn optional_number(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn record_fields(
    record: &TimeSeriesRecord,
    columns: &[Column],
    style: DateStyle,
) -> Result<Vec<String>, ExportError> {
    let mut passthrough = record.passthrough.iter();
    let mut fields = Vec::with_capacity(columns.len());
    for column in columns {
        let field = match column {
            Column::Canonical(CanonicalColumn::Date) => match record.date {
                Some(d) => style.format(d)?,
                None => String::new(),
            },
            Column::Canonical(CanonicalColumn::ElectricityKwh) => optional_number(record.electricity_kwh),
            Column::Canonical(CanonicalColumn::WaterLiters) => optional_number(record.water_liters),
            Column::Passthrough(_) => passthrough.next().map(|c| c.to_string()).unwrap_or_default(),
        };
        fields.push(field);
    }
    Ok(fields)
}

/// Writes a dataset as UTF-8 comma-separated text: one header row with the
/// column labels in layout order, no index column, missing values as empty
/// fields.
#[derive(Debug, Clone)]
pub struct CsvReportSink {
    file_name: String,
}

impl Default for CsvReportSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvReportSink {
    pub fn new() -> Self {
        Self::with_file_name(REPORT_FILE_NAME)
    }

    pub fn with_file_name(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Returns the number of data rows written.
    pub fn write<W: Write>(&self, dataset: &Dataset, out: W) -> Result<usize, ExportError> {
        let style = DateStyle::for_dataset(dataset);
        let mut wtr = csv::Writer::from_writer(out);

        wtr.write_record(dataset.labels())?;
        for record in dataset {
            wtr.write_record(record_fields(record, dataset.columns(), style)?)?;
        }
        wtr.flush()?;

        metrics::counter!("report_rows_exported_total").increment(dataset.len() as u64);
        Ok(dataset.len())
    }

    pub fn write_to_dir<P: AsRef<Path>>(&self, dataset: &Dataset, dir: P) -> Result<PathBuf, ExportError> {
        let path = dir.as_ref().join(&self.file_name);
        let file = File::create(&path)?;
        let rows = self.write(dataset, BufWriter::new(file))?;
        tracing::info!(path = %path.display(), rows, "report written");
        Ok(path)
    }
}

pub fn to_csv_bytes(dataset: &Dataset) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    CsvReportSink::new().write(dataset, &mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bms_client::domain::Cell;
    use time::macros::datetime;

    fn dataset(columns: Vec<Column>, records: Vec<TimeSeriesRecord>) -> Dataset {
        Dataset::new(columns, records).unwrap()
    }

    fn canonical() -> Vec<Column> {
        CanonicalColumn::ALL.into_iter().map(Column::Canonical).collect()
    }

    #[test]
    fn midnight_dates_are_written_as_days() {
        let ds = dataset(
            canonical(),
            vec![
                TimeSeriesRecord::new(Some(datetime!(2024-01-01 0:00)), Some(300.0), Some(80.5)),
                TimeSeriesRecord::new(None, None, Some(1.0)),
            ],
        );
        let csv = String::from_utf8(to_csv_bytes(&ds).unwrap()).unwrap();
        assert_eq!(
            csv,
            "Date,Electricity_kWh,Water_Liters\n2024-01-01,300,80.5\n,,1\n"
        );
    }

    #[test]
    fn times_and_fractions_are_kept() {
        let ds = dataset(
            canonical(),
            vec![
                TimeSeriesRecord::new(Some(datetime!(2024-01-01 8:15:30)), Some(1.0), Some(2.0)),
                TimeSeriesRecord::new(Some(datetime!(2024-01-02 8:15:30.5)), Some(1.0), Some(2.0)),
            ],
        );
        let csv = String::from_utf8(to_csv_bytes(&ds).unwrap()).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[1], "2024-01-01 08:15:30.000000,1,2");
        assert_eq!(lines[2], "2024-01-02 08:15:30.500000,1,2");
    }

    #[test]
    fn sub_microsecond_dates_keep_all_nine_digits() {
        let ds = dataset(
            canonical(),
            vec![
                TimeSeriesRecord::new(Some(datetime!(2024-01-01 10:00:00.123456789)), None, None),
                TimeSeriesRecord::new(Some(datetime!(2024-01-02 10:00)), None, None),
            ],
        );
        let csv = String::from_utf8(to_csv_bytes(&ds).unwrap()).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[1], "2024-01-01 10:00:00.123456789,,");
        assert_eq!(lines[2], "2024-01-02 10:00:00.000000000,,");
    }

    #[test]
    fn passthrough_columns_keep_layout_order() {
        let columns = vec![
            Column::Passthrough("Zone".to_string()),
            Column::Canonical(CanonicalColumn::Date),
            Column::Canonical(CanonicalColumn::ElectricityKwh),
            Column::Passthrough("Note".to_string()),
            Column::Canonical(CanonicalColumn::WaterLiters),
        ];
        let records = vec![TimeSeriesRecord::new(None, Some(3.0), None).with_passthrough(vec![
            Cell::Text("Lab, west".to_string()),
            Cell::Empty,
        ])];
        let csv = String::from_utf8(to_csv_bytes(&dataset(columns, records)).unwrap()).unwrap();
        assert_eq!(
            csv,
            "Zone,Date,Electricity_kWh,Note,Water_Liters\n\"Lab, west\",,3,,\n"
        );
    }

    #[test]
    fn write_to_dir_uses_report_name() {
        let dir = tempfile::tempdir().unwrap();
        let ds = dataset(canonical(), Vec::new());

        let path = CsvReportSink::new().write_to_dir(&ds, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), REPORT_FILE_NAME);
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents, "Date,Electricity_kWh,Water_Liters\n");
    }
}
