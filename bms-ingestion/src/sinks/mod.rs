pub mod csv_report;

pub use csv_report::{to_csv_bytes, CsvReportSink, ExportError, REPORT_FILE_NAME};
