use anyhow::Result;
use bms_ingestion::{observability, sinks::CsvReportSink, sources::SyntheticSource};
use std::{env, fs::File, io, io::BufWriter};

fn main() -> Result<()> {
    observability::init_tracing();

    let dataset = SyntheticSource::default().generate();
    let sink = CsvReportSink::new();

    let rows = match env::args().nth(1) {
        Some(path) => sink.write(&dataset, BufWriter::new(File::create(&path)?))?,
        None => sink.write(&dataset, io::stdout().lock())?,
    };

    tracing::info!(rows, "synthetic dataset written");
    Ok(())
}
