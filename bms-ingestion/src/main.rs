use anyhow::Result;
use bms_client::domain::DatasetSummary;
use bms_ingestion::{
    config::AppConfig,
    metrics_recorder,
    observability,
    pipeline::{Normalizer, Upload},
    sinks::CsvReportSink,
};
use std::{env, fs};

fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    if cfg.metrics.is_some() {
        metrics_recorder::init()?;
    }

    let normalizer = Normalizer::default();
    // An unreadable path is handled like a failed upload.
    let outcome = match env::args().nth(1) {
        Some(path) => match Upload::from_path(&path) {
            Ok(upload) => normalizer.load(Some(&upload)),
            Err(e) => normalizer.fallback_for(&path, e),
        },
        None => normalizer.load(None),
    };
    if let Some(msg) = outcome.error_message() {
        eprintln!("{msg}");
    }

    let summary = DatasetSummary::from_dataset(&outcome.dataset);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    let sink = CsvReportSink::with_file_name(cfg.report.file_name.as_str());
    sink.write_to_dir(&outcome.dataset, &cfg.report.output_dir)?;

    if let Some(metrics_cfg) = &cfg.metrics {
        if let Some(rendered) = metrics_recorder::render() {
            match &metrics_cfg.dump_path {
                Some(path) => fs::write(path, rendered)?,
                None => tracing::info!(metrics = %rendered, "metrics snapshot"),
            }
        }
    }

    Ok(())
}
