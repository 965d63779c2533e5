use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::sinks::REPORT_FILE_NAME;

pub const CONFIG_ENV: &str = "BMS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "bms-config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub file_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_name: REPORT_FILE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// Where to write the Prometheus exposition text at exit. Logged when unset.
    pub dump_path: Option<PathBuf>,
}

/// Application settings. Covers the report sink and metrics only; how uploads
/// are parsed is not configurable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub report: ReportConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    /// Read `$BMS_CONFIG`, or `bms-config.toml` if it exists, or fall back to
    /// defaults.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            Err(_) => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config '{}': {e}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.report.output_dir, PathBuf::from("."));
        assert_eq!(cfg.report.file_name, "EPROM_BMS_Report.csv");
        assert!(cfg.metrics.is_none());
    }

    #[test]
    fn full_config_parses() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [report]
            output_dir = "/tmp/reports"

            [metrics]
            dump_path = "metrics.prom"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.report.output_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(cfg.report.file_name, REPORT_FILE_NAME);
        assert_eq!(
            cfg.metrics.and_then(|m| m.dump_path),
            Some(PathBuf::from("metrics.prom"))
        );
    }

    #[test]
    fn empty_metrics_table_enables_metrics() {
        let cfg = AppConfig::from_toml_str("[metrics]\n").unwrap();
        assert!(cfg.metrics.is_some());
    }

    #[test]
    fn unknown_value_types_are_rejected() {
        assert!(AppConfig::from_toml_str("[report]\noutput_dir = 3\n").is_err());
    }

    #[test]
    fn config_file_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bms.toml");
        std::fs::write(&path, "[report]\nfile_name = \"weekly.csv\"\n").unwrap();

        let cfg = AppConfig::from_file(&path).unwrap();
        assert_eq!(cfg.report.file_name, "weekly.csv");
        assert!(AppConfig::from_file(dir.path().join("missing.toml")).is_err());
    }
}
