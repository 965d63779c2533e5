use std::{fs, path::Path};

use bms_client::domain::Dataset;

use crate::{
    sources::{CsvTableSource, RawTable, SyntheticSource, XlsxTableSource},
    transform::{self, ColumnResolution, Normalized, RecordIssue},
};

/// An uploaded file: its name decides how the bytes are parsed.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DataLoadError> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| DataLoadError::Io(format!("failed to read '{}': {e}", path.display())))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_name(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Spreadsheet,
    DelimitedText,
}

impl FileKind {
    /// `.xlsx` (any case) is a spreadsheet; every other name is read as CSV.
    pub fn from_name(name: &str) -> Self {
        let is_xlsx = name.len() >= 5
            && name
                .get(name.len() - 5..)
                .is_some_and(|suffix| suffix.eq_ignore_ascii_case(".xlsx"));
        if is_xlsx {
            FileKind::Spreadsheet
        } else {
            FileKind::DelimitedText
        }
    }
}

/// The single ingestion failure class. Every variant is handled the same way
/// at the load boundary; the split only sharpens the message.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DataLoadError {
    #[error("{0}")]
    Csv(String),
    #[error("{0}")]
    Workbook(String),
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Structure(String),
}

/// Something that yields an un-normalized table.
pub trait TableSource {
    fn read_table(&self) -> Result<RawTable, DataLoadError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetOrigin {
    /// Parsed from the named upload.
    Upload { name: String },
    /// No upload was given.
    Synthetic,
    /// The named upload failed to load and synthetic data was substituted.
    Fallback { name: String },
}

/// Result of one load request.
///
/// `dataset` is always renderable. `error` is the caller's error channel: it
/// is set exactly when `origin` is [`DatasetOrigin::Fallback`].
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub dataset: Dataset,
    pub origin: DatasetOrigin,
    pub resolution: Option<ColumnResolution>,
    pub issues: Vec<RecordIssue>,
    pub error: Option<DataLoadError>,
}

impl LoadOutcome {
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| format!("Data Error: {e}"))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, DatasetOrigin::Fallback { .. })
    }

    fn synthetic(dataset: Dataset, origin: DatasetOrigin, error: Option<DataLoadError>) -> Self {
        Self {
            dataset,
            origin,
            resolution: None,
            issues: Vec::new(),
            error,
        }
    }
}

/// Load boundary: parse an upload, normalize it, and substitute synthetic
/// data when anything goes wrong.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    fallback: SyntheticSource,
}

impl Normalizer {
    pub fn new(fallback: SyntheticSource) -> Self {
        Self { fallback }
    }

    pub fn load(&self, source: Option<&Upload>) -> LoadOutcome {
        let Some(upload) = source else {
            tracing::debug!("no upload provided, using synthetic data");
            return LoadOutcome::synthetic(self.fallback.generate(), DatasetOrigin::Synthetic, None);
        };

        match normalize_upload(upload) {
            Ok(normalized) => {
                metrics::counter!("data_load_rows_total").increment(normalized.dataset.len() as u64);
                tracing::info!(
                    file = %upload.name,
                    rows = normalized.dataset.len(),
                    renames = normalized.resolution.renames.len(),
                    collisions = normalized.resolution.collisions.len(),
                    flagged = normalized.issues.len(),
                    "upload loaded"
                );
                LoadOutcome {
                    dataset: normalized.dataset,
                    origin: DatasetOrigin::Upload {
                        name: upload.name.clone(),
                    },
                    resolution: Some(normalized.resolution),
                    issues: normalized.issues,
                    error: None,
                }
            }
            Err(e) => self.fallback_for(&upload.name, e),
        }
    }

    /// Substitute synthetic data for an upload that could not be loaded, for
    /// failures that happen before the bytes reach [`Normalizer::load`] (an
    /// unreadable path, say).
    pub fn fallback_for(&self, name: &str, error: DataLoadError) -> LoadOutcome {
        metrics::counter!("data_load_fallback_total").increment(1);
        tracing::warn!(file = %name, error = %error, "upload failed to load, using synthetic data");
        LoadOutcome::synthetic(
            self.fallback.generate(),
            DatasetOrigin::Fallback {
                name: name.to_string(),
            },
            Some(error),
        )
    }

    /// Same parse and normalization as [`Normalizer::load`], without the fallback.
    pub fn try_load(&self, upload: &Upload) -> Result<Dataset, DataLoadError> {
        normalize_upload(upload).map(|n| n.dataset)
    }
}

/// Parse an upload by kind and normalize the resulting table.
pub fn normalize_upload(upload: &Upload) -> Result<Normalized, DataLoadError> {
    let table = match upload.kind() {
        FileKind::Spreadsheet => XlsxTableSource::new(&upload.bytes).read_table()?,
        FileKind::DelimitedText => CsvTableSource::new(&upload.bytes).read_table()?,
    };
    transform::normalize_table(table)
}

pub fn load(source: Option<&Upload>) -> LoadOutcome {
    Normalizer::default().load(source)
}

pub fn load_dataset(source: Option<&Upload>) -> Dataset {
    load(source).dataset
}
