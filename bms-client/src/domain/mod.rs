pub mod dataset;
pub mod record;
pub mod summary;

pub use dataset::{CanonicalColumn, Column, Dataset, DatasetError};
pub use record::{Cell, TimeSeriesRecord};
pub use summary::DatasetSummary;
