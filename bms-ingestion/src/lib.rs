pub mod pipeline;
pub mod config;
pub mod sources;
pub mod sinks;
pub mod transform;
pub mod observability;
pub mod metrics_recorder;

pub use pipeline::{load, load_dataset, DataLoadError, LoadOutcome, Normalizer, Upload};
pub use sources::generate;
