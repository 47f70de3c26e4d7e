pub mod catalog;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod series;
pub mod series_io;
pub mod signal_processing;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::DetectionConfig;
pub use detection::DetectionRecord;
pub use error::{DetectError, Result};
pub use pipeline::{DetectionPipeline, PipelineOutput};
pub use series::TimeSeries;
