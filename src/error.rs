use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Invalid input series: {0}")]
    InvalidInput(String),

    #[error("Invalid filter configuration: {0}")]
    InvalidFilterConfig(String),

    #[error("Invalid STA/LTA window configuration: {0}")]
    InvalidWindowConfig(String),

    #[error("Invalid trigger thresholds: on={on}, off={off} (on must exceed off)")]
    InvalidThresholds { on: f64, off: f64 },

    #[error("Filter design failed: {0}")]
    FilterDesign(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed catalog or sample file: {0}")]
    Catalog(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DetectError>;
