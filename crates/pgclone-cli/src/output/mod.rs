mod logging;
mod report;

pub use logging::init_logging;
pub use report::{RunSummary, write_summary};

use thiserror::Error;

/// Errors raised while writing logs or run artifacts.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
}

/// Result type for output operations.
pub type OutputResult<T> = std::result::Result<T, OutputError>;
