use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Load errors – fatal at the file / stream level
// ---------------------------------------------------------------------------

/// Failure to produce a working set from the source file.
///
/// Individual malformed rows never surface here; they are skipped and
/// counted in the [`LoadReport`](crate::data::model::LoadReport).
#[derive(Error, Debug)]
pub enum DatasetLoadError {
    #[error("dataset file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error reading dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("unsupported dataset extension: .{0}")]
    UnsupportedFormat(String),

    #[error("dataset header is missing required column '{0}'")]
    MissingColumn(String),

    #[error("dataset is not tabular: {0}")]
    NotTabular(String),

    #[error("load task failed: {0}")]
    TaskFailed(String),
}

// ---------------------------------------------------------------------------
// Comparison errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    #[error("at least 2 car ids are required for a comparison, got {0}")]
    TooFewIds(usize),

    #[error("not enough valid cars found for comparison ({0} matched)")]
    TooFewFound(usize),
}

// ---------------------------------------------------------------------------
// Service-level errors
// ---------------------------------------------------------------------------

/// Errors returned by [`VehicleDatasetService`](crate::service::VehicleDatasetService).
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("dataset has not been loaded")]
    NotLoaded,

    /// The most recent load attempt failed; the message is the rendered load error.
    #[error("dataset load failed: {0}")]
    LoadFailed(String),

    #[error(transparent)]
    Load(#[from] DatasetLoadError),

    #[error("invalid criteria '{0}', must be one of: horsepower, speed, acceleration, efficient")]
    UnknownCriteria(String),

    #[error("invalid sort field '{0}', must be one of: year, horsepower, speed, make")]
    UnknownSortField(String),

    #[error(transparent)]
    Compare(#[from] CompareError),
}

pub type Result<T, E = DatasetError> = std::result::Result<T, E>;
