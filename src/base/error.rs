//! Errors raised while computing ratio summary statistics

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RatioError {
    /// Malformed values or missing columns in the input tables
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No shared variants, or duplicated variant keys making the join ambiguous
    #[error("join error: {0}")]
    Join(String),

    /// Genomic-control root finding failed to bracket or converge
    #[error("calibration error: {0}")]
    Calibration(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, RatioError>;
