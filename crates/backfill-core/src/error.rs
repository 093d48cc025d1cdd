// crates/backfill-core/src/error.rs

use backfill_parser::ReaderError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackfillError {
    #[error("Unsupported file format: {extension}. Only .csv and .xlsx files are supported.")]
    UnsupportedFormat { extension: String },

    #[error("Missing required columns: {}", names.join(", "))]
    MissingColumns { names: Vec<String> },

    #[error("Input file is empty or contains no valid data")]
    EmptyInput,

    #[error("Unparsable timestamp '{value}': expected an ISO-8601 date-time without offset")]
    TimestampParse { value: String },

    #[error("No valid timestamps for building '{building}', device '{device}' after localization")]
    NoValidTimestamps { building: String, device: String },

    #[error("Column error during pivot operation: {detail}")]
    PivotColumn { detail: String },

    #[error("Error parsing file: {detail}")]
    Parse { detail: String },

    #[error("Unexpected error processing file: {detail}")]
    Processing { detail: String },
}

impl BackfillError {
    pub fn processing(detail: impl Into<String>) -> Self {
        BackfillError::Processing {
            detail: detail.into(),
        }
    }

    pub fn pivot_column(detail: impl Into<String>) -> Self {
        BackfillError::PivotColumn {
            detail: detail.into(),
        }
    }
}

impl From<ReaderError> for BackfillError {
    fn from(err: ReaderError) -> Self {
        match err {
            ReaderError::UnsupportedFormat { extension } => {
                BackfillError::UnsupportedFormat { extension }
            }
            ReaderError::Empty { .. } => BackfillError::EmptyInput,
            other => BackfillError::Parse {
                detail: other.to_string(),
            },
        }
    }
}

impl From<PolarsError> for BackfillError {
    fn from(err: PolarsError) -> Self {
        BackfillError::pivot_column(err.to_string())
    }
}

impl From<std::io::Error> for BackfillError {
    fn from(err: std::io::Error) -> Self {
        BackfillError::processing(err.to_string())
    }
}

impl From<csv::Error> for BackfillError {
    fn from(err: csv::Error) -> Self {
        BackfillError::processing(format!("CSV write failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, BackfillError>;
