use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("unsupported file format '{extension}'; only .csv, .xlsx and .xls files are supported")]
    UnsupportedFormat { extension: String },

    #[error("input file {} is empty or contains no valid data", path.display())]
    Empty { path: PathBuf },

    #[error("{reader} could not read {}: {source}", path.display())]
    Io {
        reader: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{reader} failed to parse {}: {source}", path.display())]
    Polars {
        reader: &'static str,
        path: PathBuf,
        #[source]
        source: polars::error::PolarsError,
    },

    #[error("{reader} failed to open workbook {}: {source}", path.display())]
    Workbook {
        reader: &'static str,
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("{reader} table invalid: {message}")]
    Validation {
        reader: &'static str,
        message: String,
    },
}
