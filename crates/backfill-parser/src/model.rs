use std::fmt;
use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;

use crate::errors::ReaderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Csv,
    Xlsx,
    Xls,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Xlsx => "xlsx",
            SourceFormat::Xls => "xls",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Some(SourceFormat::Csv),
            "xlsx" => Some(SourceFormat::Xlsx),
            "xls" => Some(SourceFormat::Xls),
            _ => None,
        }
    }

    /// Classifies a path by its extension without touching the filesystem.
    pub fn from_path(path: &Path) -> Result<Self, ReaderError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension).ok_or_else(|| ReaderError::UnsupportedFormat {
            extension: if extension.is_empty() {
                "<none>".to_string()
            } else {
                format!(".{extension}")
            },
        })
    }

    pub fn is_workbook(&self) -> bool {
        matches!(self, SourceFormat::Xlsx | SourceFormat::Xls)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source file loaded into memory with its column types settled.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub path: PathBuf,
    pub format: SourceFormat,
    pub df: DataFrame,
    /// Text columns that were reinterpreted as numbers after dropping thousands separators.
    pub coerced_columns: Vec<String>,
}

impl LoadedTable {
    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df
            .get_column_names()
            .iter()
            .any(|column| column.as_str() == name)
    }
}
