use std::fs;
use std::path::Path;

use polars::prelude::DataFrame;

use crate::errors::ReaderError;
use crate::formats::{coerce_thousands_columns, CsvTableReader, WorkbookTableReader};
use crate::model::{LoadedTable, SourceFormat};

pub trait TableReader {
    fn name(&self) -> &'static str;
    fn read(&self, path: &Path) -> Result<DataFrame, ReaderError>;
}

/// Loads a `.csv`, `.xlsx` or `.xls` file and runs the numeric coercion pass once.
pub fn read_table(path: &Path) -> Result<LoadedTable, ReaderError> {
    let format = SourceFormat::from_path(path)?;
    let csv = CsvTableReader;
    let workbook = WorkbookTableReader;
    let reader: &dyn TableReader = if format.is_workbook() {
        &workbook
    } else {
        &csv
    };
    read_with_reader(path, format, reader)
}

pub fn read_with_reader(
    path: &Path,
    format: SourceFormat,
    reader: &dyn TableReader,
) -> Result<LoadedTable, ReaderError> {
    let metadata = fs::metadata(path).map_err(|source| ReaderError::Io {
        reader: reader.name(),
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.len() == 0 {
        return Err(ReaderError::Empty {
            path: path.to_path_buf(),
        });
    }

    let mut df = reader.read(path)?;
    let coerced_columns =
        coerce_thousands_columns(&mut df).map_err(|source| ReaderError::Polars {
            reader: reader.name(),
            path: path.to_path_buf(),
            source,
        })?;

    Ok(LoadedTable {
        path: path.to_path_buf(),
        format,
        df,
        coerced_columns,
    })
}
