use std::fs;
use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;

use crate::errors::ReaderError;
use crate::registry::TableReader;

pub struct CsvTableReader;

impl Default for CsvTableReader {
    fn default() -> Self {
        Self
    }
}

impl CsvTableReader {
    const NAME: &'static str = "CSV";
}

impl TableReader for CsvTableReader {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn read(&self, path: &Path) -> Result<DataFrame, ReaderError> {
        let bytes = fs::read(path).map_err(|source| ReaderError::Io {
            reader: Self::NAME,
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ReaderError::Empty {
                path: path.to_path_buf(),
            });
        }

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(|source| match source {
                PolarsError::NoData(_) => ReaderError::Empty {
                    path: path.to_path_buf(),
                },
                source => ReaderError::Polars {
                    reader: Self::NAME,
                    path: path.to_path_buf(),
                    source,
                },
            })
    }
}
