use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType as _, Reader};
use polars::prelude::*;

use crate::errors::ReaderError;
use crate::registry::TableReader;

/// Reads the first worksheet of an `.xlsx` or `.xls` workbook; row one is the header.
pub struct WorkbookTableReader;

impl Default for WorkbookTableReader {
    fn default() -> Self {
        Self
    }
}

impl WorkbookTableReader {
    const NAME: &'static str = "WORKBOOK";
}

impl TableReader for WorkbookTableReader {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn read(&self, path: &Path) -> Result<DataFrame, ReaderError> {
        let workbook_error = |source| ReaderError::Workbook {
            reader: Self::NAME,
            path: path.to_path_buf(),
            source,
        };

        let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ReaderError::Validation {
                reader: Self::NAME,
                message: format!("{} contains no worksheets", path.display()),
            })?
            .map_err(workbook_error)?;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Err(ReaderError::Empty {
                path: path.to_path_buf(),
            });
        };

        let names: Vec<String> = header
            .iter()
            .enumerate()
            .map(|(idx, cell)| match cell_value(cell) {
                CellValue::Empty => format!("Unnamed: {idx}"),
                CellValue::Number(value) => render_number(value),
                CellValue::Text(text) => text,
            })
            .collect();

        let mut cells: Vec<Vec<CellValue>> = vec![Vec::with_capacity(range.height()); names.len()];
        for row in rows {
            for (idx, column) in cells.iter_mut().enumerate() {
                column.push(row.get(idx).map(cell_value).unwrap_or(CellValue::Empty));
            }
        }

        let columns: Vec<Column> = names
            .iter()
            .zip(cells)
            .map(|(name, values)| build_column(name, values).into())
            .collect();

        DataFrame::new(columns).map_err(|err| ReaderError::Validation {
            reader: Self::NAME,
            message: format!("failed to build table from {}: {err}", path.display()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

pub(crate) fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Float(value) => CellValue::Number(*value),
        Data::String(text) if text.trim().is_empty() => CellValue::Empty,
        Data::String(text) => CellValue::Text(text.clone()),
        Data::Bool(value) => CellValue::Text(value.to_string()),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(dt) => CellValue::Text(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            None => CellValue::Text(cell.to_string()),
        },
        Data::DateTimeIso(text) | Data::DurationIso(text) => CellValue::Text(text.clone()),
        Data::Error(err) => CellValue::Text(err.to_string()),
    }
}

/// A column of only numbers (and blanks) stays numeric, as `Int64` when every number is
/// whole; anything else becomes text.
pub(crate) fn build_column(name: &str, values: Vec<CellValue>) -> Series {
    let all_numeric = values
        .iter()
        .all(|value| matches!(value, CellValue::Number(_) | CellValue::Empty));
    let any_value = values.iter().any(|value| !matches!(value, CellValue::Empty));

    if all_numeric && any_value {
        let integral = values.iter().all(|value| match value {
            CellValue::Number(number) => number.fract() == 0.0 && number.abs() < 1e15,
            _ => true,
        });
        if integral {
            let numbers: Vec<Option<i64>> = values
                .into_iter()
                .map(|value| match value {
                    CellValue::Number(number) => Some(number as i64),
                    _ => None,
                })
                .collect();
            return Series::new(name.into(), numbers);
        }

        let numbers: Vec<Option<f64>> = values
            .into_iter()
            .map(|value| match value {
                CellValue::Number(number) => Some(number),
                _ => None,
            })
            .collect();
        return Series::new(name.into(), numbers);
    }

    let text: Vec<Option<String>> = values
        .into_iter()
        .map(|value| match value {
            CellValue::Empty => None,
            CellValue::Number(number) => Some(render_number(number)),
            CellValue::Text(text) => Some(text),
        })
        .collect();
    Series::new(name.into(), text)
}

fn render_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
