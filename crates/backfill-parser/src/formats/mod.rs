mod common;
mod csv_table;
mod workbook;

pub use csv_table::CsvTableReader;
pub use workbook::WorkbookTableReader;

pub(crate) use common::coerce_thousands_columns;

#[cfg(test)]
pub(crate) use common::parse_grouped_number;
#[cfg(test)]
pub(crate) use workbook::{build_column, cell_value, CellValue};
