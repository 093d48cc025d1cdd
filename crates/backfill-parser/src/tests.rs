use std::path::PathBuf;

use calamine::Data;
use polars::prelude::*;

use crate::errors::ReaderError;
use crate::formats::{build_column, cell_value, parse_grouped_number, CellValue};
use crate::model::SourceFormat;
use crate::read_table;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

#[test]
fn reads_csv_preserving_columns_and_rows() {
    let table = read_table(&fixture("flat_basic.csv")).expect("flat csv read failed");

    assert_eq!(table.format, SourceFormat::Csv);
    assert_eq!(
        table.column_names(),
        vec!["building", "device", "timestamp", "pointName", "value"]
    );
    assert_eq!(table.height(), 4);
    assert!(table.coerced_columns.is_empty());

    let devices = table.df.column("device").unwrap().str().unwrap();
    let collected: Vec<Option<&str>> = devices.iter().collect();
    assert_eq!(collected, vec![Some("D1"), Some("D1"), Some("D1"), Some("D2")]);

    let values = table
        .df
        .column("value")
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap();
    assert_eq!(values.f64().unwrap().get(1), Some(20.5));
}

#[test]
fn strips_thousands_separators_from_numeric_text() {
    let table = read_table(&fixture("flat_thousands.csv")).expect("thousands csv read failed");

    assert_eq!(table.coerced_columns, vec!["value".to_string()]);
    let values = table.df.column("value").unwrap();
    assert_eq!(values.dtype(), &DataType::Float64);
    let values: Vec<Option<f64>> = values.f64().unwrap().iter().collect();
    assert_eq!(values, vec![Some(1234.5), Some(12_345_678.0), Some(42.0)]);
}

#[test]
fn leaves_partially_numeric_text_columns_alone() {
    let table = read_table(&fixture("flat_thousands.csv")).expect("thousands csv read failed");

    let note = table.df.column("note").unwrap();
    assert_eq!(note.dtype(), &DataType::String);
    assert_eq!(note.str().unwrap().get(2), Some("3,000"));
    assert_eq!(
        table.df.column("timestamp").unwrap().dtype(),
        &DataType::String
    );
}

#[test]
fn reads_first_worksheet_of_a_workbook() {
    let table = read_table(&fixture("flat_basic.xlsx")).expect("workbook read failed");

    assert_eq!(table.format, SourceFormat::Xlsx);
    assert_eq!(
        table.column_names(),
        vec!["building", "device", "timestamp", "pointName", "value"]
    );
    assert_eq!(table.height(), 2);

    let devices = table.df.column("device").unwrap();
    assert_eq!(devices.dtype(), &DataType::Int64);

    let timestamps: Vec<Option<&str>> = table
        .df
        .column("timestamp")
        .unwrap()
        .str()
        .unwrap()
        .iter()
        .collect();
    assert_eq!(
        timestamps,
        vec![Some("2024-01-01T00:00:00"), Some("2024-01-01T00:15:00")]
    );

    assert_eq!(table.coerced_columns, vec!["value".to_string()]);
    let values: Vec<Option<f64>> = table
        .df
        .column("value")
        .unwrap()
        .f64()
        .unwrap()
        .iter()
        .collect();
    assert_eq!(values, vec![Some(1234.5), Some(7.0)]);
}

#[test]
fn rejects_unsupported_extension_before_reading() {
    let err = read_table(&fixture("does_not_exist.txt")).unwrap_err();
    match err {
        ReaderError::UnsupportedFormat { extension } => assert_eq!(extension, ".txt"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn extension_matching_ignores_case() {
    let path = PathBuf::from("/tmp/EXPORT.XLSX");
    assert_eq!(SourceFormat::from_path(&path).unwrap(), SourceFormat::Xlsx);
    assert!(SourceFormat::from_path(&PathBuf::from("/tmp/export")).is_err());
}

#[test]
fn zero_byte_file_is_reported_empty() {
    let err = read_table(&fixture("empty.csv")).unwrap_err();
    assert!(matches!(err, ReaderError::Empty { .. }), "got {err}");
}

#[test]
fn whitespace_only_file_is_reported_empty() {
    let err = read_table(&fixture("blank.csv")).unwrap_err();
    assert!(matches!(err, ReaderError::Empty { .. }), "got {err}");
}

#[test]
fn header_only_file_has_no_rows() {
    match read_table(&fixture("header_only.csv")) {
        Ok(table) => assert_eq!(table.height(), 0),
        Err(ReaderError::Empty { .. }) => {}
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn grouped_number_parsing() {
    assert_eq!(parse_grouped_number("1,234"), Some(1234.0));
    assert_eq!(parse_grouped_number(" -2,500.25 "), Some(-2500.25));
    assert_eq!(parse_grouped_number("kWh"), None);
    assert_eq!(parse_grouped_number("inf"), None);
    assert_eq!(parse_grouped_number(""), None);
}

#[test]
fn workbook_cells_map_to_typed_values() {
    assert_eq!(cell_value(&Data::Int(7)), CellValue::Number(7.0));
    assert_eq!(cell_value(&Data::Float(1.5)), CellValue::Number(1.5));
    assert_eq!(cell_value(&Data::String("  ".into())), CellValue::Empty);
    assert_eq!(
        cell_value(&Data::String("kW".into())),
        CellValue::Text("kW".into())
    );
    assert_eq!(
        cell_value(&Data::DateTimeIso("2024-01-01T00:00:00".into())),
        CellValue::Text("2024-01-01T00:00:00".into())
    );
    assert_eq!(cell_value(&Data::Empty), CellValue::Empty);
}

#[test]
fn workbook_columns_stay_numeric_only_when_every_cell_is_numeric() {
    let numeric = build_column(
        "value",
        vec![
            CellValue::Number(1.0),
            CellValue::Empty,
            CellValue::Number(2.5),
        ],
    );
    assert_eq!(numeric.dtype(), &DataType::Float64);
    assert_eq!(numeric.null_count(), 1);

    let ids = build_column("device", vec![CellValue::Number(1001.0), CellValue::Empty]);
    assert_eq!(ids.dtype(), &DataType::Int64);

    let mixed = build_column(
        "device",
        vec![CellValue::Number(1001.0), CellValue::Text("AHU-1".into())],
    );
    assert_eq!(mixed.dtype(), &DataType::String);
    assert_eq!(mixed.str().unwrap().get(0), Some("1001"));
}
