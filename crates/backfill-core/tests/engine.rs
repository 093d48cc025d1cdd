use std::fs;
use std::path::{Path, PathBuf};

use backfill_core::outputs::LOG_FILE_NAME;
use backfill_core::{BackfillError, PivotConfig, Pivoter};
use tempfile::{tempdir, TempDir};

const HEADER: &str = "building,device,timestamp,pointName,value\n";

fn write_input(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write input");
    path
}

fn pivoter(out: &TempDir) -> Pivoter {
    Pivoter::with_builtin_units(PivotConfig::new(out.path()))
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("read output")
        .lines()
        .map(str::to_string)
        .collect()
}

fn folder_count(dir: &Path) -> usize {
    fs::read_dir(dir)
        .expect("read output dir")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .count()
}

#[test]
fn writes_wide_table_units_and_log_for_one_device() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        &format!(
            "{HEADER}B1,D1,2024-01-01T00:00:00,kW,10\nB1,D1,2024-01-01T00:00:00,kWh,20.5\nB1,D1,2024-01-01T00:00:00,Mystery,1\n"
        ),
    );

    let outcome = pivoter(&out).pivot(&input).expect("pivot succeeds");
    assert_eq!(outcome.devices.len(), 1);
    let device = &outcome.devices[0];

    let folder = out.path().join("B1_D1_2024-01-01_2024-01-01");
    assert_eq!(device.folder, folder);
    assert!(device.folder_created);
    assert_eq!(device.table_path, folder.join("B1_D1.csv"));
    assert_eq!(device.units_path, folder.join("B1_D1_units.csv"));
    assert_eq!(device.row_count, 1);
    assert_eq!(device.column_count, 3);
    assert_eq!(device.unmatched_fields, vec!["Mystery"]);

    assert_eq!(
        lines(&device.table_path),
        vec![
            r#""timestamp","Mystery","kW","kWh""#,
            r#""2024-01-01 00:15:00-08:00",1,10,20.5"#,
        ]
    );
    assert_eq!(
        lines(&device.units_path),
        vec![
            r#""Device Id","Field Name","Units""#,
            r#""D1","kW","kilowatts""#,
            r#""D1","kWh","kilowatt-hours""#,
            r#""D1","Mystery","""#,
        ]
    );

    let log = fs::read_to_string(folder.join(LOG_FILE_NAME)).expect("folder log");
    assert!(log.contains("INFO:backfill:Input File Path:"));
    assert!(log.contains("Date Range: 2024-01-01 to 2024-01-01"));
    assert!(log.contains("WARNING:backfill:The following field(s) is not recognized: Mystery."));
}

#[test]
fn rerunning_the_same_input_is_byte_identical() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        &format!(
            "{HEADER}B1,D1,2024-01-01T00:15:00,kW,2\nB1,D1,2024-01-01T00:00:00,kW,1\nB1,D1,2024-01-01T00:00:00,Current,0.333\n"
        ),
    );
    let pivoter = pivoter(&out);

    let first = pivoter.pivot(&input).unwrap();
    let table = fs::read(&first.devices[0].table_path).unwrap();
    let units = fs::read(&first.devices[0].units_path).unwrap();

    let second = pivoter.pivot(&input).unwrap();
    assert!(!second.devices[0].folder_created);
    assert_eq!(fs::read(&second.devices[0].table_path).unwrap(), table);
    assert_eq!(fs::read(&second.devices[0].units_path).unwrap(), units);
    assert_eq!(folder_count(out.path()), 1);
}

#[test]
fn rows_are_sorted_by_shifted_instant() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        &format!(
            "{HEADER}B1,D1,2024-01-01T23:45:00,kW,3\nB1,D1,2024-01-01T00:00:00,kW,1\nB1,D1,2024-01-01T12:00:00,kW,2\n"
        ),
    );

    let outcome = pivoter(&out).pivot(&input).unwrap();
    let device = &outcome.devices[0];
    assert!(device
        .folder
        .ends_with("B1_D1_2024-01-01_2024-01-02"));
    assert_eq!(
        lines(&device.table_path)[1..],
        [
            r#""2024-01-01 00:15:00-08:00",1"#.to_string(),
            r#""2024-01-01 12:15:00-08:00",2"#.to_string(),
            r#""2024-01-02 00:00:00-08:00",3"#.to_string(),
        ]
    );
}

#[test]
fn missing_columns_fail_before_any_output() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        "building,timestamp,pointName,value\nB1,2024-01-01T00:00:00,kW,1\n",
    );

    match pivoter(&out).pivot(&input) {
        Err(BackfillError::MissingColumns { names }) => assert_eq!(names, vec!["device"]),
        other => panic!("expected MissingColumns, got {other:?}"),
    }
    assert_eq!(folder_count(out.path()), 0);
}

#[test]
fn empty_and_header_only_inputs_are_empty_errors() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let empty = write_input(input_dir.path(), "empty.csv", "");
    let header_only = write_input(input_dir.path(), "header.csv", HEADER);
    let pivoter = pivoter(&out);

    assert!(matches!(pivoter.pivot(&empty), Err(BackfillError::EmptyInput)));
    assert!(matches!(
        pivoter.pivot(&header_only),
        Err(BackfillError::EmptyInput)
    ));
    assert_eq!(folder_count(out.path()), 0);
}

#[test]
fn unsupported_extension_is_rejected() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.txt",
        &format!("{HEADER}B1,D1,2024-01-01T00:00:00,kW,1\n"),
    );

    match pivoter(&out).pivot(&input) {
        Err(BackfillError::UnsupportedFormat { extension }) => assert_eq!(extension, ".txt"),
        other => panic!("expected UnsupportedFormat, got {other:?}"),
    }
}

#[test]
fn unparsable_timestamp_writes_nothing() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        &format!(
            "{HEADER}B1,D1,2024-01-01T00:00:00,kW,1\nB2,D9,2024-01-01T00:00:00,kW,1\nB2,D9,not a time,kW,2\n"
        ),
    );

    match pivoter(&out).pivot(&input) {
        Err(BackfillError::TimestampParse { value }) => assert_eq!(value, "not a time"),
        other => panic!("expected TimestampParse, got {other:?}"),
    }
    assert_eq!(folder_count(out.path()), 0);
}

#[test]
fn text_values_are_a_pivot_column_error() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        &format!("{HEADER}B1,D1,2024-01-01T00:00:00,kW,1\nB1,D1,2024-01-01T00:15:00,kW,high\n"),
    );

    assert!(matches!(
        pivoter(&out).pivot(&input),
        Err(BackfillError::PivotColumn { .. })
    ));
    assert_eq!(folder_count(out.path()), 0);
}

#[test]
fn group_without_valid_timestamps_fails_the_file() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        &format!("{HEADER}B1,D1,2024-11-03T01:30:00,kW,1\nB1,D1,2024-11-03T01:45:00,kW,2\n"),
    );

    match pivoter(&out).pivot(&input) {
        Err(BackfillError::NoValidTimestamps { building, device }) => {
            assert_eq!(building, "B1");
            assert_eq!(device, "D1");
        }
        other => panic!("expected NoValidTimestamps, got {other:?}"),
    }
    assert_eq!(folder_count(out.path()), 0);
}

#[test]
fn ambiguous_rows_are_written_last_with_a_blank_timestamp() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        &format!(
            "{HEADER}B1,D1,2024-11-03T01:30:00,kW,7\nB1,D1,2024-11-03T04:00:00,kW,8\nB1,D1,2024-11-02T23:00:00,kW,6\n"
        ),
    );

    let outcome = pivoter(&out).pivot(&input).unwrap();
    let device = &outcome.devices[0];
    assert_eq!(device.invalid_timestamps, 1);
    assert!(device.folder.ends_with("B1_D1_2024-11-02_2024-11-03"));
    assert_eq!(
        lines(&device.table_path),
        vec![
            r#""timestamp","kW""#,
            r#""2024-11-02 23:15:00-07:00",6"#,
            r#""2024-11-03 04:15:00-08:00",8"#,
            r#""",7"#,
        ]
    );
}

#[test]
fn each_device_gets_its_own_folder() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        &format!(
            "{HEADER}B2,D7,2024-02-01T00:00:00,Current,4\nB1,D1,2024-01-01T00:00:00,kW,1\nB2,D7,2024-02-02T00:00:00,Current,5\n"
        ),
    );

    let outcome = pivoter(&out).pivot(&input).unwrap();
    let folders: Vec<PathBuf> = outcome
        .devices
        .iter()
        .map(|device| device.folder.clone())
        .collect();
    assert_eq!(
        folders,
        vec![
            out.path().join("B2_D7_2024-02-01_2024-02-02"),
            out.path().join("B1_D1_2024-01-01_2024-01-01"),
        ]
    );
    assert_eq!(outcome.devices[0].row_count, 2);
    assert!(outcome.devices[0]
        .table_path
        .ends_with("B2_D7_2024-02-01_2024-02-02/B2_D7.csv"));
}

#[test]
fn sparse_cells_are_written_as_empty_strings() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        &format!("{HEADER}B1,D1,2024-01-01T00:00:00,kW,1\nB1,D1,2024-01-01T00:15:00,kWh,2\n"),
    );

    let outcome = pivoter(&out).pivot(&input).unwrap();
    assert_eq!(
        lines(&outcome.devices[0].table_path)[1..],
        [
            r#""2024-01-01 00:15:00-08:00",1,"""#.to_string(),
            r#""2024-01-01 00:30:00-08:00","",2"#.to_string(),
        ]
    );
}

#[test]
fn thousands_separated_values_are_numeric() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        &format!("{HEADER}B1,D1,2024-01-01T00:00:00,kWh,\"1,234.5\"\nB1,D1,2024-01-01T00:15:00,kWh,12\n"),
    );

    let outcome = pivoter(&out).pivot(&input).unwrap();
    let written = lines(&outcome.devices[0].table_path);
    assert_eq!(written[1], r#""2024-01-01 00:15:00-08:00",1234.5"#);
    assert_eq!(written[2], r#""2024-01-01 00:30:00-08:00",12"#);
}

#[test]
fn existing_folder_without_log_is_not_given_one() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let folder = out.path().join("B1_D1_2024-01-01_2024-01-01");
    fs::create_dir_all(&folder).unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        &format!("{HEADER}B1,D1,2024-01-01T00:00:00,kW,1\n"),
    );

    let outcome = pivoter(&out).pivot(&input).unwrap();
    assert!(!outcome.devices[0].folder_created);
    assert!(folder.join("B1_D1.csv").is_file());
    assert!(!folder.join(LOG_FILE_NAME).exists());
}

#[test]
fn unsafe_identifiers_fail_before_any_folder_is_created() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let pivoter = pivoter(&out);

    for building in ["A/B", "..\\up", ".."] {
        let input = write_input(
            input_dir.path(),
            "export.csv",
            &format!(
                "{HEADER}OK,D0,2024-01-01T00:00:00,kW,1\n{building},D1,2024-01-01T00:00:00,kW,2\n"
            ),
        );
        match pivoter.pivot(&input) {
            Err(BackfillError::PivotColumn { detail }) => assert!(detail.contains("building")),
            other => panic!("expected PivotColumn for {building:?}, got {other:?}"),
        }
    }
    assert_eq!(folder_count(out.path()), 0);
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn blank_device_fails_before_any_folder_is_created() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        &format!("{HEADER}B1,D1,2024-01-01T00:00:00,kW,1\nB1,,2024-01-01T00:00:00,kW,2\n"),
    );

    match pivoter(&out).pivot(&input) {
        Err(BackfillError::PivotColumn { detail }) => assert!(detail.contains("device")),
        other => panic!("expected PivotColumn, got {other:?}"),
    }
    assert_eq!(folder_count(out.path()), 0);
}

#[test]
fn all_blank_values_are_written_as_empty_cells() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        &format!("{HEADER}B1,D1,2024-01-01T00:00:00,kW,\nB1,D1,2024-01-01T00:15:00,kW,\n"),
    );

    let outcome = pivoter(&out).pivot(&input).expect("blank values are legal readings");
    assert_eq!(
        lines(&outcome.devices[0].table_path),
        vec![
            r#""timestamp","kW""#,
            r#""2024-01-01 00:15:00-08:00","""#,
            r#""2024-01-01 00:30:00-08:00","""#,
        ]
    );
}

#[test]
fn unmatched_fields_share_one_warning_line() {
    let input_dir = tempdir().unwrap();
    let out = tempdir().unwrap();
    let input = write_input(
        input_dir.path(),
        "export.csv",
        &format!(
            "{HEADER}B1,D1,2024-01-01T00:00:00,Zeta,1\nB1,D1,2024-01-01T00:00:00,kW,2\nB1,D1,2024-01-01T00:15:00,Alpha,3\nB1,D1,2024-01-01T00:15:00,Zeta,4\n"
        ),
    );

    let outcome = pivoter(&out).pivot(&input).unwrap();
    let device = &outcome.devices[0];
    assert_eq!(device.unmatched_fields, vec!["Zeta", "Alpha"]);

    let log = fs::read_to_string(device.folder.join(LOG_FILE_NAME)).unwrap();
    let warnings: Vec<&str> = log
        .lines()
        .filter(|line| line.starts_with("WARNING:backfill:"))
        .collect();
    assert_eq!(
        warnings,
        vec![
            "WARNING:backfill:The following field(s) is not recognized: Zeta, Alpha. Please review and add units if the field(s) is valid."
        ]
    );
}

#[test]
fn pivots_a_workbook_export() {
    let input = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../backfill-parser/tests/data/flat_basic.xlsx");
    let out = tempdir().unwrap();

    let outcome = pivoter(&out).pivot(&input).expect("workbook pivot succeeds");
    let device = &outcome.devices[0];
    assert_eq!(
        device.folder,
        out.path().join("B1_1001_2024-01-01_2024-01-01")
    );
    assert_eq!(
        lines(&device.table_path),
        vec![
            r#""timestamp","kW""#,
            r#""2024-01-01 00:15:00-08:00",1234.5"#,
            r#""2024-01-01 00:30:00-08:00",7"#,
        ]
    );
    assert_eq!(
        lines(&device.units_path)[1],
        r#""1001","kW","kilowatts""#
    );
}
