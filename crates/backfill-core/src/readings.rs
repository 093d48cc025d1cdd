use std::collections::HashMap;
use std::fmt;

use backfill_parser::LoadedTable;
use polars::prelude::*;

use crate::error::{BackfillError, Result};

pub const BUILDING: &str = "building";
pub const DEVICE: &str = "device";
pub const TIMESTAMP: &str = "timestamp";
pub const POINT_NAME: &str = "pointName";
pub const VALUE: &str = "value";

pub const REQUIRED_COLUMNS: [&str; 5] = [BUILDING, DEVICE, TIMESTAMP, POINT_NAME, VALUE];

/// One row of a long-format export.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub building: String,
    pub device: String,
    pub timestamp: String,
    pub point_name: String,
    pub value: Option<f64>,
}

impl Reading {
    pub fn new(
        building: impl Into<String>,
        device: impl Into<String>,
        timestamp: impl Into<String>,
        point_name: impl Into<String>,
        value: Option<f64>,
    ) -> Self {
        Self {
            building: building.into(),
            device: device.into(),
            timestamp: timestamp.into(),
            point_name: point_name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceKey {
    pub building: String,
    pub device: String,
}

impl DeviceKey {
    /// Both identifiers end up in folder and file names, so each must be one plain path
    /// segment inside the output directory.
    pub fn check_path_safe(&self) -> Result<()> {
        for (column, value) in [(BUILDING, &self.building), (DEVICE, &self.device)] {
            if !is_plain_segment(value) {
                return Err(BackfillError::pivot_column(format!(
                    "{column} '{value}' cannot be used in an output folder name"
                )));
            }
        }
        Ok(())
    }
}

fn is_plain_segment(value: &str) -> bool {
    !value.trim().is_empty()
        && !value.contains(['/', '\\', '\0'])
        && !matches!(value, "." | "..")
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.building, self.device)
    }
}

/// Every reading of one (building, device) pair from a single source file, in source order.
#[derive(Debug, Clone)]
pub struct DeviceGroup {
    pub key: DeviceKey,
    pub readings: Vec<Reading>,
}

/// Reports every absent required column at once, in canonical order.
pub fn check_required_columns(table: &LoadedTable) -> Result<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !table.has_column(name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BackfillError::MissingColumns { names: missing })
    }
}

pub fn extract_readings(df: &DataFrame) -> Result<Vec<Reading>> {
    let buildings = text_column(df, BUILDING)?;
    let devices = text_column(df, DEVICE)?;
    let timestamps = text_column(df, TIMESTAMP)?;
    let point_names = text_column(df, POINT_NAME)?;
    let values = value_column(df)?;

    let readings = buildings
        .into_iter()
        .zip(devices)
        .zip(timestamps)
        .zip(point_names)
        .zip(values)
        .map(
            |((((building, device), timestamp), point_name), value)| Reading {
                building,
                device,
                timestamp,
                point_name,
                value,
            },
        )
        .collect();

    Ok(readings)
}

fn text_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column_error =
        |err: PolarsError| BackfillError::pivot_column(format!("column '{name}': {err}"));

    let column = df.column(name).map_err(column_error)?;
    let as_text = column.cast(&DataType::String).map_err(column_error)?;
    let values = as_text.str().map_err(column_error)?;

    Ok(values
        .iter()
        .map(|value| value.unwrap_or_default().to_string())
        .collect())
}

fn value_column(df: &DataFrame) -> Result<Vec<Option<f64>>> {
    let column_error =
        |err: PolarsError| BackfillError::pivot_column(format!("column '{VALUE}': {err}"));

    let column = df.column(VALUE).map_err(column_error)?;
    // A column of blank cells loads as text with no values; its readings are all null.
    let all_null = column.null_count() == column.len();
    let numeric = column.dtype().is_primitive_numeric()
        || column.dtype() == &DataType::Null
        || all_null;
    if !numeric {
        return Err(BackfillError::pivot_column(format!(
            "column '{VALUE}' must be numeric, found {}",
            column.dtype()
        )));
    }

    let as_float = column.cast(&DataType::Float64).map_err(column_error)?;
    let values = as_float.f64().map_err(column_error)?;
    Ok(values.iter().collect())
}

/// Partitions readings by exact (building, device) match, keeping first-seen group order.
pub fn group_by_device(readings: Vec<Reading>) -> Vec<DeviceGroup> {
    let mut order: Vec<DeviceGroup> = Vec::new();
    let mut index: HashMap<DeviceKey, usize> = HashMap::new();

    for reading in readings {
        let key = DeviceKey {
            building: reading.building.clone(),
            device: reading.device.clone(),
        };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            order.push(DeviceGroup {
                key,
                readings: Vec::new(),
            });
            order.len() - 1
        });
        order[slot].readings.push(reading);
    }

    order
}
