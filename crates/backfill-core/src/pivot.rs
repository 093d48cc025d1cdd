use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::readings::{DeviceGroup, DeviceKey};

/// A device group reshaped to one row per distinct timestamp and one column per point name.
///
/// Rows are keyed by the timestamp text exactly as it appeared in the source; columns are
/// point names in lexical order. The timestamp column is implicit and never a data column.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub key: DeviceKey,
    pub columns: Vec<String>,
    pub rows: Vec<WideRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub timestamp: String,
    pub cells: Vec<Option<f64>>,
}

impl WideTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, point_name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == point_name)
    }

    pub fn cell(&self, timestamp: &str, point_name: &str) -> Option<f64> {
        let column = self.column_index(point_name)?;
        self.rows
            .iter()
            .find(|row| row.timestamp == timestamp)
            .and_then(|row| row.cells[column])
    }
}

/// Pivots `pointName` into columns with `timestamp` as the row key.
///
/// A repeated (timestamp, pointName) pair keeps the value of the last reading in source order.
pub fn pivot_group(group: &DeviceGroup) -> WideTable {
    let columns: Vec<String> = group
        .readings
        .iter()
        .map(|reading| reading.point_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let column_index: HashMap<&str, usize> = columns
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();

    let mut rows: BTreeMap<&str, Vec<Option<f64>>> = BTreeMap::new();
    for reading in &group.readings {
        let cells = rows
            .entry(reading.timestamp.as_str())
            .or_insert_with(|| vec![None; columns.len()]);
        if let Some(&idx) = column_index.get(reading.point_name.as_str()) {
            cells[idx] = reading.value;
        }
    }

    WideTable {
        key: group.key.clone(),
        rows: rows
            .into_iter()
            .map(|(timestamp, cells)| WideRow {
                timestamp: timestamp.to_string(),
                cells,
            })
            .collect(),
        columns,
    }
}
