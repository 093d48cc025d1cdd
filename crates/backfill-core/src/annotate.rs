use std::collections::HashSet;

use crate::readings::Reading;
use crate::units::UnitTable;

pub const UNIT_HEADER: [&str; 3] = ["Device Id", "Field Name", "Units"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitEntry {
    pub device_id: String,
    pub field_name: String,
    /// `None` when the point name is not in the reference table.
    pub units: Option<String>,
}

/// Left-joins the distinct (device, pointName) pairs of a group, in first-occurrence order,
/// against `units`. Pairs without a match are kept with no unit.
pub fn annotate_units(readings: &[Reading], units: &UnitTable) -> Vec<UnitEntry> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    readings
        .iter()
        .filter(|reading| seen.insert((reading.device.as_str(), reading.point_name.as_str())))
        .map(|reading| UnitEntry {
            device_id: reading.device.clone(),
            field_name: reading.point_name.clone(),
            units: units.lookup(&reading.point_name).map(str::to_string),
        })
        .collect()
}

pub fn unmatched_fields(entries: &[UnitEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| entry.units.is_none())
        .map(|entry| entry.field_name.clone())
        .collect()
}

/// The operator-facing message for point names without a unit.
pub fn unmatched_warning(fields: &[String]) -> String {
    format!(
        "The following field(s) is not recognized: {}. Please review and add units if the field(s) is valid.",
        fields.join(", ")
    )
}
