use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

/// Canonical point names exported by the aggregation system and their physical units.
pub const UNIT_REFERENCE: [(&str, &str); 33] = [
    ("Current", "amperes"),
    ("Current_A", "amperes"),
    ("Current_B", "amperes"),
    ("Current_C", "amperes"),
    ("Frequency", "hertz"),
    ("PF", "no-units"),
    ("PF_A", "no-units"),
    ("PF_B", "no-units"),
    ("PF_C", "no-units"),
    ("Volts_AB", "volts"),
    ("Volts_AN", "volts"),
    ("Volts_BC", "volts"),
    ("Volts_BN", "volts"),
    ("Volts_CA", "volts"),
    ("Volts_CN", "volts"),
    ("Volts_LL", "volts"),
    ("Volts_LN", "volts"),
    ("kVAR_Demand", "kilovolt-amperes-reactive"),
    ("kVA_Demand", "kilovolt-amperes"),
    ("kVAR", "kilovolt-amperes-reactive"),
    ("kVA", "kilovolt-amperes"),
    ("kW", "kilowatts"),
    ("kW_A", "kilowatts"),
    ("kW_B", "kilowatts"),
    ("kW_C", "kilowatts"),
    ("kWh", "kilowatt-hours"),
    ("Temperature", "degrees-fahrenheit"),
    ("GasFlowRate_Unscaled", "cubic-feet-per-hour"),
    ("GasFlowTotal_Unscaled", "cubic-feet"),
    ("WaterFlowTotal", "us-gallons"),
    ("WaterFlowRate", "us-gallons-per-minute"),
    ("kWh_rec", "kilowatts"),
    ("water_volume_accumulator", "us-gallons"),
];

static BUILTIN_UNITS: Lazy<Arc<UnitTable>> =
    Lazy::new(|| Arc::new(UnitTable::from_pairs(UNIT_REFERENCE)));

/// Immutable point-name to unit lookup. Names match exactly (case-sensitive).
#[derive(Debug, Clone, Default)]
pub struct UnitTable {
    units: HashMap<String, String>,
}

impl UnitTable {
    /// The compiled-in reference table, built once per process.
    pub fn builtin() -> Arc<UnitTable> {
        Arc::clone(&BUILTIN_UNITS)
    }

    /// Later pairs replace earlier ones, so every name maps to exactly one unit.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let units = pairs
            .into_iter()
            .map(|(name, unit)| (name.into(), unit.into()))
            .collect();
        Self { units }
    }

    pub fn lookup(&self, point_name: &str) -> Option<&str> {
        self.units.get(point_name).map(String::as_str)
    }

    pub fn contains(&self, point_name: &str) -> bool {
        self.units.contains_key(point_name)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
