use std::path::{Path, PathBuf};
use std::sync::Arc;

use backfill_parser::read_table;
use tracing::{debug, info, warn};

use crate::annotate::{annotate_units, unmatched_fields, unmatched_warning, UnitEntry};
use crate::config::PivotConfig;
use crate::error::{BackfillError, Result};
use crate::outputs::{prepare_folder, write_units_table, write_wide_table, FolderLog, StagedFile};
use crate::pivot::pivot_group;
use crate::readings::{check_required_columns, extract_readings, group_by_device, DeviceGroup, DeviceKey};
use crate::timestamps::{normalize_table, DateRange, NormalizedTable};
use crate::units::UnitTable;

/// What was written for one device group.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceOutput {
    pub key: DeviceKey,
    pub folder: PathBuf,
    pub folder_created: bool,
    pub table_path: PathBuf,
    pub units_path: PathBuf,
    pub date_range: DateRange,
    pub row_count: usize,
    pub column_count: usize,
    /// Rows whose local time was ambiguous or nonexistent.
    pub invalid_timestamps: usize,
    pub unmatched_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub devices: Vec<DeviceOutput>,
}

/// A device group fully computed and validated, ready to be written.
struct DevicePlan {
    table: NormalizedTable,
    date_range: DateRange,
    units: Vec<UnitEntry>,
}

/// Turns one flat export into per-device folders under the configured output directory.
pub struct Pivoter {
    config: PivotConfig,
    units: Arc<UnitTable>,
}

impl Pivoter {
    pub fn new(config: PivotConfig, units: Arc<UnitTable>) -> Self {
        Self { config, units }
    }

    pub fn with_builtin_units(config: PivotConfig) -> Self {
        Self::new(config, UnitTable::builtin())
    }

    pub fn config(&self) -> &PivotConfig {
        &self.config
    }

    /// Loads `path`, pivots every (building, device) group and writes its two output files.
    ///
    /// Every group is pivoted and validated before the first folder is created, so a failing
    /// file leaves the output tree as it was.
    pub fn pivot(&self, path: &Path) -> Result<FileOutcome> {
        let table = read_table(path)?;
        check_required_columns(&table)?;
        if table.height() == 0 {
            return Err(BackfillError::EmptyInput);
        }
        if !table.coerced_columns.is_empty() {
            debug!(columns = ?table.coerced_columns, "converted comma-grouped text columns to numbers");
        }

        let readings = extract_readings(&table.df)?;
        let groups = group_by_device(readings);
        info!(
            source = %path.display(),
            rows = table.height(),
            devices = groups.len(),
            "pivoting flat file"
        );

        let plans = groups
            .iter()
            .map(|group| self.plan_device(group))
            .collect::<Result<Vec<_>>>()?;

        let devices = plans
            .into_iter()
            .map(|plan| self.write_device(path, plan))
            .collect::<Result<Vec<_>>>()?;

        Ok(FileOutcome {
            source: path.to_path_buf(),
            devices,
        })
    }

    fn plan_device(&self, group: &DeviceGroup) -> Result<DevicePlan> {
        group.key.check_path_safe()?;
        let wide = pivot_group(group);
        let table = normalize_table(wide, self.config.timezone, self.config.shift)?;
        let date_range = table
            .date_range()
            .ok_or_else(|| BackfillError::NoValidTimestamps {
                building: group.key.building.clone(),
                device: group.key.device.clone(),
            })?;
        let units = annotate_units(&group.readings, &self.units);

        Ok(DevicePlan {
            table,
            date_range,
            units,
        })
    }

    fn write_device(&self, source: &Path, plan: DevicePlan) -> Result<DeviceOutput> {
        let DevicePlan {
            table,
            date_range,
            units,
        } = plan;
        let key = table.key.clone();

        let folder = prepare_folder(
            &self.config.output_dir,
            &date_range.folder_name(&key),
        )?;
        let log = FolderLog::open(&folder);
        if folder.created {
            log.info(&format!("Input File Path: {}", source.display()));
            log.info("Action Performed: Pivoting and Timestamp Formatting");
        }

        let staged_table = StagedFile::stage(folder.path.join(format!("{key}.csv")), |file| {
            write_wide_table(file, &table)
        })?;
        let staged_units = StagedFile::stage(folder.path.join(format!("{key}_units.csv")), |file| {
            write_units_table(file, &units)
        })?;
        let table_path = staged_table.commit()?;
        let units_path = staged_units.commit()?;

        log.info(&format!(
            "Output File Path: {}, Date Range: {} to {}",
            table_path.display(),
            date_range.start_label(),
            date_range.end_label()
        ));
        log.info(&format!("Output Unit File Path: {}", units_path.display()));

        let invalid_timestamps = table.invalid_count();
        if invalid_timestamps > 0 {
            warn!(
                device = %key,
                rows = invalid_timestamps,
                "ambiguous or nonexistent local timestamps written blank and sorted last"
            );
        }

        let unmatched = unmatched_fields(&units);
        if !unmatched.is_empty() {
            let message = unmatched_warning(&unmatched);
            warn!(device = %key, "{message}");
            log.warning(&message);
        }

        info!(
            device = %key,
            folder = %folder.path.display(),
            rows = table.row_count(),
            columns = table.columns.len(),
            "wrote device output"
        );

        Ok(DeviceOutput {
            key,
            folder: folder.path,
            folder_created: folder.created,
            table_path,
            units_path,
            date_range,
            row_count: table.row_count(),
            column_count: table.columns.len(),
            invalid_timestamps,
            unmatched_fields: unmatched,
        })
    }
}
