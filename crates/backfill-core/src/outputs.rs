use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, WriterBuilder};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::annotate::{UnitEntry, UNIT_HEADER};
use crate::error::{BackfillError, Result};
use crate::readings::TIMESTAMP;
use crate::timestamps::NormalizedTable;

pub const LOG_FILE_NAME: &str = "backfill_log.log";
const SIGNIFICANT_DIGITS: usize = 10;

/// Formats like C's `%.10g`: ten significant digits, trailing zeros trimmed, exponent form
/// outside `1e-4 <= |v| < 1e10`.
pub fn format_general(value: f64) -> String {
    format_significant(value, SIGNIFICANT_DIGITS)
}

fn format_significant(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let precision = digits.max(1) - 1;
    let scientific = format!("{value:.precision$e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (precision as i32 - exponent).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Writes the wide table: numeric cells bare, everything else (header, timestamps, nulls) quoted.
pub fn write_wide_table<W: Write>(writer: W, table: &NormalizedTable) -> Result<()> {
    let mut csv = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(writer);

    let mut header = Vec::with_capacity(table.columns.len() + 1);
    header.push(TIMESTAMP);
    header.extend(table.columns.iter().map(String::as_str));
    csv.write_record(&header)?;

    for (row, timestamp) in table.rows.iter().zip(table.rendered_timestamps()) {
        let mut record = Vec::with_capacity(row.cells.len() + 1);
        record.push(timestamp);
        record.extend(
            row.cells
                .iter()
                .map(|cell| cell.map(format_general).unwrap_or_default()),
        );
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

/// Writes the unit annotation table with every field quoted.
pub fn write_units_table<W: Write>(writer: W, entries: &[UnitEntry]) -> Result<()> {
    let mut csv = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);

    csv.write_record(UNIT_HEADER)?;
    for entry in entries {
        csv.write_record([
            entry.device_id.as_str(),
            entry.field_name.as_str(),
            entry.units.as_deref().unwrap_or_default(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFolder {
    pub path: PathBuf,
    /// False when the folder already existed and is being reused.
    pub created: bool,
}

/// Creates `output_dir/name` unless it already exists.
pub fn prepare_folder(output_dir: &Path, name: &str) -> Result<OutputFolder> {
    let path = output_dir.join(name);
    if path.is_dir() {
        return Ok(OutputFolder {
            path,
            created: false,
        });
    }
    fs::create_dir_all(&path).map_err(|err| {
        BackfillError::processing(format!("failed to create {}: {err}", path.display()))
    })?;
    Ok(OutputFolder {
        path,
        created: true,
    })
}

/// A file written under a temporary name inside its destination folder.
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    pub fn stage<F>(target: PathBuf, write: F) -> Result<Self>
    where
        F: FnOnce(&mut NamedTempFile) -> Result<()>,
    {
        let dir = target.parent().ok_or_else(|| {
            BackfillError::processing(format!("{} has no parent folder", target.display()))
        })?;
        let mut temp = NamedTempFile::new_in(dir)?;
        write(&mut temp)?;
        temp.as_file().sync_all()?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))?;
        }
        Ok(Self { temp, target })
    }

    /// Renames the staged file over its target, replacing any earlier output.
    pub fn commit(self) -> Result<PathBuf> {
        let Self { temp, target } = self;
        temp.persist(&target).map_err(|err| {
            BackfillError::processing(format!("failed to write {}: {}", target.display(), err.error))
        })?;
        Ok(target)
    }
}

/// The per-folder `backfill_log.log`.
///
/// The file is created only together with a new output folder; later runs append to it when
/// it exists and skip it otherwise.
#[derive(Debug, Clone)]
pub struct FolderLog {
    path: Option<PathBuf>,
}

impl FolderLog {
    pub fn open(folder: &OutputFolder) -> Self {
        let path = folder.path.join(LOG_FILE_NAME);
        let path = (folder.created || path.is_file()).then_some(path);
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&self, message: &str) {
        self.append("INFO", message);
    }

    pub fn warning(&self, message: &str) {
        self.append("WARNING", message);
    }

    fn append(&self, level: &str, message: &str) {
        let Some(path) = &self.path else {
            return;
        };
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{level}:backfill:{message}"));
        if let Err(err) = result {
            warn!(path = %path.display(), "failed to append to folder log: {err}");
        }
    }
}
