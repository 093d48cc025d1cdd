use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::engine::{DeviceOutput, FileOutcome, Pivoter};
use crate::error::Result;

/// Anything that can turn one input file into device outputs.
pub trait FileProcessor {
    fn process(&self, path: &Path) -> Result<FileOutcome>;
}

impl FileProcessor for Pivoter {
    fn process(&self, path: &Path) -> Result<FileOutcome> {
        self.pivot(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// An output file written twice in the same run; the later write replaced the earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputCollision {
    pub path: PathBuf,
    pub previous_source: PathBuf,
    pub source: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<FileFailure>,
    pub collisions: Vec<OutputCollision>,
    pub outputs: Vec<DeviceOutput>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Processes every path in order. A failing file is recorded and never stops the run.
pub fn run_batch(processor: &dyn FileProcessor, paths: &[PathBuf]) -> BatchReport {
    let mut report = BatchReport {
        total: paths.len(),
        ..BatchReport::default()
    };
    let mut written: HashMap<PathBuf, PathBuf> = HashMap::new();

    for (idx, path) in paths.iter().enumerate() {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!("[{}/{}] Processing: {name}", idx + 1, paths.len());

        match processor.process(path) {
            Ok(outcome) => {
                report.succeeded += 1;
                info!(devices = outcome.devices.len(), "Success: {name}");
                for device in outcome.devices {
                    // The units file always shares the wide table's folder and fate.
                    let output = &device.table_path;
                    if let Some(previous) = written.insert(output.clone(), path.clone()) {
                        warn!(
                            output = %output.display(),
                            previous = %previous.display(),
                            "output overwritten by a later file in this run"
                        );
                        report.collisions.push(OutputCollision {
                            path: output.clone(),
                            previous_source: previous,
                            source: path.clone(),
                        });
                    }
                    report.outputs.push(device);
                }
            }
            Err(err) => {
                let message = err.to_string();
                error!("Failed: {name}: {message}");
                report.failures.push(FileFailure {
                    path: path.clone(),
                    message,
                });
            }
        }
    }

    report
}
