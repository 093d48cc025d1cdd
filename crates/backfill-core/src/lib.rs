//! Pivots long-format building telemetry exports into per-device wide time series.

pub mod annotate;
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod outputs;
pub mod pivot;
pub mod readings;
pub mod timestamps;
pub mod units;

pub use backfill_parser::{LoadedTable, SourceFormat};
pub use batch::{run_batch, BatchReport, FileFailure, FileProcessor, OutputCollision};
pub use config::{ConfigError, PivotConfig};
pub use engine::{DeviceOutput, FileOutcome, Pivoter};
pub use error::{BackfillError, Result};
pub use units::UnitTable;
