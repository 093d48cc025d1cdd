use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use backfill_core::{run_batch, PivotConfig, Pivoter};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod inputs;
mod interactive;
mod summary;

use inputs::{check_input, files_in_directory, resolve_output_dir, InputError};

/// Pivots long-format building telemetry exports into per-device wide time series.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// A single .csv, .xlsx or .xls export to process
    #[arg(short, long, conflicts_with = "directory")]
    input: Option<PathBuf>,

    /// Process every supported file directly inside this directory
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Where device folders are written (defaults to the first input's folder)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// IANA timezone of the source timestamps (overrides BACKFILL_TIMEZONE)
    #[arg(long)]
    timezone: Option<String>,

    /// Minutes added to every localized timestamp (overrides BACKFILL_SHIFT_MINUTES)
    #[arg(long, allow_hyphen_values = true)]
    shift_minutes: Option<i64>,

    /// Emit log lines as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// One file named with `--input`; its failure fails the process.
    Single,
    Batch,
}

struct Plan {
    files: Vec<PathBuf>,
    output: Option<PathBuf>,
    mode: Mode,
}

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json);

    let config = PivotConfig::from_env(PathBuf::new())?
        .apply_overrides(cli.timezone.as_deref(), cli.shift_minutes)?;
    info!(
        timezone = %config.timezone,
        shift_minutes = config.shift_minutes(),
        "configuration loaded"
    );

    print_banner();

    let plan = match plan_from_flags(&cli) {
        Ok(Some(plan)) => plan,
        Ok(None) => match interactive::prompt_selection()? {
            Some(selection) => Plan {
                files: selection.files,
                output: selection.output,
                mode: Mode::Batch,
            },
            None => {
                println!("Exiting.");
                return Ok(ExitCode::SUCCESS);
            }
        },
        Err(err) => {
            error!("{err}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let output_dir = resolve_output_dir(plan.output.as_deref(), &plan.files)?;
    info!(
        files = plan.files.len(),
        output = %output_dir.display(),
        "starting batch"
    );

    let pivoter = Pivoter::with_builtin_units(config.with_output_dir(&output_dir));
    let report = run_batch(&pivoter, &plan.files);
    summary::print_summary(&report, &output_dir);

    if plan.mode == Mode::Single && !report.all_succeeded() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// `None` when neither `--input` nor `--directory` was given.
fn plan_from_flags(cli: &Cli) -> Result<Option<Plan>, InputError> {
    if let Some(input) = &cli.input {
        let file = check_input(input)?;
        return Ok(Some(Plan {
            files: vec![file],
            output: cli.output.clone(),
            mode: Mode::Single,
        }));
    }

    if let Some(dir) = &cli.directory {
        let files = files_in_directory(dir)?;
        if files.is_empty() {
            return Err(InputError::NoSupportedFiles(dir.clone()));
        }
        info!("found {} file(s) in {}", files.len(), dir.display());
        return Ok(Some(Plan {
            files,
            output: cli.output.clone(),
            mode: Mode::Batch,
        }));
    }

    Ok(None)
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_banner() {
    println!("==============================================");
    println!(" Backfill formatter");
    println!(" Pivot and timestamp-normalize telemetry exports");
    println!("==============================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_and_directory_flags_conflict() {
        let result = Cli::try_parse_from(["backfill", "-i", "a.csv", "-d", "data"]);
        assert!(result.is_err());
    }

    #[test]
    fn negative_shift_is_accepted() {
        let cli = Cli::try_parse_from(["backfill", "--shift-minutes", "-30", "--json"]).unwrap();
        assert_eq!(cli.shift_minutes, Some(-30));
        assert!(cli.json);
        assert!(cli.input.is_none());
    }

    #[test]
    fn missing_input_file_fails_before_processing() {
        let cli = Cli::try_parse_from(["backfill", "-i", "/definitely/not/here.csv"]).unwrap();
        assert!(matches!(
            plan_from_flags(&cli),
            Err(InputError::NotFound(_))
        ));
    }

    #[test]
    fn no_flags_means_interactive() {
        let cli = Cli::try_parse_from(["backfill"]).unwrap();
        assert!(plan_from_flags(&cli).unwrap().is_none());
    }
}
