use std::path::Path;

use backfill_core::BatchReport;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn failure_table(report: &BatchReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["File", "Error"]);
    for failure in &report.failures {
        table.add_row(vec![file_name(&failure.path), failure.message.clone()]);
    }
    table
}

pub fn collision_table(report: &BatchReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Overwritten output", "First written by", "Replaced by"]);
    for collision in &report.collisions {
        table.add_row(vec![
            collision.path.display().to_string(),
            file_name(&collision.previous_source),
            file_name(&collision.source),
        ]);
    }
    table
}

pub fn print_summary(report: &BatchReport, output_dir: &Path) {
    println!("\n--- Processing Summary ---");
    println!("  Total files: {}", report.total);
    println!("  ✅ Succeeded: {}", report.succeeded);
    println!("  ⚠️  Failed: {}", report.failed());

    if !report.failures.is_empty() {
        println!("\nFailed files:\n{}", failure_table(report));
    }
    if !report.collisions.is_empty() {
        println!(
            "\nOutputs overwritten later in this run:\n{}",
            collision_table(report)
        );
    }

    println!("\nOutput directory: {}", output_dir.display());
    println!("Each device is written to <building>_<device>_<start date>_<end date>/");
}
