// main.rs - CLI entry point

use std::time::Instant;

use cmlstats::cli::{init_logging, Config};
use cmlstats::prelude::*;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_main() -> std::result::Result<(), String> {
    let mut args: Args = argh::from_env();

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    init_logging(args.quiet);
    let settings = validate_args(&args)?;

    log::info!("🚀 {}", cmlstats::get_info());
    log::info!("📂 Input: {}", settings.input_dir.display());
    log::info!("🔎 Extension: {}", settings.extension);

    let start = Instant::now();
    let batch = aggregate_directory(&settings.input_dir, &settings.extension, args.quiet)
        .map_err(|e| e.to_string())?;

    if batch.malformed_sections > 0 {
        log::warn!(
            "⚠️  {} malformed sections were skipped",
            batch.malformed_sections
        );
    }

    report_incomplete(&batch);

    let outputs = write_batch(&settings.output_dir, &batch).map_err(|e| e.to_string())?;

    log::info!(
        "✅ {} of {} loci summarized, {} branch rows, {} trees in {:.2}s",
        batch.summary.len(),
        batch.loci_seen,
        batch.branch_rows.len(),
        outputs.trees_written,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn report_incomplete(batch: &BatchSummary) {
    if batch.incomplete.is_empty() {
        return;
    }

    for locus in &batch.incomplete {
        log::warn!("⚠️  Excluded from summary: {}", locus);
    }

    let ids: Vec<&str> = batch
        .incomplete
        .iter()
        .map(|locus| locus.locus_id.as_str())
        .collect();
    eprintln!("Loci with missing info: {}", ids.join(", "));
}
