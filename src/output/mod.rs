// mod.rs - Output writers for batch tables and test reports

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::{BatchSummary, TestResult};
use crate::errors::{Error, Result};

pub const SUMMARY_FILE: &str = "summary_tab.tsv";
pub const BRANCH_FILE: &str = "branch_tab.tsv";
pub const TREES_DIR: &str = "trees";
pub const TREE_EXTENSION: &str = "tre";

const SUMMARY_HEADER: [&str; 8] = [
    "locus",
    "kappa",
    "omega",
    "total_dN",
    "total_dS",
    "mean_N",
    "mean_S",
    "num_polymorphic_sites",
];

/// Paths written by `write_batch`
#[derive(Debug, Clone)]
pub struct BatchOutputs {
    pub summary: PathBuf,
    pub branches: PathBuf,
    pub trees_dir: PathBuf,
    pub trees_written: usize,
}

/// Verbatim token when one was kept, otherwise the parsed value; `NA` when absent
fn estimate_field(text: &Option<String>, value: Option<f64>) -> String {
    match (text, value) {
        (Some(text), _) => text.clone(),
        (None, Some(v)) => v.to_string(),
        (None, None) => "NA".to_string(),
    }
}

fn tsv_writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_writer(inner)
}

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    Ok(BufWriter::new(file))
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    locus: &'a str,
    kappa: String,
    omega: String,
    #[serde(rename = "total_dN")]
    total_dn: String,
    #[serde(rename = "total_dS")]
    total_ds: String,
    #[serde(rename = "mean_N")]
    mean_n: f64,
    #[serde(rename = "mean_S")]
    mean_s: f64,
    num_polymorphic_sites: usize,
}

/// Write the summary table of complete loci
pub fn write_summary<W: Write>(inner: W, batch: &BatchSummary) -> std::result::Result<(), csv::Error> {
    let mut wtr = tsv_writer(inner);

    for (locus, entry) in &batch.summary {
        let text = &entry.estimate_text;
        wtr.serialize(SummaryRow {
            locus,
            kappa: estimate_field(&text.kappa, Some(entry.kappa)),
            omega: estimate_field(&text.omega, Some(entry.omega)),
            total_dn: estimate_field(&text.total_dn, entry.total_dn),
            total_ds: estimate_field(&text.total_ds, entry.total_ds),
            mean_n: entry.mean_n,
            mean_s: entry.mean_s,
            num_polymorphic_sites: entry.num_polymorphic_sites,
        })?;
    }
    if batch.summary.is_empty() {
        wtr.write_record(SUMMARY_HEADER)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the flattened branch table: `locus` followed by the branch header
pub fn write_branch_table<W: Write>(
    inner: W,
    batch: &BatchSummary,
) -> std::result::Result<(), csv::Error> {
    let mut wtr = tsv_writer(inner);

    let mut header = vec!["locus".to_string()];
    if let Some(columns) = &batch.branch_header {
        header.extend(columns.iter().cloned());
    }
    wtr.write_record(&header)?;

    for row in &batch.branch_rows {
        wtr.write_record(std::iter::once(&row.locus_id).chain(row.values.iter()))?;
    }

    wtr.flush()?;
    Ok(())
}

/// One `<locus>.tre` file per captured tree
pub fn write_trees(trees_dir: &Path, batch: &BatchSummary) -> Result<usize> {
    create_dir_all(trees_dir).map_err(|e| Error::io(trees_dir, e))?;

    for (locus, tree) in &batch.trees {
        let path = trees_dir.join(format!("{}.{}", locus, TREE_EXTENSION));
        std::fs::write(&path, tree).map_err(|e| Error::io(&path, e))?;
    }
    Ok(batch.trees.len())
}

/// Write summary table, branch table and tree files under `output_dir`.
pub fn write_batch(output_dir: &Path, batch: &BatchSummary) -> Result<BatchOutputs> {
    create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

    let summary = output_dir.join(SUMMARY_FILE);
    write_summary(create_file(&summary)?, batch).map_err(|e| Error::csv(&summary, e))?;
    log::info!("✅ Summary table written to: {}", summary.display());

    let branches = output_dir.join(BRANCH_FILE);
    write_branch_table(create_file(&branches)?, batch).map_err(|e| Error::csv(&branches, e))?;
    log::info!("✅ Branch table written to: {}", branches.display());

    let trees_dir = output_dir.join(TREES_DIR);
    let trees_written = write_trees(&trees_dir, batch)?;
    log::info!("🌳 {} tree files written to: {}", trees_written, trees_dir.display());

    Ok(BatchOutputs {
        summary,
        branches,
        trees_dir,
        trees_written,
    })
}

#[derive(Serialize)]
struct ReportRow<'a> {
    locus: &'a str,
    #[serde(rename = "LR_stat")]
    lr_stat: f64,
    p_value: f64,
    corrected_p_value: f64,
    result: &'a str,
}

/// Write the significance report, one row per tested locus
pub fn write_report<W: Write>(inner: W, results: &[TestResult]) -> std::result::Result<(), csv::Error> {
    let mut wtr = tsv_writer(inner);
    for result in results {
        wtr.serialize(ReportRow {
            locus: &result.locus_id,
            lr_stat: result.lr_statistic,
            p_value: result.raw_p_value,
            corrected_p_value: result.corrected_p_value,
            result: result.marker(),
        })?;
    }
    if results.is_empty() {
        wtr.write_record(["locus", "LR_stat", "p_value", "corrected_p_value", "result"])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the report to a file, preceded by a commented provenance header
pub fn write_report_file(path: &Path, results: &[TestResult], command_line: &str) -> Result<()> {
    let mut writer = create_file(path)?;
    let io_err = |e| Error::io(path, e);

    writeln!(writer, "# Command: {}", command_line).map_err(io_err)?;
    writeln!(
        writer,
        "# Generated: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
    .map_err(io_err)?;
    writeln!(writer, "# cmlstats v{}", crate::VERSION).map_err(io_err)?;

    write_report(&mut writer, results).map_err(|e| Error::csv(path, e))?;
    writer.flush().map_err(io_err)?;
    log::info!("✅ Significance report written to: {}", path.display());
    Ok(())
}
