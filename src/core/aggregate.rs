// aggregate.rs - Batch-level tables built from per-locus records

use std::collections::BTreeMap;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

use crate::core::parser::parse_file;
use crate::data::{discover_inputs, EstimateText, LocusRecord};
use crate::errors::{IncompleteLocus, Result};

/// One summary table line for a complete locus.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEntry {
    pub kappa: f64,
    pub omega: f64,
    pub total_dn: Option<f64>,
    pub total_ds: Option<f64>,
    pub mean_n: f64,
    pub mean_s: f64,
    pub num_polymorphic_sites: usize,
    /// Tokens of kappa, omega and the totals as the estimator printed them
    pub estimate_text: EstimateText,
}

/// One (locus, branch) pair of the flattened branch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTableRow {
    pub locus_id: String,
    pub values: Vec<String>,
}

/// Everything a batch produces.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Complete loci only, ordered by locus id
    pub summary: BTreeMap<String, SummaryEntry>,
    /// Header of the first file that declared a valid branch table
    pub branch_header: Option<Vec<String>>,
    pub branch_rows: Vec<BranchTableRow>,
    pub trees: BTreeMap<String, String>,
    /// Ordered by locus id
    pub incomplete: Vec<IncompleteLocus>,
    pub malformed_sections: usize,
    pub loci_seen: usize,
}

/// Accumulates frozen records one file at a time.
#[derive(Debug, Default)]
pub struct Aggregator {
    batch: BatchSummary,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: LocusRecord) {
        let batch = &mut self.batch;
        batch.loci_seen += 1;

        if batch.branch_header.is_none() {
            batch.branch_header = record.branch_columns.clone();
        }
        batch
            .branch_rows
            .extend(record.branch_rows.iter().map(|row| BranchTableRow {
                locus_id: record.locus_id.clone(),
                values: row.values.clone(),
            }));

        if let Some(tree) = &record.tree_text {
            batch.trees.insert(record.locus_id.clone(), tree.clone());
        }

        match (record.kappa, record.omega, record.mean_n(), record.mean_s()) {
            (Some(kappa), Some(omega), Some(mean_n), Some(mean_s)) => {
                batch.summary.insert(
                    record.locus_id.clone(),
                    SummaryEntry {
                        kappa,
                        omega,
                        total_dn: record.total_dn,
                        total_ds: record.total_ds,
                        mean_n,
                        mean_s,
                        num_polymorphic_sites: record.num_polymorphic_sites(),
                        estimate_text: record.estimate_text.clone(),
                    },
                );
            }
            _ => batch.incomplete.push(IncompleteLocus {
                locus_id: record.locus_id.clone(),
                missing: record.missing_fields(),
            }),
        }
    }

    pub fn record_issues(&mut self, count: usize) {
        self.batch.malformed_sections += count;
    }

    pub fn finish(mut self) -> BatchSummary {
        self.batch
            .incomplete
            .sort_by(|a, b| a.locus_id.cmp(&b.locus_id));
        self.batch
    }
}

/// Aggregate already-parsed records, in the given order.
pub fn aggregate<I>(records: I) -> BatchSummary
where
    I: IntoIterator<Item = LocusRecord>,
{
    let mut aggregator = Aggregator::new();
    for record in records {
        aggregator.add(record);
    }
    aggregator.finish()
}

fn make_progress_bar(quiet: bool, len: u64) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}

/// Discover, parse and aggregate every output file in `dir` ending with
/// `extension`. Files are processed one at a time in file name order.
pub fn aggregate_directory(dir: &Path, extension: &str, quiet: bool) -> Result<BatchSummary> {
    let inputs = discover_inputs(dir, extension)?;
    let pb = make_progress_bar(quiet, inputs.len() as u64);

    let mut aggregator = Aggregator::new();
    for input in &inputs {
        let outcome = parse_file(input)?;
        aggregator.record_issues(outcome.issues.len());
        aggregator.add(outcome.record);
        pb.inc(1);
        pb.set_message(input.locus_id.clone());
    }

    let batch = aggregator.finish();
    pb.finish_with_message(format!(
        "✅ Parsed {} loci ({} complete)",
        batch.loci_seen,
        batch.summary.len()
    ));
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse_output;
    use crate::core::parser::tests::M0_OUTPUT;
    use crate::errors::{Error, MissingField};
    use approx::assert_relative_eq;
    use std::fs;

    #[test]
    fn test_complete_locus_summary() {
        let batch = aggregate(vec![parse_output("group_1", M0_OUTPUT).record]);

        let entry = &batch.summary["group_1"];
        assert_eq!(entry.kappa, 2.0);
        assert_eq!(entry.omega, 0.5);
        assert_eq!(entry.total_dn, Some(0.03));
        assert_relative_eq!(entry.mean_n, 280.0);
        assert_relative_eq!(entry.mean_s, 80.0);
        assert_eq!(entry.num_polymorphic_sites, 4);

        assert_eq!(batch.branch_rows.len(), 3);
        assert!(batch.branch_rows.iter().all(|r| r.locus_id == "group_1"));
        assert_eq!(batch.branch_header.as_ref().map(|h| h[0].as_str()), Some("branch"));
        assert_eq!(batch.trees.len(), 1);
        assert!(batch.incomplete.is_empty());
    }

    #[test]
    fn test_locus_without_kappa_or_omega() {
        let text = M0_OUTPUT
            .replace("kappa (ts/tv) =  2.00000", "")
            .replace("omega (dN/dS) =  0.50000", "");
        let batch = aggregate(vec![parse_output("broken", &text).record]);

        assert!(batch.summary.is_empty());
        assert_eq!(batch.incomplete.len(), 1);
        assert_eq!(batch.incomplete[0].locus_id, "broken");
        assert_eq!(
            batch.incomplete[0].missing,
            vec![MissingField::Kappa, MissingField::Omega]
        );
        // Branch rows and the tree are still reported
        assert_eq!(batch.branch_rows.len(), 3);
        assert!(batch.trees.contains_key("broken"));
    }

    #[test]
    fn test_locus_missing_n_column_is_incomplete() {
        let text = M0_OUTPUT.replace(
            " branch           t       N       S",
            " branch           t      NN       S",
        );
        let batch = aggregate(vec![parse_output("no_n", &text).record]);
        assert!(batch.summary.is_empty());
        assert_eq!(batch.incomplete[0].missing, vec![MissingField::BranchRows]);
    }

    #[test]
    fn test_summary_sorted_and_branch_rows_in_traversal_order() {
        let records = vec![
            parse_output("zeta", M0_OUTPUT).record,
            parse_output("alpha", M0_OUTPUT).record,
        ];
        let batch = aggregate(records);

        let loci: Vec<&str> = batch.summary.keys().map(|k| k.as_str()).collect();
        assert_eq!(loci, vec!["alpha", "zeta"]);
        assert_eq!(batch.branch_rows[0].locus_id, "zeta");
        assert_eq!(batch.branch_rows[3].locus_id, "alpha");
    }

    #[test]
    fn test_aggregate_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("g1.cml.out"), M0_OUTPUT).unwrap();
        fs::write(dir.path().join("g2.cml.out"), "nothing useful here\n").unwrap();
        fs::write(dir.path().join("g3.log"), M0_OUTPUT).unwrap();

        let batch = aggregate_directory(dir.path(), ".cml.out", true).unwrap();
        assert_eq!(batch.loci_seen, 2);
        assert_eq!(batch.summary.len(), 1);
        assert_eq!(batch.incomplete[0].locus_id, "g2");
    }

    #[test]
    fn test_aggregate_empty_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = aggregate_directory(dir.path(), ".cml.out", true);
        assert!(matches!(result, Err(Error::NoInputFiles { .. })));
    }
}
