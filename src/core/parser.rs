// parser.rs - Single-pass state machine over one codeml output file

use crate::core::rules::{self, names, Estimate};
use crate::data::{BranchRow, BranchSchema, InputFile, LocusRecord};
use crate::errors::{MalformedSection, Result};

/// Position inside the site pattern section.
///
/// The branch table schema is tracked separately: once a valid `branch`
/// header has been seen it stays live for the rest of the file, whatever
/// the site section is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SiteSection {
    Scanning,
    /// Banner seen; next non-blank line holds `numSeq numSites`
    AwaitingSiteCounts,
    /// Counts seen; next non-blank line fixes the breakdown row width
    AwaitingBreakdownWidth,
    InBreakdownBlock { width: usize },
}

/// Result of parsing one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub record: LocusRecord,
    pub issues: Vec<MalformedSection>,
}

/// Line-fed parser. Blank lines are skipped without touching any state.
#[derive(Debug)]
pub struct OutputParser {
    record: LocusRecord,
    issues: Vec<MalformedSection>,
    section: SiteSection,
    branch_schema: Option<BranchSchema>,
    tree_pending: bool,
    line_number: usize,
}

impl OutputParser {
    pub fn new(locus_id: impl Into<String>) -> Self {
        Self {
            record: LocusRecord::new(locus_id),
            issues: Vec::new(),
            section: SiteSection::Scanning,
            branch_schema: None,
            tree_pending: false,
            line_number: 0,
        }
    }

    pub fn feed_line(&mut self, line: &str) {
        self.line_number += 1;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return;
        }

        if let SiteSection::InBreakdownBlock { width } = self.section {
            if tokens.len() == width {
                self.record
                    .polymorphic_sites
                    .extend(rules::polymorphic_offsets(&tokens));
                return;
            }
            // The block ends here; this line goes through the other rules.
            self.section = SiteSection::Scanning;
        }

        self.scan_estimates(line, &tokens);
        self.scan_tree_and_branches(line, &tokens);
    }

    pub fn finish(self) -> ParseOutcome {
        ParseOutcome {
            record: self.record,
            issues: self.issues,
        }
    }

    fn malformed(&mut self, rule: &'static str, detail: impl Into<String>) {
        self.issues.push(MalformedSection {
            line: self.line_number,
            rule,
            detail: detail.into(),
        });
    }

    /// Accept a numeric rule result or record the rejection. Repeated lines overwrite.
    fn store(
        &mut self,
        rule: &'static str,
        value: std::result::Result<Estimate, String>,
    ) -> Option<Estimate> {
        match value {
            Ok(estimate) => Some(estimate),
            Err(detail) => {
                self.malformed(rule, detail);
                None
            }
        }
    }

    /// Site pattern header, parameter estimates, dN/dS totals and lnL.
    /// At most one of these applies to a line.
    fn scan_estimates(&mut self, line: &str, tokens: &[&str]) {
        if line.starts_with(rules::SITE_PATTERN_BANNER) {
            self.section = SiteSection::AwaitingSiteCounts;
            return;
        }

        match self.section {
            SiteSection::AwaitingSiteCounts => {
                match rules::site_counts(tokens) {
                    Ok((num_seq, num_sites)) => {
                        self.record.num_seq = Some(num_seq);
                        self.record.num_sites = Some(num_sites);
                        self.section = SiteSection::AwaitingBreakdownWidth;
                    }
                    Err(detail) => {
                        self.malformed(names::SITE_COUNTS, detail);
                        self.section = SiteSection::Scanning;
                    }
                }
                return;
            }
            SiteSection::AwaitingBreakdownWidth => {
                self.section = SiteSection::InBreakdownBlock {
                    width: tokens.len(),
                };
                return;
            }
            _ => {}
        }

        if let Some(value) = rules::parameter_estimate(tokens, "kappa") {
            if let Some(kappa) = self.store(names::KAPPA, value) {
                self.record.kappa = Some(kappa.value);
                self.record.estimate_text.kappa = Some(kappa.text);
            }
        } else if let Some(value) = rules::parameter_estimate(tokens, "omega") {
            if let Some(omega) = self.store(names::OMEGA, value) {
                self.record.omega = Some(omega.value);
                self.record.estimate_text.omega = Some(omega.text);
            }
        } else if let Some(value) = rules::prefixed_value(line, tokens, rules::DN_TREE_LENGTH_PREFIX) {
            if let Some(total) = self.store(names::TOTAL_DN, value) {
                self.record.total_dn = Some(total.value);
                self.record.estimate_text.total_dn = Some(total.text);
            }
        } else if let Some(value) = rules::prefixed_value(line, tokens, rules::DS_TREE_LENGTH_PREFIX) {
            if let Some(total) = self.store(names::TOTAL_DS, value) {
                self.record.total_ds = Some(total.value);
                self.record.estimate_text.total_ds = Some(total.text);
            }
        } else if let Some(fit) = rules::log_likelihood(line, tokens) {
            match fit {
                Ok(fit) => {
                    self.record.lnl = Some(fit.lnl);
                    self.record.ntime = fit.ntime;
                    self.record.np = fit.np;
                }
                Err(detail) => self.malformed(names::LOG_LIKELIHOOD, detail),
            }
        }
    }

    /// Tree length, the tree line that follows it, and the branch table.
    fn scan_tree_and_branches(&mut self, line: &str, tokens: &[&str]) {
        if let Some(value) = rules::prefixed_value(line, tokens, rules::TREE_LENGTH_PREFIX) {
            if let Some(length) = self.store(names::TREE_LENGTH, value) {
                self.record.tree_length = Some(length.value);
            }
            self.tree_pending = true;
        } else if self.tree_pending {
            self.tree_pending = false;
            let text = line.trim_end();
            if !rules::looks_like_newick(text) {
                self.malformed(names::TREE_TEXT, "line after tree length is not a Newick tree");
            }
            self.record.tree_text = Some(text.to_string());
        } else if tokens[0] == rules::BRANCH_HEADER_TOKEN {
            match BranchSchema::from_tokens(tokens) {
                Ok(schema) => {
                    if self.record.branch_columns.is_none() {
                        self.record.branch_columns = Some(schema.columns.clone());
                    }
                    self.branch_schema = Some(schema);
                }
                Err(detail) => {
                    self.malformed(names::BRANCH_HEADER, detail);
                    self.branch_schema = None;
                }
            }
        } else if let Some(schema) = &self.branch_schema {
            if tokens.len() != schema.width() {
                return;
            }
            let (n_index, s_index) = (schema.n_index, schema.s_index);
            match (
                rules::parse_float(tokens[n_index]),
                rules::parse_float(tokens[s_index]),
            ) {
                (Ok(n), Ok(s)) => self.record.branch_rows.push(BranchRow {
                    values: tokens.iter().map(|t| t.to_string()).collect(),
                    n,
                    s,
                }),
                _ => {
                    let detail = format!(
                        "non-numeric N/S values '{}'/'{}'",
                        tokens[n_index], tokens[s_index]
                    );
                    self.malformed(names::BRANCH_ROW, detail);
                }
            }
        }
    }
}

/// Parse the full text of one estimator output.
pub fn parse_output(locus_id: &str, text: &str) -> ParseOutcome {
    let mut parser = OutputParser::new(locus_id);
    for line in text.lines() {
        parser.feed_line(line);
    }
    parser.finish()
}

/// Read and parse one discovered input file.
pub fn parse_file(input: &InputFile) -> Result<ParseOutcome> {
    let text = input.read()?;
    let outcome = parse_output(&input.locus_id, &text);
    for issue in &outcome.issues {
        log::warn!("⚠️  {}: malformed section at {}", input.locus_id, issue);
    }
    Ok(outcome)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Trimmed-down codeml output for a four-taxon M0 run.
    pub(crate) const M0_OUTPUT: &str = "\
CODONML (in paml version 4.9j, February 2020)  group_1.pal2nal
Model: One dN/dS ratio,
Codon frequency model: F1x4
ns =   4  ls = 117

Printing out site pattern counts


     4         15  P

seq1                  ATG AAA CCG TTT GGC
seq2                  ... ..G ... .C. ...
seq3                  ... ..G ..A ... ...
seq4                  ..A ... ... ... ...

     1    3    2    1    4

Codon frequencies under model, for use in evolver (TTT TTC TTA TTG ... GGG):

TREE #  1:  ((1, 2), 3, 4);   MP score: 6
lnL(ntime:  5  np:  7):   -712.345678      +0.000000
   5..6     5..3     5..4     6..1     6..2
  0.010000 0.020000 0.030000 0.040000 0.050000 2.000000 0.500000

Note: Branch length is defined as number of nucleotide substitutions per codon (not per neucleotide site).

tree length =   0.15000

((1: 0.040000, 2: 0.050000): 0.010000, 3: 0.020000, 4: 0.030000);

((seq1: 0.040000, seq2: 0.050000): 0.010000, seq3: 0.020000, seq4: 0.030000);

Detailed output identifying parameters
kappa (ts/tv) =  2.00000

omega (dN/dS) =  0.50000

dN & dS for each branch

 branch           t       N       S   dN/dS      dN      dS  N*dN  S*dS

   5..6       0.010   270.0    81.0   0.5000  0.0030  0.0060   0.8   0.5
   6..1       0.040   280.0    79.0   0.5000  0.0120  0.0240   3.4   1.9
   6..2       0.050   290.0    80.0   0.5000  0.0150  0.0300   4.4   2.4

tree length for dN:       0.03000
tree length for dS:       0.06000
";

    #[test]
    fn test_parses_complete_m0_output() {
        let outcome = parse_output("group_1", M0_OUTPUT);
        let record = &outcome.record;

        assert!(outcome.issues.is_empty(), "issues: {:?}", outcome.issues);
        assert_eq!(record.locus_id, "group_1");
        assert_eq!(record.kappa, Some(2.0));
        assert_eq!(record.omega, Some(0.5));
        assert_eq!(record.total_dn, Some(0.03));
        assert_eq!(record.total_ds, Some(0.06));
        assert_eq!(record.tree_length, Some(0.15));
        assert_eq!(record.num_seq, Some(4));
        assert_eq!(record.num_sites, Some(15));
        assert_eq!(record.lnl, Some(-712.345678));
        assert_eq!(record.np, Some(7));
        assert_eq!(record.ntime, Some(5));
        assert_eq!(
            record.tree_text.as_deref(),
            Some("((1: 0.040000, 2: 0.050000): 0.010000, 3: 0.020000, 4: 0.030000);")
        );

        assert_eq!(record.branch_rows.len(), 3);
        assert_eq!(record.branch_rows[1].values[0], "6..1");
        assert_relative_eq!(record.mean_n().unwrap(), 280.0);
        assert_relative_eq!(record.mean_s().unwrap(), 80.0);
        assert_eq!(
            record.branch_columns.as_ref().map(|c| c.len()),
            Some(9)
        );
        assert!(record.is_complete());
    }

    #[test]
    fn test_polymorphic_sites_are_union_of_rows() {
        let record = parse_output("group_1", M0_OUTPUT).record;
        // seq2: ..G at 5, .C. at 10; seq3: ..G at 5, ..A at 8; seq4: ..A at 2
        let sites: Vec<usize> = record.polymorphic_sites.iter().copied().collect();
        assert_eq!(sites, vec![2, 5, 8, 10]);
        assert_eq!(record.num_polymorphic_sites(), 4);
    }

    #[test]
    fn test_polymorphic_count_independent_of_row_order() {
        let reordered = M0_OUTPUT
            .replace(
                "seq2                  ... ..G ... .C. ...\n",
                "SWAP\n",
            )
            .replace(
                "seq4                  ..A ... ... ... ...\n",
                "seq2                  ... ..G ... .C. ...\n",
            )
            .replace("SWAP\n", "seq4                  ..A ... ... ... ...\n");
        let a = parse_output("g", M0_OUTPUT).record;
        let b = parse_output("g", &reordered).record;
        assert_eq!(a.polymorphic_sites, b.polymorphic_sites);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let first = parse_output("group_1", M0_OUTPUT);
        let second = parse_output("group_1", M0_OUTPUT);
        assert_eq!(first, second);
    }

    #[test]
    fn test_breakdown_terminator_is_reevaluated() {
        // The first line that breaks the block width is a kappa line and
        // must still be picked up.
        let text = "\
Printing out site pattern counts
     2          6  P
seq1   ATG AAA
seq2   ..C ...
kappa (ts/tv) =  3.5
";
        let record = parse_output("g", text).record;
        assert_eq!(record.kappa, Some(3.5));
        assert_eq!(record.polymorphic_sites.len(), 1);
    }

    #[test]
    fn test_last_parameter_value_wins() {
        let text = "kappa (ts/tv) =  1.0\nomega (dN/dS) =  0.2\nkappa (ts/tv) =  4.0\n";
        let record = parse_output("g", text).record;
        assert_eq!(record.kappa, Some(4.0));
        assert_eq!(record.omega, Some(0.2));
    }

    #[test]
    fn test_missing_kappa_and_omega_is_incomplete() {
        let text = M0_OUTPUT
            .replace("kappa (ts/tv) =  2.00000", "")
            .replace("omega (dN/dS) =  0.50000", "");
        let record = parse_output("g", &text).record;
        assert!(!record.is_complete());
        assert_eq!(record.kappa, None);
        assert_eq!(record.omega, None);
    }

    #[test]
    fn test_branch_header_without_n_column() {
        let text = M0_OUTPUT.replace(
            " branch           t       N       S",
            " branch           t      NN       S",
        );
        let outcome = parse_output("g", &text);
        assert!(outcome.record.branch_rows.is_empty());
        assert!(outcome.record.branch_columns.is_none());
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].rule, names::BRANCH_HEADER);
    }

    #[test]
    fn test_non_numeric_branch_row_is_dropped() {
        let text = M0_OUTPUT.replace(
            "   6..1       0.040   280.0",
            "   6..1       0.040   ?????",
        );
        let outcome = parse_output("g", &text);
        assert_eq!(outcome.record.branch_rows.len(), 2);
        assert_relative_eq!(outcome.record.mean_n().unwrap(), 280.0);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].rule, names::BRANCH_ROW);
    }

    #[test]
    fn test_tree_line_is_positional() {
        let text = "tree length =   0.5\n\nnot a tree at all\n";
        let outcome = parse_output("g", text);
        assert_eq!(outcome.record.tree_text.as_deref(), Some("not a tree at all"));
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].rule, names::TREE_TEXT);
        assert_eq!(outcome.issues[0].line, 3);
    }

    #[test]
    fn test_bad_site_counts_do_not_arm_block() {
        let text = "\
Printing out site pattern counts
seq1   ATG AAA
seq2   ..C ...
";
        let outcome = parse_output("g", text);
        assert_eq!(outcome.record.num_seq, None);
        assert!(outcome.record.polymorphic_sites.is_empty());
        assert_eq!(outcome.issues[0].rule, names::SITE_COUNTS);
    }

    #[test]
    fn test_estimate_tokens_kept_verbatim() {
        let text = &parse_output("group_1", M0_OUTPUT).record.estimate_text;
        assert_eq!(text.kappa.as_deref(), Some("2.00000"));
        assert_eq!(text.omega.as_deref(), Some("0.50000"));
        assert_eq!(text.total_dn.as_deref(), Some("0.03000"));
        assert_eq!(text.total_ds.as_deref(), Some("0.06000"));
    }

    #[test]
    fn test_nan_log_likelihood_is_malformed() {
        let outcome = parse_output("g", "lnL(ntime:  5  np:  7):   nan  +0.000000\n");
        assert_eq!(outcome.record.lnl, None);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].rule, names::LOG_LIKELIHOOD);
    }

    #[test]
    fn test_non_finite_estimate_keeps_previous_value() {
        let text = "kappa (ts/tv) =  2.0\nkappa (ts/tv) =  nan\nomega (dN/dS) =  inf\n";
        let outcome = parse_output("g", text);
        assert_eq!(outcome.record.kappa, Some(2.0));
        assert_eq!(outcome.record.estimate_text.kappa.as_deref(), Some("2.0"));
        assert_eq!(outcome.record.omega, None);
        let rules: Vec<&str> = outcome.issues.iter().map(|i| i.rule).collect();
        assert_eq!(rules, vec![names::KAPPA, names::OMEGA]);
    }

    #[test]
    fn test_nan_branch_row_is_dropped() {
        let text = M0_OUTPUT.replace(
            "   6..2       0.050   290.0    80.0",
            "   6..2       0.050     nan    80.0",
        );
        let outcome = parse_output("g", &text);
        assert_eq!(outcome.record.branch_rows.len(), 2);
        assert_relative_eq!(outcome.record.mean_n().unwrap(), 275.0);
        assert_eq!(outcome.issues[0].rule, names::BRANCH_ROW);
    }

    #[test]
    fn test_polymorphic_sites_union_across_blocks() {
        let text = "\
Printing out site pattern counts
     2          3  P
seq1   ATG
seq2   ..C

Printing out site pattern counts
     2          3  P
seq1   ATG
seq2   T..
seq3   ..C
";
        let outcome = parse_output("g", text);
        let sites: Vec<usize> = outcome.record.polymorphic_sites.iter().copied().collect();
        assert_eq!(sites, vec![0, 2]);
        assert_eq!(outcome.record.num_sites, Some(3));
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_invalid_second_header_keeps_earlier_rows() {
        let text = "\
 branch      t       N       S
   5..6  0.010   270.0    81.0
 branch      t      NN       S
   6..1  0.040   280.0    79.0
";
        let outcome = parse_output("g", text);
        let record = &outcome.record;

        // Rows under the valid header stay; the invalid header stops further rows
        assert_eq!(record.branch_rows.len(), 1);
        assert_eq!(record.branch_rows[0].values[0], "5..6");
        assert_eq!(
            record.branch_columns.as_ref().map(|c| c[2].as_str()),
            Some("N")
        );
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].rule, names::BRANCH_HEADER);
        assert_eq!(outcome.issues[0].line, 3);
    }

    #[test]
    fn test_empty_input() {
        let outcome = parse_output("g", "");
        assert_eq!(outcome.record, LocusRecord::new("g"));
        assert!(outcome.issues.is_empty());
    }
}
