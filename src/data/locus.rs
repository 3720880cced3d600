// locus.rs - Per-locus record assembled from one estimator output file

use std::collections::BTreeSet;

use crate::errors::MissingField;

/// Column schema announced by a `branch` header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSchema {
    pub columns: Vec<String>,
    pub n_index: usize,
    pub s_index: usize,
}

impl BranchSchema {
    /// Build a schema from the tokens of a header row.
    ///
    /// Fails when the header lacks a column literally named `N` or `S`.
    pub fn from_tokens(tokens: &[&str]) -> Result<Self, String> {
        let position = |name: &str| tokens.iter().position(|t| *t == name);
        let n_index = position("N").ok_or("branch header has no 'N' column")?;
        let s_index = position("S").ok_or("branch header has no 'S' column")?;

        Ok(Self {
            columns: tokens.iter().map(|t| t.to_string()).collect(),
            n_index,
            s_index,
        })
    }

    /// Number of tokens a data row must have
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// One per-branch statistics row, kept verbatim plus its parsed N and S.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchRow {
    pub values: Vec<String>,
    pub n: f64,
    pub s: f64,
}

/// Tokens the estimates were read from, kept for verbatim output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EstimateText {
    pub kappa: Option<String>,
    pub omega: Option<String>,
    pub total_dn: Option<String>,
    pub total_ds: Option<String>,
}

/// Everything extracted from a single estimator output.
#[derive(Debug, Clone, PartialEq)]
pub struct LocusRecord {
    pub locus_id: String,
    pub kappa: Option<f64>,
    pub omega: Option<f64>,
    pub total_dn: Option<f64>,
    pub total_ds: Option<f64>,
    pub tree_length: Option<f64>,
    pub lnl: Option<f64>,
    pub np: Option<usize>,
    pub ntime: Option<usize>,
    pub num_seq: Option<usize>,
    pub num_sites: Option<usize>,
    /// First valid branch header of the file
    pub branch_columns: Option<Vec<String>>,
    pub branch_rows: Vec<BranchRow>,
    pub polymorphic_sites: BTreeSet<usize>,
    pub tree_text: Option<String>,
    pub estimate_text: EstimateText,
}

impl LocusRecord {
    pub fn new(locus_id: impl Into<String>) -> Self {
        Self {
            locus_id: locus_id.into(),
            kappa: None,
            omega: None,
            total_dn: None,
            total_ds: None,
            tree_length: None,
            lnl: None,
            np: None,
            ntime: None,
            num_seq: None,
            num_sites: None,
            branch_columns: None,
            branch_rows: Vec::new(),
            polymorphic_sites: BTreeSet::new(),
            tree_text: None,
            estimate_text: EstimateText::default(),
        }
    }

    /// Fields required for the summary table that were never observed
    pub fn missing_fields(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.kappa.is_none() {
            missing.push(MissingField::Kappa);
        }
        if self.omega.is_none() {
            missing.push(MissingField::Omega);
        }
        if self.branch_rows.is_empty() {
            missing.push(MissingField::BranchRows);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Mean of the N column over retained branch rows; `None` without rows.
    pub fn mean_n(&self) -> Option<f64> {
        self.column_mean(|row| row.n)
    }

    /// Mean of the S column over retained branch rows; `None` without rows.
    pub fn mean_s(&self) -> Option<f64> {
        self.column_mean(|row| row.s)
    }

    pub fn num_polymorphic_sites(&self) -> usize {
        self.polymorphic_sites.len()
    }

    fn column_mean(&self, value: impl Fn(&BranchRow) -> f64) -> Option<f64> {
        if self.branch_rows.is_empty() {
            return None;
        }
        let sum: f64 = self.branch_rows.iter().map(value).sum();
        Some(sum / self.branch_rows.len() as f64)
    }
}
