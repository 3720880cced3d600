// lib.rs - cmlstats library root

//! # cmlstats - Batch parsing, aggregation and significance testing of codeml output
//!
//! This library turns a directory of PAML codeml output files (one per locus)
//! into tabular summaries, and compares nested model fits with a
//! likelihood-ratio test corrected for multiple testing.
//!
//! ## Features
//!
//! - **Tolerant parsing**: every positional assumption is a named rule; format
//!   drift is reported as a `MalformedSection` instead of silently misparsing
//! - **Batch tables**: summary table, flattened branch table and per-locus trees
//! - **Likelihood-ratio test**: chi-squared p-values with Bonferroni correction
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use cmlstats::prelude::*;
//! use std::path::Path;
//!
//! let batch = aggregate_directory(Path::new("codeml_runs"), ".cml.out", false)?;
//! write_batch(Path::new("parsed"), &batch)?;
//!
//! let (alternative, null) = collect_fits(
//!     Path::new("codeml_runs"), ".M1.out",
//!     Path::new("codeml_runs"), ".M0.out",
//! )?;
//! let results = likelihood_ratio_test(&alternative, &null, &LrtConfig::new(1, 0.05)?)?;
//! write_report(std::io::stdout(), &results)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod core;
pub mod data;
pub mod errors;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{aggregate_directory, collect_fits, likelihood_ratio_test};
    pub use crate::core::{BatchSummary, LrtConfig, TestResult};
    pub use crate::data::LocusRecord;
    pub use crate::errors::{Error, Result};
    pub use crate::output::{write_batch, write_report, write_report_file};
}

pub use errors::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "cmlstats v{} - codeml output parser and likelihood-ratio tester",
        VERSION
    )
}
