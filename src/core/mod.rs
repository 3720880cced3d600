// mod.rs - Core logic module

pub mod aggregate;
pub mod lrt;
pub mod parser;
pub mod rules;

// Re-export main types for convenience
pub use aggregate::{aggregate, aggregate_directory, Aggregator, BatchSummary, BranchTableRow, SummaryEntry};
pub use lrt::{
    bonferroni, chi_squared_survival, collect_fits, correct_and_flag, likelihood_ratio_statistic,
    likelihood_ratio_test, LocusFit, LrtConfig, TestResult,
};
pub use parser::{parse_file, parse_output, OutputParser, ParseOutcome};
