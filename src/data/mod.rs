// mod.rs - Data structures module

pub mod discovery;
pub mod locus;

// Re-export main types for convenience
pub use discovery::{discover_inputs, locus_id_for, InputFile};
pub use locus::{BranchRow, BranchSchema, EstimateText, LocusRecord};
