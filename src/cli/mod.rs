// mod.rs - CLI module

pub mod args;
pub mod config;
pub mod merge;
pub mod validation;

// Re-export main types for convenience
pub use args::{Args, LrtArgs};
pub use config::Config;
pub use validation::{validate_args, validate_lrt_args, LrtValidation, ValidationResult};

/// Install the stderr logger. `RUST_LOG` wins over the `quiet` default.
pub fn init_logging(quiet: bool) {
    let default_filter = if quiet { "warn" } else { "info" };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());

    let mut builder = pretty_env_logger::formatted_builder();
    builder.parse_filters(&filter);
    // A logger may already be installed (tests, embedding applications)
    let _ = builder.try_init();
}
