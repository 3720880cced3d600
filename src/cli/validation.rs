// validation.rs - Input validation utilities

use std::path::{Path, PathBuf};

use crate::cli::args::{Args, LrtArgs};
use crate::core::LrtConfig;

/// Validated settings of a parsing/aggregation run
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub extension: String,
}

/// Validated settings of a likelihood-ratio test run
#[derive(Debug, Clone, PartialEq)]
pub struct LrtValidation {
    pub alt_dir: PathBuf,
    pub null_dir: PathBuf,
    pub alt_extension: String,
    pub null_extension: String,
    pub config: LrtConfig,
    pub output: Option<PathBuf>,
}

fn existing_dir(value: Option<&str>, flag: &str) -> Result<PathBuf, String> {
    let value = value.ok_or_else(|| format!("{} is required", flag))?;
    let path = Path::new(value);
    if !path.is_dir() {
        return Err(format!("{} '{}' is not a directory", flag, value));
    }
    Ok(path.to_path_buf())
}

fn non_empty_extension(value: Option<&str>, flag: &str) -> Result<String, String> {
    match value {
        Some(ext) if !ext.trim().is_empty() => Ok(ext.to_string()),
        Some(_) => Err(format!("{} must not be empty", flag)),
        None => Err(format!("{} is required", flag)),
    }
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult, String> {
    let input_dir = existing_dir(args.input.as_deref(), "--input")?;
    let extension = non_empty_extension(Some(&args.extension), "--extension")?;

    let output_dir = args
        .output
        .as_deref()
        .map(PathBuf::from)
        .ok_or("--output is required")?;
    if output_dir.is_file() {
        return Err(format!(
            "--output '{}' is an existing file, expected a directory",
            output_dir.display()
        ));
    }

    Ok(ValidationResult {
        input_dir,
        output_dir,
        extension,
    })
}

/// Validate the likelihood-ratio test arguments
pub fn validate_lrt_args(args: &LrtArgs) -> Result<LrtValidation, String> {
    let alt_dir = existing_dir(args.input.as_deref(), "--input")?;
    let null_dir = match args.null_input.as_deref() {
        Some(_) => existing_dir(args.null_input.as_deref(), "--null-input")?,
        None => alt_dir.clone(),
    };

    let null_extension = non_empty_extension(args.null_extension.as_deref(), "--null")?;
    let alt_extension = non_empty_extension(args.alt_extension.as_deref(), "--alternative")?;
    if null_dir == alt_dir && null_extension == alt_extension {
        return Err(format!(
            "--null and --alternative both select '{}' in the same directory",
            null_extension
        ));
    }

    let df = args.df.ok_or("--df is required")?;
    let config = LrtConfig::new(df, args.alpha).map_err(|e| e.to_string())?;

    Ok(LrtValidation {
        alt_dir,
        null_dir,
        alt_extension,
        null_extension,
        config,
        output: args.output.as_deref().map(PathBuf::from),
    })
}
