// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings shared by `cmlstats` and `lrt_test`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub input: Option<String>,
    pub output: Option<String>,
    pub extension: Option<String>,

    // Likelihood-ratio test
    pub null_input: Option<String>,
    pub null_extension: Option<String>,
    pub alt_extension: Option<String>,
    pub df: Option<usize>,
    pub alpha: Option<f64>,

    // Flags
    pub quiet: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        log::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        log::info!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# cmlstats.toml - Configuration file for cmlstats and lrt_test
# Command line arguments will override these settings

# =============================================================================
# PARSING / AGGREGATION (cmlstats)
# =============================================================================

# Directory with one codeml output file per locus
input = "/path/to/codeml_runs"

# Output directory for summary_tab.tsv, branch_tab.tsv and trees/
output = "parsed"

# File name suffix selecting the codeml outputs
extension = ".cml.out"

# =============================================================================
# LIKELIHOOD-RATIO TEST (lrt_test)
# =============================================================================

# Directory with the null-model outputs (defaults to input)
# null_input = "/path/to/null_runs"

# Suffixes of the null and alternative model outputs
null_extension = ".M0.out"
alt_extension = ".M1.out"

# Degrees of freedom (difference in free parameters between the models)
df = 1

# Significance threshold applied to Bonferroni-corrected p-values
alpha = 0.05

# =============================================================================
# FLAGS
# =============================================================================

# Only log warnings and errors
quiet = false
"#
        .to_string()
    }
}
