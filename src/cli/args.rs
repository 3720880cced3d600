// args.rs - Command line arguments definition

use argh::FromArgs;

pub const DEFAULT_EXTENSION: &str = ".cml.out";
pub const DEFAULT_ALPHA: f64 = 0.05;

#[derive(FromArgs, Debug)]
/// cmlstats - Batch parser and aggregator for codeml output files
pub struct Args {
    /// directory containing one codeml output file per locus
    #[argh(option)]
    pub input: Option<String>,

    /// output directory for summary_tab.tsv, branch_tab.tsv and trees/
    #[argh(option)]
    pub output: Option<String>,

    /// file name suffix selecting the codeml outputs (default: .cml.out)
    #[argh(option, default = "String::from(DEFAULT_EXTENSION)")]
    pub extension: String,

    /// only log warnings and errors, hide the progress bar
    #[argh(switch)]
    pub quiet: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}

/// Options of the likelihood-ratio test tool, filled from clap matches.
#[derive(Debug, Clone, PartialEq)]
pub struct LrtArgs {
    /// Directory with the alternative-model outputs
    pub input: Option<String>,
    /// Directory with the null-model outputs; defaults to `input`
    pub null_input: Option<String>,
    pub null_extension: Option<String>,
    pub alt_extension: Option<String>,
    pub df: Option<usize>,
    pub alpha: f64,
    /// Report file; stdout when absent
    pub output: Option<String>,
    pub quiet: bool,
}

impl Default for LrtArgs {
    fn default() -> Self {
        Self {
            input: None,
            null_input: None,
            null_extension: None,
            alt_extension: None,
            df: None,
            alpha: DEFAULT_ALPHA,
            output: None,
            quiet: false,
        }
    }
}
