// merge.rs - Merge configuration file with CLI arguments

use crate::cli::args::{DEFAULT_ALPHA, DEFAULT_EXTENSION};
use crate::cli::{Args, Config, LrtArgs};

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        if self.input.is_none() {
            self.input = config.input;
        }
        if self.output.is_none() {
            self.output = config.output;
        }

        // Only override the default, not an explicit CLI value
        if self.extension == DEFAULT_EXTENSION {
            if let Some(extension) = config.extension {
                self.extension = extension;
            }
        }

        if !self.quiet && config.quiet.unwrap_or(false) {
            self.quiet = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}

impl LrtArgs {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        if self.input.is_none() {
            self.input = config.input;
        }
        if self.null_input.is_none() {
            self.null_input = config.null_input;
        }
        if self.null_extension.is_none() {
            self.null_extension = config.null_extension;
        }
        if self.alt_extension.is_none() {
            self.alt_extension = config.alt_extension;
        }
        if self.df.is_none() {
            self.df = config.df;
        }
        if self.output.is_none() {
            self.output = config.output;
        }

        if self.alpha == DEFAULT_ALPHA {
            if let Some(alpha) = config.alpha {
                self.alpha = alpha;
            }
        }

        if !self.quiet && config.quiet.unwrap_or(false) {
            self.quiet = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            input: None,
            output: Some("cli_out".to_string()),
            extension: DEFAULT_EXTENSION.to_string(),
            quiet: false,
            config: None,
            generate_config: false,
        }
    }

    #[test]
    fn test_config_fills_missing_values() {
        let config = Config {
            input: Some("runs".to_string()),
            output: Some("config_out".to_string()),
            extension: Some(".M0.out".to_string()),
            quiet: Some(true),
            ..Config::new()
        };
        let merged = args().merge_with_config(config);

        assert_eq!(merged.input.as_deref(), Some("runs"));
        assert_eq!(merged.output.as_deref(), Some("cli_out"));
        assert_eq!(merged.extension, ".M0.out");
        assert!(merged.quiet);
    }

    #[test]
    fn test_explicit_extension_wins() {
        let mut cli = args();
        cli.extension = ".cli.out".to_string();
        let config = Config {
            extension: Some(".M0.out".to_string()),
            ..Config::new()
        };
        assert_eq!(cli.merge_with_config(config).extension, ".cli.out");
    }

    #[test]
    fn test_lrt_merge() {
        let cli = LrtArgs {
            df: Some(2),
            ..LrtArgs::default()
        };
        let config = Config {
            input: Some("runs".to_string()),
            null_extension: Some(".M0.out".to_string()),
            alt_extension: Some(".M1.out".to_string()),
            df: Some(1),
            alpha: Some(0.01),
            ..Config::new()
        };
        let merged = cli.merge_with_config(config);

        assert_eq!(merged.input.as_deref(), Some("runs"));
        assert_eq!(merged.df, Some(2));
        assert_eq!(merged.alpha, 0.01);
        assert_eq!(merged.alt_extension.as_deref(), Some(".M1.out"));
        assert!(merged.null_input.is_none());
    }
}
