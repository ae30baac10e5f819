//! Run configuration.

use std::path::PathBuf;

use crate::error::{Result, RuntimeError};

/// Default number of simultaneous invocations.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Default result file.
pub const DEFAULT_OUTPUT_PATH: &str = "results.csv";

/// Configuration for a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Executable invoked once per target.
    pub command: String,
    /// Literal arguments placed before the target argument.
    pub extra_args: Vec<String>,
    /// Maximum concurrent invocations.
    pub max_concurrency: usize,
    /// Assemble command lines without spawning anything.
    pub dry_run: bool,
    /// Echo each assembled command line to stderr.
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            extra_args: Vec::new(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            dry_run: false,
            verbose: false,
        }
    }
}

impl RunConfig {
    /// Creates a config for the given command with default values.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Adds a literal argument before the target.
    pub fn with_extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Sets the maximum number of concurrent invocations.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Enables or disables dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enables or disables command-line echoing.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Checks the configuration before any work is dispatched.
    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(RuntimeError::InvalidConfig(
                "command path is required".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(RuntimeError::InvalidConfig(
                "max concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the result file.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Destination path.
    pub path: PathBuf,
    /// Preserve existing content instead of truncating.
    pub append: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            append: false,
        }
    }
}

impl OutputConfig {
    /// Creates an output config for `path`, truncating on open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: false,
        }
    }

    /// Sets append mode.
    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();

        assert_eq!(config.max_concurrency, 4);
        assert!(config.extra_args.is_empty());
        assert!(!config.dry_run);
        assert!(!config.verbose);
    }

    #[test]
    fn test_config_builder() {
        let config = RunConfig::new("./probe.sh")
            .with_extra_arg("--quick")
            .with_max_concurrency(16)
            .with_dry_run(true)
            .with_verbose(true);

        assert_eq!(config.command, "./probe.sh");
        assert_eq!(config.extra_args, vec!["--quick"]);
        assert_eq!(config.max_concurrency, 16);
        assert!(config.dry_run);
        assert!(config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_command() {
        let config = RunConfig::default();
        assert!(matches!(
            config.validate(),
            Err(RuntimeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = RunConfig::new("echo").with_max_concurrency(0);
        assert!(matches!(
            config.validate(),
            Err(RuntimeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_output_defaults() {
        let output = OutputConfig::default();
        assert_eq!(output.path, PathBuf::from("results.csv"));
        assert!(!output.append);

        let output = OutputConfig::new("/tmp/out.csv").with_append(true);
        assert!(output.append);
    }
}
