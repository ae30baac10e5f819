//! Command-line interface definition using clap.

use clap::Parser;
use std::path::PathBuf;

use fanout_runtime::{OutputConfig, RunConfig, DEFAULT_OUTPUT_PATH};

/// Fanout - run a script once per target, in parallel
#[derive(Parser, Debug)]
#[command(name = "fanout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Script or executable to run for each target
    #[arg(short, long, env = "FANOUT_SCRIPT")]
    pub script: String,

    /// File with one target per line (blank lines ignored)
    #[arg(short, long, env = "FANOUT_TARGETS")]
    pub targets: PathBuf,

    /// Extra argument passed before the target
    #[arg(short, long, allow_hyphen_values = true)]
    pub arg: Option<String>,

    /// Maximum number of scripts running at once
    #[arg(
        short = 'c',
        long,
        env = "FANOUT_MAX_CONCURRENCY",
        default_value_t = fanout_runtime::DEFAULT_MAX_CONCURRENCY,
        value_parser = parse_concurrency
    )]
    pub max_concurrency: usize,

    /// Print what would run without running it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Append to the output file instead of truncating it
    #[arg(long)]
    pub append: bool,

    /// Where to write collected output
    #[arg(short, long, env = "FANOUT_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Echo each command line and raise log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn parse_concurrency(value: &str) -> Result<usize, String> {
    let n: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a positive integer", value))?;
    if n == 0 {
        return Err("must be at least 1".to_string());
    }
    Ok(n)
}

impl Cli {
    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    /// Script path with `~` expanded.
    pub fn script_path(&self) -> String {
        shellexpand::tilde(&self.script).to_string()
    }

    /// Target file path with `~` expanded.
    pub fn targets_path(&self) -> PathBuf {
        expand_path(&self.targets)
    }

    /// Typed run configuration.
    pub fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::new(self.script_path())
            .with_max_concurrency(self.max_concurrency)
            .with_dry_run(self.dry_run)
            .with_verbose(self.verbose > 0);
        if let Some(arg) = &self.arg {
            config = config.with_extra_arg(arg.clone());
        }
        config
    }

    /// Typed output configuration.
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig::new(expand_path(&self.output)).with_append(self.append)
    }
}

fn expand_path(path: &std::path::Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}
