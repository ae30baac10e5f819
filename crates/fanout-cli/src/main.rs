//! Fanout CLI entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use fanout_cli::cli::Cli;
use fanout_cli::commands;

#[tokio::main]
async fn main() {
    // Load .env.local if it exists (for FANOUT_* defaults)
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    // Initialize tracing on stderr; stdout stays free for the user
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match commands::execute(&cli).await {
        Ok(summary) if summary.is_success() => {}
        Ok(summary) => {
            eprintln!(
                "Error: {} of {} targets failed",
                summary.failed(),
                summary.total
            );
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
