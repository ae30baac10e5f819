//! Run command: load targets, open the result file, drive the engine.

use std::sync::Arc;

use fanout_models::TargetList;
use fanout_runtime::{Engine, ResultSink, RunSummary};
use tracing::{info, warn};

use crate::cli::Cli;

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Executes a full run described by the parsed command line.
///
/// Configuration, target-file and result-file errors are returned before
/// any task is dispatched.
pub async fn execute(cli: &Cli) -> Result<RunSummary> {
    let config = cli.run_config();
    let output = cli.output_config();

    let engine = Engine::new(config)?;
    let targets = TargetList::load(&cli.targets_path())?;
    let sink = Arc::new(ResultSink::open(&output).await?);

    info!(
        targets = targets.len(),
        output = %output.path.display(),
        append = output.append,
        "loaded targets"
    );

    let summary = engine.run(targets, Arc::clone(&sink)).await?;
    sink.close().await?;

    for failure in &summary.failures {
        warn!(target_name = %failure.target, error = %failure.error, "target failed");
    }
    info!(
        "processed {} targets, {} failed -> {}",
        summary.total,
        summary.failed(),
        sink.path().display()
    );

    Ok(summary)
}
