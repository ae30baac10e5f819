//! Bounded-concurrency command execution for fanout.
//!
//! This crate runs one external command per target and collects the output:
//! - `ProcessRunner` - assembles a command line, spawns it and captures stdout
//! - `ResultSink` - the shared result file every task appends to
//! - `Engine` - dispatches tasks onto a bounded pool and signals completion
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fanout_models::TargetList;
//! use fanout_runtime::{Engine, OutputConfig, ResultSink, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::new("./probe.sh").with_max_concurrency(8);
//!     let engine = Engine::new(config)?;
//!
//!     let sink = Arc::new(ResultSink::open(&OutputConfig::default()).await?);
//!     let targets = TargetList::from_lines(["web01", "web02", "db01"]);
//!
//!     let summary = engine.run(targets, Arc::clone(&sink)).await?;
//!     sink.close().await?;
//!
//!     println!("{} of {} succeeded", summary.succeeded, summary.total);
//!     Ok(())
//! }
//! ```
//!
//! # Ordering
//!
//! Tasks are dispatched in input order but write their results in completion
//! order. Nothing in the result file ties a line back to its target.
//!
//! # Limitations
//!
//! There is no retry, timeout or cancellation. A process that never exits
//! holds its pool slot forever and the run does not complete.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod invoker;
pub mod pending;
pub mod sink;

pub use config::{OutputConfig, RunConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_OUTPUT_PATH};
pub use engine::{Engine, RunState, RunSummary, TaskFailure};
pub use error::{Result, RuntimeError};
pub use event::RunEvent;
pub use invoker::{CommandInvoker, CommandLine, ProcessRunner};
pub use pending::PendingCounter;
pub use sink::ResultSink;
