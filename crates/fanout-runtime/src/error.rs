//! Error types for the runtime crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The external command could not be started.
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or waiting on a child process failed.
    #[error("process io error for '{command}': {source}")]
    Process {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The result file could not be opened or written.
    #[error("result sink error on {path}: {source}")]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Write attempted after the sink was closed.
    #[error("result sink already closed")]
    SinkClosed,

    /// The engine has already been run.
    #[error("engine already run")]
    AlreadyRun,
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
