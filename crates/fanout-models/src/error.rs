//! Error types for target loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a target list.
#[derive(Debug, Error)]
pub enum TargetError {
    /// The target file could not be read.
    #[error("failed to read target file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for target operations.
pub type Result<T> = std::result::Result<T, TargetError>;
