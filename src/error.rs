//! Error types shared across the crate

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an operation or a library call outright.
///
/// Per-file problems never surface here; they are collected into the
/// operation's [`Outcome`](crate::domain::Outcome) instead.
#[derive(Debug, Error)]
pub enum SortDirError {
    /// A directory or keyword argument was rejected before any I/O happened
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The directory could not be listed after it was validated
    #[error("failed to read directory {}: {source}", path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A task was submitted to a pool that had already begun shutting down
    #[error("worker pool is shut down; task rejected")]
    PoolShutDown,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to install logger: {0}")]
    Logging(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, SortDirError>;
