//! Sortdir - a concurrent directory organizer
//!
//! This crate classifies the files of one directory by first letter, by a
//! keyword in their name, or by keywords in their content, and moves them into
//! subfolders using a per-operation worker pool.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs;
pub mod logging;
pub mod organizer;
pub mod pool;

// Re-export primary types for convenience
pub use config::UserConfig;
pub use domain::{
    discover_files, FileEntry, FileFailure, Outcome, OutcomeStatus, PriorityPolicy, StrategyKind,
};
pub use error::{Result, SortDirError};
pub use fs::{FileSystem, StdFileSystem};
pub use organizer::{
    organize_alphabetically, organize_by_content, organize_by_keyword, CancelToken, NullReporter,
    Organizer, Reporter, Request,
};
pub use pool::WorkerPool;
