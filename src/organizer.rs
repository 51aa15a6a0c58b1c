//! Classify-and-move engine.
//!
//! Every operation follows the same skeleton: validate parameters, enumerate
//! the directory once, order the snapshot by [`PriorityPolicy`], pick zero or
//! one destination folder per file, and hand the moves to a worker pool that
//! lives only for this operation.

mod dispatch;

use crate::config::UserConfig;
use crate::domain::{
    FileEntry, FileFailure, Outcome, OutcomeStatus, PriorityPolicy, StrategyKind,
};
use crate::error::{Result, SortDirError};
use crate::fs::{FileSystem, StdFileSystem};
use crate::pool::DEFAULT_WORKERS;
use chrono::Utc;
use dispatch::{notify, Dispatch, Tally};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Receives progress notifications from a running operation.
///
/// Called from worker threads; implementations must not block for long.
pub trait Reporter: Send + Sync {
    fn file_moved(&self, _from: &Path, _to: &Path) {}

    fn file_failed(&self, _failure: &FileFailure) {}

    fn finished(&self, _outcome: &Outcome) {}
}

/// Reporter that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Cooperative cancellation flag shared by all tasks of an operation.
///
/// Checked by each task right before it moves its file. Moves already in
/// progress are not interrupted. The flag never resets, so a cancelled
/// [`Organizer`] stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One classify-and-move invocation with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Alphabetical {
        directory: PathBuf,
    },
    Keyword {
        directory: PathBuf,
        keyword: String,
    },
    Content {
        directory: PathBuf,
        keywords: Vec<String>,
    },
}

impl Request {
    pub fn strategy(&self) -> StrategyKind {
        match self {
            Request::Alphabetical { .. } => StrategyKind::Alphabetical,
            Request::Keyword { .. } => StrategyKind::Keyword,
            Request::Content { .. } => StrategyKind::Content,
        }
    }

    pub fn directory(&self) -> &Path {
        match self {
            Request::Alphabetical { directory }
            | Request::Keyword { directory, .. }
            | Request::Content { directory, .. } => directory,
        }
    }
}

/// Runs classify-and-move operations.
///
/// Holds only configuration; each call builds and tears down its own pool, so
/// one `Organizer` can serve concurrent operations on different directories.
pub struct Organizer {
    fs: Arc<dyn FileSystem>,
    workers: usize,
    priority: PriorityPolicy,
    reporter: Arc<dyn Reporter>,
    cancel: CancelToken,
}

impl Default for Organizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Organizer {
    pub fn new() -> Self {
        Self {
            fs: Arc::new(StdFileSystem),
            workers: DEFAULT_WORKERS,
            priority: PriorityPolicy::default(),
            reporter: Arc::new(NullReporter),
            cancel: CancelToken::new(),
        }
    }

    pub fn from_config(config: &UserConfig) -> Self {
        Self::new()
            .with_workers(config.workers)
            .with_priority(config.priority.clone())
    }

    /// Worker count for each operation's pool. Zero is rejected when an
    /// operation starts.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_priority(mut self, priority: PriorityPolicy) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Moves every file whose name starts with an ASCII letter into a folder
    /// named after that letter, uppercased. Other files stay where they are.
    pub fn organize_alphabetically(&self, directory: impl AsRef<Path>) -> Outcome {
        self.run(&Request::Alphabetical {
            directory: directory.as_ref().to_path_buf(),
        })
    }

    /// Moves every file whose name contains `keyword` into the folder `keyword`.
    pub fn organize_by_keyword(&self, directory: impl AsRef<Path>, keyword: &str) -> Outcome {
        self.run(&Request::Keyword {
            directory: directory.as_ref().to_path_buf(),
            keyword: keyword.to_string(),
        })
    }

    /// Moves every text file into the folder of the first keyword its content contains.
    pub fn organize_by_content(
        &self,
        directory: impl AsRef<Path>,
        keywords: &[String],
    ) -> Outcome {
        self.run(&Request::Content {
            directory: directory.as_ref().to_path_buf(),
            keywords: keywords.to_vec(),
        })
    }

    /// Runs one operation to completion and reports its outcome.
    pub fn run(&self, request: &Request) -> Outcome {
        let strategy = request.strategy();
        let directory = request.directory();
        let started_at = Utc::now();
        info!(%strategy, directory = %directory.display(), "organize started");

        let (status, tally, fatal) = self.settle(strategy, self.execute(request));

        let outcome = Outcome {
            strategy,
            directory: directory.to_path_buf(),
            status,
            moved: tally.moved,
            skipped: tally.skipped,
            failures: tally.failures,
            fatal,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            %strategy,
            status = ?outcome.status,
            moved = outcome.moved,
            skipped = outcome.skipped,
            failed = outcome.failures.len(),
            "organize finished"
        );
        notify("finished", || self.reporter.finished(&outcome));
        outcome
    }

    /// Status, tally and fatal message for the way an execution ended
    fn settle(
        &self,
        strategy: StrategyKind,
        execution: Result<Execution>,
    ) -> (OutcomeStatus, Tally, Option<String>) {
        match execution {
            Ok(Execution::Empty) => (OutcomeStatus::EmptyResult, Tally::default(), None),
            Ok(Execution::Completed(tally)) if self.cancel.is_cancelled() => (
                OutcomeStatus::Failed,
                tally,
                Some("operation cancelled".to_string()),
            ),
            Ok(Execution::Completed(tally)) => {
                let status = if tally.failures.is_empty() {
                    OutcomeStatus::Success
                } else {
                    OutcomeStatus::Failed
                };
                (status, tally, None)
            }
            Ok(Execution::Aborted(tally, err)) => {
                warn!(%strategy, error = %err, "organize aborted after submitting work");
                (OutcomeStatus::Failed, tally, Some(err.to_string()))
            }
            Err(err) => {
                warn!(%strategy, error = %err, "organize aborted");
                (OutcomeStatus::Failed, Tally::default(), Some(err.to_string()))
            }
        }
    }

    fn execute(&self, request: &Request) -> Result<Execution> {
        self.validate(request)?;

        let directory = request.directory();
        let mut files = self
            .fs
            .list_files(directory)
            .map_err(|source| SortDirError::Enumeration {
                path: directory.to_path_buf(),
                source,
            })?;

        if files.is_empty() {
            return Ok(Execution::Empty);
        }

        self.priority.sort(&mut files);

        let mut dispatch = Dispatch::new(
            directory,
            self.workers,
            Arc::clone(&self.fs),
            self.cancel.clone(),
            Arc::clone(&self.reporter),
        )?;

        let submitted = match request {
            Request::Alphabetical { .. } => alphabetical(&mut dispatch, files),
            Request::Keyword { keyword, .. } => by_keyword(&mut dispatch, &files, keyword),
            Request::Content { keywords, .. } => {
                by_content(&mut dispatch, self.fs.as_ref(), &files, keywords)
            }
        };

        // queued tasks still run even when a later submission was rejected
        let tally = dispatch.finish();
        Ok(match submitted {
            Ok(()) => Execution::Completed(tally),
            Err(err) => Execution::Aborted(tally, err),
        })
    }

    fn validate(&self, request: &Request) -> Result<()> {
        if self.workers == 0 {
            return Err(SortDirError::InvalidParameter(
                "worker count must be at least 1".to_string(),
            ));
        }

        let directory = request.directory();
        if directory.as_os_str().is_empty() {
            return Err(SortDirError::InvalidParameter(
                "directory is empty".to_string(),
            ));
        }
        if !self.fs.exists(directory) {
            return Err(SortDirError::InvalidParameter(format!(
                "directory {} does not exist",
                directory.display()
            )));
        }
        if !self.fs.is_dir(directory) {
            return Err(SortDirError::InvalidParameter(format!(
                "{} is not a directory",
                directory.display()
            )));
        }

        match request {
            Request::Alphabetical { .. } => Ok(()),
            Request::Keyword { keyword, .. } => validate_folder_name("keyword", keyword),
            Request::Content { keywords, .. } => {
                if keywords.is_empty() {
                    return Err(SortDirError::InvalidParameter(
                        "keyword list is empty".to_string(),
                    ));
                }
                keywords
                    .iter()
                    .try_for_each(|k| validate_folder_name("keyword", k))
            }
        }
    }
}

enum Execution {
    Empty,
    Completed(Tally),
    Aborted(Tally, SortDirError),
}

/// A keyword doubles as a folder name, so it must name exactly one path component.
pub fn validate_folder_name(label: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(SortDirError::InvalidParameter(format!("{label} is empty")));
    }
    let separator = |c: char| matches!(c, '/' | '\\' | '\0');
    if value == "." || value == ".." || value.contains(separator) {
        return Err(SortDirError::InvalidParameter(format!(
            "{label} '{value}' cannot be used as a folder name"
        )));
    }
    Ok(())
}

/// Destination letter for a file name, or `None` when it does not start with `A`-`Z`
/// in either case.
pub fn alphabetical_folder(name: &str) -> Option<char> {
    let first = name.chars().next()?.to_ascii_uppercase();
    first.is_ascii_uppercase().then_some(first)
}

/// Index of the first keyword, in declaration order, found in `content`
pub fn first_matching_keyword(content: &str, keywords: &[String]) -> Option<usize> {
    keywords.iter().position(|k| content.contains(k.as_str()))
}

fn alphabetical(dispatch: &mut Dispatch<'_>, files: Vec<FileEntry>) -> Result<()> {
    // BTreeMap walks letters A..Z; each bucket keeps priority order
    let mut by_letter: BTreeMap<char, Vec<FileEntry>> = BTreeMap::new();
    for entry in files {
        if let Some(letter) = alphabetical_folder(&entry.name) {
            by_letter.entry(letter).or_default().push(entry);
        }
    }

    for (letter, entries) in by_letter {
        let folder = letter.to_string();
        for entry in &entries {
            dispatch.submit(entry, &folder)?;
        }
    }
    Ok(())
}

fn by_keyword(dispatch: &mut Dispatch<'_>, files: &[FileEntry], keyword: &str) -> Result<()> {
    let prepared = dispatch.prepare(keyword);

    let mut matched = false;
    for entry in files.iter().filter(|e| e.name.contains(keyword)) {
        matched = true;
        dispatch.submit(entry, keyword)?;
    }

    // nothing to attach the folder failure to, so report the folder itself
    if let (Err(reason), false) = (prepared, matched) {
        let folder = dispatch.folder_path(keyword);
        dispatch.fail(&folder, reason);
    }
    Ok(())
}

fn by_content(
    dispatch: &mut Dispatch<'_>,
    fs: &dyn FileSystem,
    files: &[FileEntry],
    keywords: &[String],
) -> Result<()> {
    for entry in files {
        let content = match fs.read_to_string(&entry.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                dispatch.fail(&entry.path, "content is not valid UTF-8 text");
                continue;
            }
            Err(e) => {
                dispatch.fail(&entry.path, format!("could not read content: {e}"));
                continue;
            }
        };

        if let Some(index) = first_matching_keyword(&content, keywords) {
            dispatch.submit(entry, &keywords[index])?;
        }
    }
    Ok(())
}

/// [`Organizer::organize_alphabetically`] with default settings
pub fn organize_alphabetically(directory: impl AsRef<Path>) -> Outcome {
    Organizer::new().organize_alphabetically(directory)
}

/// [`Organizer::organize_by_keyword`] with default settings
pub fn organize_by_keyword(directory: impl AsRef<Path>, keyword: &str) -> Outcome {
    Organizer::new().organize_by_keyword(directory, keyword)
}

/// [`Organizer::organize_by_content`] with default settings
pub fn organize_by_content(directory: impl AsRef<Path>, keywords: &[String]) -> Outcome {
    Organizer::new().organize_by_content(directory, keywords)
}
