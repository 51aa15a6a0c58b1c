//! Per-operation plumbing between a strategy and its worker pool.
//!
//! A [`Dispatch`] lives exactly as long as one operation. It prepares each
//! destination folder at most once, always before the first task aimed at that
//! folder is queued, hands [`MoveTask`]s to the pool, and finally drains the
//! pool and folds every task report into a [`Tally`].

use super::{CancelToken, Reporter};
use crate::domain::{FileEntry, FileFailure};
use crate::error::Result;
use crate::fs::{self, FileSystem, MoveError};
use crate::pool::{panic_message, WorkerPool};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// How a single move ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TaskResult {
    Moved,
    Skipped(String),
    Failed(String),
}

#[derive(Debug)]
pub(crate) struct TaskReport {
    seq: usize,
    source: PathBuf,
    result: TaskResult,
}

/// One file move, carried by value into a worker.
///
/// The payload is immutable; the only thing a task shares is the channel it
/// reports through.
pub(crate) struct MoveTask {
    seq: usize,
    source: PathBuf,
    destination: PathBuf,
    fs: Arc<dyn FileSystem>,
    cancel: CancelToken,
    reporter: Arc<dyn Reporter>,
    sink: Sender<TaskReport>,
}

impl MoveTask {
    pub(crate) fn run(self) {
        let result = if self.cancel.is_cancelled() {
            TaskResult::Skipped("operation cancelled".to_string())
        } else {
            let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
                fs::move_file(self.fs.as_ref(), &self.source, &self.destination)
            }));

            match attempt {
                Ok(Ok(())) => TaskResult::Moved,
                Ok(Err(MoveError::SourceMissing(_))) => {
                    TaskResult::Skipped("source no longer present".to_string())
                }
                Ok(Err(e)) => TaskResult::Failed(e.to_string()),
                Err(payload) => TaskResult::Failed(format!(
                    "move panicked: {}",
                    panic_message(payload.as_ref())
                )),
            }
        };

        match &result {
            TaskResult::Moved => {
                debug!(
                    source = %self.source.display(),
                    destination = %self.destination.display(),
                    "moved file"
                );
                notify("file_moved", || {
                    self.reporter.file_moved(&self.source, &self.destination)
                });
            }
            TaskResult::Skipped(reason) => {
                debug!(source = %self.source.display(), %reason, "skipped file");
            }
            TaskResult::Failed(reason) => {
                warn!(source = %self.source.display(), %reason, "failed to move file");
                let failure = FileFailure::new(&self.source, reason.clone());
                notify("file_failed", || self.reporter.file_failed(&failure));
            }
        }

        // receiver outlives the pool; a closed channel means the tally is gone anyway
        let _ = self.sink.send(TaskReport {
            seq: self.seq,
            source: self.source,
            result,
        });
    }
}

/// Runs a [`Reporter`] callback, containing any panic it raises.
///
/// The panic is logged and swallowed; the task still sends its report.
pub(crate) fn notify(callback: &str, f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        error!(callback, panic = %panic_message(payload.as_ref()), "reporter panicked");
    }
}

/// Aggregated result of all tasks of one operation
#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub moved: usize,
    pub skipped: usize,
    pub failures: Vec<FileFailure>,
}

pub(crate) struct Dispatch<'a> {
    base: &'a Path,
    fs: Arc<dyn FileSystem>,
    cancel: CancelToken,
    reporter: Arc<dyn Reporter>,
    pool: WorkerPool,
    sink: Sender<TaskReport>,
    reports: Receiver<TaskReport>,
    /// Folder name -> prepared path, or the reason it could not be prepared
    folders: HashMap<String, std::result::Result<PathBuf, String>>,
    /// Failures recorded on the submitting side, keyed by sequence number
    local_failures: Vec<(usize, FileFailure)>,
    next_seq: usize,
}

impl<'a> Dispatch<'a> {
    pub(crate) fn new(
        base: &'a Path,
        workers: usize,
        fs: Arc<dyn FileSystem>,
        cancel: CancelToken,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self> {
        let pool = WorkerPool::new(workers)?;
        let (sink, reports) = unbounded();

        Ok(Self {
            base,
            fs,
            cancel,
            reporter,
            pool,
            sink,
            reports,
            folders: HashMap::new(),
            local_failures: Vec::new(),
            next_seq: 0,
        })
    }

    pub(crate) fn folder_path(&self, folder: &str) -> PathBuf {
        self.base.join(folder)
    }

    /// Ensures `base/folder` exists, touching the filesystem only the first time.
    pub(crate) fn prepare(&mut self, folder: &str) -> std::result::Result<PathBuf, String> {
        if let Some(prepared) = self.folders.get(folder) {
            return prepared.clone();
        }

        let path = self.folder_path(folder);
        let prepared = match fs::ensure_directory(self.fs.as_ref(), &path) {
            Ok(()) => {
                debug!(folder = %path.display(), "destination folder ready");
                Ok(path)
            }
            Err(e) => {
                warn!(folder = %path.display(), error = %e, "destination folder unavailable");
                Err(e.to_string())
            }
        };

        self.folders.insert(folder.to_string(), prepared.clone());
        prepared
    }

    /// Queues the move of `entry` into `folder`, preparing the folder first.
    ///
    /// A folder that cannot be prepared turns into a per-file failure. Only a
    /// rejected submission is returned as an error.
    pub(crate) fn submit(&mut self, entry: &FileEntry, folder: &str) -> Result<()> {
        let target_dir = match self.prepare(folder) {
            Ok(path) => path,
            Err(reason) => {
                self.fail(
                    &entry.path,
                    format!("destination folder unavailable: {reason}"),
                );
                return Ok(());
            }
        };

        let Some(file_name) = entry.path.file_name() else {
            self.fail(&entry.path, "path has no file name");
            return Ok(());
        };

        let task = MoveTask {
            seq: self.take_seq(),
            source: entry.path.clone(),
            destination: target_dir.join(file_name),
            fs: Arc::clone(&self.fs),
            cancel: self.cancel.clone(),
            reporter: Arc::clone(&self.reporter),
            sink: self.sink.clone(),
        };

        self.pool.submit(move || task.run())
    }

    /// Records a failure detected before any task was created.
    pub(crate) fn fail(&mut self, path: &Path, reason: impl Into<String>) {
        let failure = FileFailure::new(path, reason);
        warn!(path = %failure.path.display(), reason = %failure.reason, "file not processed");
        notify("file_failed", || self.reporter.file_failed(&failure));

        let seq = self.take_seq();
        self.local_failures.push((seq, failure));
    }

    /// Waits for the pool to drain and collects every report.
    pub(crate) fn finish(self) -> Tally {
        let Dispatch {
            mut pool,
            sink,
            reports,
            local_failures,
            ..
        } = self;

        pool.shutdown();
        drop(sink);

        let mut tally = Tally::default();
        let mut failures = local_failures;

        for report in reports.try_iter() {
            match report.result {
                TaskResult::Moved => tally.moved += 1,
                TaskResult::Skipped(_) => tally.skipped += 1,
                TaskResult::Failed(reason) => {
                    failures.push((report.seq, FileFailure::new(report.source, reason)));
                }
            }
        }

        failures.sort_by_key(|(seq, _)| *seq);
        tally.failures = failures.into_iter().map(|(_, f)| f).collect();
        tally
    }

    fn take_seq(&mut self) -> usize {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}
