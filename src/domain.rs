//! Core data model: file snapshots, enumeration and operation outcomes

pub mod priority;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use priority::PriorityPolicy;

/// Immutable snapshot of one regular file taken during a single enumeration pass.
///
/// Nothing in an operation re-reads these fields from disk, so concurrent moves of
/// sibling files cannot change how this one is classified or ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    /// Length of the full path in characters
    pub path_len: usize,
    /// Extension without the leading dot, as it appears on disk
    pub extension: String,
}

impl FileEntry {
    /// Builds an entry from a path and an already captured size.
    pub fn new(path: PathBuf, size: u64) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path_len = path.to_string_lossy().chars().count();

        FileEntry {
            path,
            name,
            size,
            path_len,
            extension,
        }
    }

    /// Stats `path` and captures a snapshot of it.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self::new(path.to_path_buf(), metadata.len()))
    }
}

/// Lists the regular files directly inside `dir_path`.
///
/// # Behavior
/// - Does not recurse into subdirectories
/// - Excludes directories, symbolic links and special files
/// - Keeps the order reported by the operating system
/// - Any failure to read the directory itself aborts the whole listing, so callers
///   never act on a partial file list
/// - An entry that disappears between listing and stat is simply left out
pub fn discover_files(dir_path: &Path) -> io::Result<Vec<FileEntry>> {
    let mut files = Vec::new();

    for entry_result in fs::read_dir(dir_path)? {
        let entry = entry_result?;
        let path = entry.path();

        // symlink_metadata so links are never followed into other trees
        let metadata = match fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };

        if !metadata.file_type().is_file() {
            continue;
        }

        files.push(FileEntry::new(path, metadata.len()));
    }

    Ok(files)
}

/// The three classification policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Alphabetical,
    Keyword,
    Content,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StrategyKind::Alphabetical => "alphabetical",
            StrategyKind::Keyword => "keyword",
            StrategyKind::Content => "content",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    /// The directory held no regular files
    EmptyResult,
    Failed,
}

/// One file that could not be processed, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl FileFailure {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Final report of one classify-and-move operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub strategy: StrategyKind,
    pub directory: PathBuf,
    pub status: OutcomeStatus,
    /// Files successfully relocated
    pub moved: usize,
    /// Files that vanished before their move ran, or were cancelled
    pub skipped: usize,
    /// Per-file failures in submission order
    pub failures: Vec<FileFailure>,
    /// Operation-level error that stopped the run early
    pub fatal: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    /// Renders the single human-readable message shown to the user.
    pub fn message(&self) -> String {
        match self.status {
            OutcomeStatus::Success => match self.strategy {
                StrategyKind::Alphabetical => {
                    format!("Files organized alphabetically! ({} moved)", self.moved)
                }
                StrategyKind::Keyword => {
                    format!("Files organized by keyword! ({} moved)", self.moved)
                }
                StrategyKind::Content => {
                    format!("Files organized by content! ({} moved)", self.moved)
                }
            },
            OutcomeStatus::EmptyResult => {
                format!("No files found in {}.", self.directory.display())
            }
            OutcomeStatus::Failed => {
                let mut message = match &self.fatal {
                    Some(fatal) => format!("Organizing by {} failed: {}", self.strategy, fatal),
                    None => format!(
                        "Organizing by {} finished with {} error(s); {} file(s) moved.",
                        self.strategy,
                        self.failures.len(),
                        self.moved
                    ),
                };
                for failure in &self.failures {
                    message.push_str(&format!(
                        "\n  {}: {}",
                        failure.path.display(),
                        failure.reason
                    ));
                }
                message
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod file_entry_tests {
        use super::*;
        use tempfile::TempDir;

        #[test]
        fn test_file_entry_captures_snapshot() {
            let temp_dir = TempDir::new().unwrap();
            let path = temp_dir.path().join("notes.txt");
            fs::write(&path, b"test content").unwrap();

            let entry = FileEntry::from_path(&path).unwrap();

            assert_eq!(entry.path, path);
            assert_eq!(entry.name, "notes.txt");
            assert_eq!(entry.size, 12);
            assert_eq!(entry.extension, "txt");
            assert_eq!(entry.path_len, path.to_string_lossy().chars().count());
        }

        #[test]
        fn test_file_entry_without_extension() {
            let entry = FileEntry::new(PathBuf::from("/data/Makefile"), 3);
            assert_eq!(entry.name, "Makefile");
            assert_eq!(entry.extension, "");
        }

        #[test]
        fn test_file_entry_nonexistent_file() {
            let result = FileEntry::from_path(Path::new("/nonexistent/file.txt"));
            assert!(result.is_err());
        }
    }

    mod discovery_tests {
        use super::*;
        use tempfile::TempDir;

        #[test]
        fn test_discover_files_in_directory() {
            let temp_dir = TempDir::new().unwrap();
            let dir_path = temp_dir.path();

            fs::write(dir_path.join("file1.txt"), b"content1").unwrap();
            fs::write(dir_path.join("file2.rs"), b"content2").unwrap();
            fs::write(dir_path.join(".hidden"), b"secret").unwrap();

            let files = discover_files(dir_path).unwrap();

            assert_eq!(files.len(), 3);
            let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
            assert!(names.contains(&"file1.txt"));
            assert!(names.contains(&"file2.rs"));
            assert!(names.contains(&".hidden"));
        }

        #[test]
        fn test_discover_files_skips_directories() {
            let temp_dir = TempDir::new().unwrap();
            let dir_path = temp_dir.path();

            fs::write(dir_path.join("file.txt"), b"content").unwrap();
            fs::create_dir(dir_path.join("subdir")).unwrap();
            fs::write(dir_path.join("subdir").join("nested.txt"), b"nested").unwrap();

            let files = discover_files(dir_path).unwrap();

            assert_eq!(files.len(), 1);
            assert_eq!(files[0].name, "file.txt");
        }

        #[cfg(unix)]
        #[test]
        fn test_discover_files_skips_symlinks() {
            let temp_dir = TempDir::new().unwrap();
            let dir_path = temp_dir.path();

            fs::write(dir_path.join("real.txt"), b"content").unwrap();
            std::os::unix::fs::symlink(dir_path.join("real.txt"), dir_path.join("link.txt"))
                .unwrap();

            let files = discover_files(dir_path).unwrap();

            assert_eq!(files.len(), 1);
            assert_eq!(files[0].name, "real.txt");
        }

        #[test]
        fn test_discover_files_empty_directory() {
            let temp_dir = TempDir::new().unwrap();
            assert!(discover_files(temp_dir.path()).unwrap().is_empty());
        }

        #[test]
        fn test_discover_files_nonexistent_directory() {
            assert!(discover_files(Path::new("/nonexistent/directory")).is_err());
        }
    }

    mod outcome_tests {
        use super::*;

        fn outcome(status: OutcomeStatus) -> Outcome {
            Outcome {
                strategy: StrategyKind::Keyword,
                directory: PathBuf::from("/data"),
                status,
                moved: 2,
                skipped: 0,
                failures: Vec::new(),
                fatal: None,
                started_at: Utc::now(),
                finished_at: Utc::now(),
            }
        }

        #[test]
        fn test_success_message() {
            let outcome = outcome(OutcomeStatus::Success);
            assert!(outcome.is_success());
            assert_eq!(outcome.message(), "Files organized by keyword! (2 moved)");
        }

        #[test]
        fn test_empty_message() {
            let outcome = outcome(OutcomeStatus::EmptyResult);
            assert!(outcome.message().starts_with("No files found"));
        }

        #[test]
        fn test_failure_message_lists_every_file() {
            let mut outcome = outcome(OutcomeStatus::Failed);
            outcome.failures = vec![
                FileFailure::new("/data/a.txt", "destination already exists"),
                FileFailure::new("/data/b.txt", "permission denied"),
            ];

            let message = outcome.message();
            assert!(message.contains("2 error(s)"));
            assert!(message.contains("/data/a.txt: destination already exists"));
            assert!(message.contains("/data/b.txt: permission denied"));
        }

        #[test]
        fn test_fatal_message() {
            let mut outcome = outcome(OutcomeStatus::Failed);
            outcome.fatal = Some("invalid parameter: keyword is empty".to_string());
            assert_eq!(
                outcome.message(),
                "Organizing by keyword failed: invalid parameter: keyword is empty"
            );
        }

        #[test]
        fn test_outcome_serializes_status_in_snake_case() {
            let json = serde_json::to_string(&outcome(OutcomeStatus::EmptyResult)).unwrap();
            assert!(json.contains("\"status\":\"empty_result\""));
            assert!(json.contains("\"strategy\":\"keyword\""));
        }
    }
}
