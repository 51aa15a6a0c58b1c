//! Filesystem capabilities and the move primitive built on top of them.
//!
//! The organizer never touches `std::fs` directly. Everything goes through
//! [`FileSystem`] so callers can substitute their own backend.

use crate::domain::{self, FileEntry};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Primitive filesystem operations the organizer depends on
pub trait FileSystem: Send + Sync {
    /// True if anything (file, directory, link) is present at `path`
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Regular files directly inside `dir`, in enumeration order
    fn list_files(&self, dir: &Path) -> io::Result<Vec<FileEntry>>;

    /// Creates a single directory level
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Same-volume move that never replaces an existing `to`.
    ///
    /// Must fail with [`io::ErrorKind::AlreadyExists`] when `to` is occupied,
    /// decided atomically by the filesystem rather than by an earlier check.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// [`FileSystem`] backed by the standard library
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<FileEntry>> {
        domain::discover_files(dir)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    /// Links `to` first, so an occupied destination fails with `AlreadyExists`
    /// and is left untouched, then unlinks `from`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::hard_link(from, to)?;
        if let Err(e) = fs::remove_file(from) {
            // undo the link so the file is not left in both places
            let _ = fs::remove_file(to);
            return Err(e);
        }
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Why a directory could not be prepared or a file could not be moved
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("{} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("could not create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("source file {} no longer exists", .0.display())]
    SourceMissing(PathBuf),

    #[error("destination {} already exists", .0.display())]
    DestinationExists(PathBuf),

    #[error("could not move to {}: {source}", destination.display())]
    Rename {
        destination: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Creates `path` if it is absent. An existing directory is a success.
///
/// Safe to race with another creator of the same directory.
pub fn ensure_directory(fs: &dyn FileSystem, path: &Path) -> Result<(), MoveError> {
    if fs.is_dir(path) {
        return Ok(());
    }
    if fs.exists(path) {
        return Err(MoveError::NotADirectory(path.to_path_buf()));
    }

    match fs.create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && fs.is_dir(path) => Ok(()),
        Err(source) => Err(MoveError::CreateDir {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Renames `source` to `destination` exactly once, never overwriting.
///
/// An occupied destination leaves the source where it is.
pub fn move_file(fs: &dyn FileSystem, source: &Path, destination: &Path) -> Result<(), MoveError> {
    if !fs.exists(source) {
        return Err(MoveError::SourceMissing(source.to_path_buf()));
    }
    if fs.exists(destination) {
        return Err(MoveError::DestinationExists(destination.to_path_buf()));
    }

    // the check above is advisory; the rename itself refuses to clobber
    fs.rename(source, destination).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => MoveError::DestinationExists(destination.to_path_buf()),
        io::ErrorKind::NotFound if !fs.exists(source) => {
            MoveError::SourceMissing(source.to_path_buf())
        }
        _ => MoveError::Rename {
            destination: destination.to_path_buf(),
            source: e,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    mod ensure_directory_tests {
        use super::*;

        #[test]
        fn test_creates_missing_directory() {
            let temp_dir = TempDir::new().unwrap();
            let target = temp_dir.path().join("A");

            ensure_directory(&StdFileSystem, &target).unwrap();

            assert!(target.is_dir());
        }

        #[test]
        fn test_existing_directory_is_noop() {
            let temp_dir = TempDir::new().unwrap();
            let target = temp_dir.path().join("A");
            fs::create_dir(&target).unwrap();
            fs::write(target.join("keep.txt"), b"x").unwrap();

            ensure_directory(&StdFileSystem, &target).unwrap();

            assert!(target.join("keep.txt").exists());
        }

        #[test]
        fn test_file_in_the_way_fails() {
            let temp_dir = TempDir::new().unwrap();
            let target = temp_dir.path().join("A");
            fs::write(&target, b"not a dir").unwrap();

            let err = ensure_directory(&StdFileSystem, &target).unwrap_err();

            assert!(matches!(err, MoveError::NotADirectory(_)));
        }

        #[test]
        fn test_missing_parent_fails() {
            let temp_dir = TempDir::new().unwrap();
            let target = temp_dir.path().join("missing").join("A");

            let err = ensure_directory(&StdFileSystem, &target).unwrap_err();

            assert!(matches!(err, MoveError::CreateDir { .. }));
        }
    }

    mod move_file_tests {
        use super::*;

        #[test]
        fn test_moves_file() {
            let temp_dir = TempDir::new().unwrap();
            let source = temp_dir.path().join("apple.txt");
            let destination = temp_dir.path().join("apple-moved.txt");
            fs::write(&source, b"order #1").unwrap();

            move_file(&StdFileSystem, &source, &destination).unwrap();

            assert!(!source.exists());
            assert_eq!(fs::read(&destination).unwrap(), b"order #1");
        }

        #[test]
        fn test_never_overwrites_destination() {
            let temp_dir = TempDir::new().unwrap();
            let source = temp_dir.path().join("a.txt");
            let destination = temp_dir.path().join("b.txt");
            fs::write(&source, b"new").unwrap();
            fs::write(&destination, b"old").unwrap();

            let err = move_file(&StdFileSystem, &source, &destination).unwrap_err();

            assert!(matches!(err, MoveError::DestinationExists(_)));
            assert_eq!(fs::read(&source).unwrap(), b"new");
            assert_eq!(fs::read(&destination).unwrap(), b"old");
        }

        /// Drops a file at the destination between the existence check and the rename
        struct LateArrival;

        impl FileSystem for LateArrival {
            fn exists(&self, path: &Path) -> bool {
                StdFileSystem.exists(path)
            }

            fn is_dir(&self, path: &Path) -> bool {
                StdFileSystem.is_dir(path)
            }

            fn list_files(&self, dir: &Path) -> io::Result<Vec<FileEntry>> {
                StdFileSystem.list_files(dir)
            }

            fn create_dir(&self, path: &Path) -> io::Result<()> {
                StdFileSystem.create_dir(path)
            }

            fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
                fs::write(to, b"precious")?;
                StdFileSystem.rename(from, to)
            }

            fn read_to_string(&self, path: &Path) -> io::Result<String> {
                StdFileSystem.read_to_string(path)
            }
        }

        #[test]
        fn test_destination_appearing_after_check_is_not_overwritten() {
            let temp_dir = TempDir::new().unwrap();
            let source = temp_dir.path().join("a.txt");
            let destination = temp_dir.path().join("b.txt");
            fs::write(&source, b"new").unwrap();

            let err = move_file(&LateArrival, &source, &destination).unwrap_err();

            assert!(matches!(err, MoveError::DestinationExists(_)));
            assert_eq!(fs::read(&source).unwrap(), b"new");
            assert_eq!(fs::read(&destination).unwrap(), b"precious");
        }

        #[test]
        fn test_std_rename_refuses_occupied_destination() {
            let temp_dir = TempDir::new().unwrap();
            let source = temp_dir.path().join("a.txt");
            let destination = temp_dir.path().join("b.txt");
            fs::write(&source, b"new").unwrap();
            fs::write(&destination, b"old").unwrap();

            let err = StdFileSystem.rename(&source, &destination).unwrap_err();

            assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
            assert_eq!(fs::read(&source).unwrap(), b"new");
            assert_eq!(fs::read(&destination).unwrap(), b"old");
        }

        #[test]
        fn test_missing_source() {
            let temp_dir = TempDir::new().unwrap();
            let source = temp_dir.path().join("gone.txt");
            let destination = temp_dir.path().join("there.txt");

            let err = move_file(&StdFileSystem, &source, &destination).unwrap_err();

            assert!(matches!(err, MoveError::SourceMissing(_)));
            assert!(!destination.exists());
        }

        #[test]
        fn test_missing_destination_parent_reports_rename_error() {
            let temp_dir = TempDir::new().unwrap();
            let source = temp_dir.path().join("a.txt");
            fs::write(&source, b"a").unwrap();
            let destination = temp_dir.path().join("nope").join("a.txt");

            let err = move_file(&StdFileSystem, &source, &destination).unwrap_err();

            assert!(matches!(err, MoveError::Rename { .. }));
            assert!(source.exists());
        }
    }
}
