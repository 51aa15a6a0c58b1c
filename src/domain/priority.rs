//! Ordering heuristic used to sequence moves.
//!
//! The score only decides *when* a file is moved, never *where*.

use super::FileEntry;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BIAS: i64 = 1000;
pub const DEFAULT_SMALL_EXTENSIONS: &[&str] = &["txt", "jpg", "jpeg", "png"];

/// Tunable constants behind [`PriorityPolicy::score`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityPolicy {
    /// Subtracted from the score of files with a common, usually small extension
    pub bias: i64,
    /// Extensions (no dot, matched case-insensitively) that receive the bias
    pub small_extensions: Vec<String>,
}

impl Default for PriorityPolicy {
    fn default() -> Self {
        Self {
            bias: DEFAULT_BIAS,
            small_extensions: DEFAULT_SMALL_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl PriorityPolicy {
    /// `size + path length`, minus the bias for common small file types.
    /// Lower scores are moved first.
    pub fn score(&self, entry: &FileEntry) -> i64 {
        let size = i64::try_from(entry.size).unwrap_or(i64::MAX);
        let path_len = i64::try_from(entry.path_len).unwrap_or(i64::MAX);
        let mut priority = size.saturating_add(path_len);

        if self.is_small_extension(&entry.extension) {
            priority = priority.saturating_sub(self.bias);
        }

        priority
    }

    fn is_small_extension(&self, extension: &str) -> bool {
        !extension.is_empty()
            && self
                .small_extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(extension))
    }

    /// Sorts ascending by score. The sort is stable, so equal scores keep
    /// their enumeration order.
    pub fn sort(&self, files: &mut [FileEntry]) {
        files.sort_by_cached_key(|entry| self.score(entry));
    }
}
