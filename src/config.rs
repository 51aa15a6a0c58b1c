//! User configuration and preferences

use crate::domain::PriorityPolicy;
use crate::error::{Result, SortDirError};
use crate::pool::DEFAULT_WORKERS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Worker threads per operation
    pub workers: usize,
    /// Ordering heuristic constants
    pub priority: PriorityPolicy,
    /// Print outcomes as JSON instead of text
    pub json_output: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            priority: PriorityPolicy::default(),
            json_output: false,
        }
    }
}

impl UserConfig {
    /// Get the config file path (~/.config/sortdir/config.json)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sortdir").join("config.json"))
    }

    /// Load config from the default location, or defaults if there is no file
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok_or_else(|| {
            SortDirError::Config("Could not determine config directory".to_string())
        })?;
        Self::load_from(&path)
    }

    /// Load config from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            SortDirError::Config(format!("Failed to read config file: {}", e))
        })?;

        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            SortDirError::Config(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or_else(|| {
            SortDirError::Config("Could not determine config directory".to_string())
        })?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SortDirError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            SortDirError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, contents).map_err(|e| {
            SortDirError::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(SortDirError::Config(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = UserConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.priority.bias, 1000);
        assert!(config.priority.small_extensions.contains(&"png".to_string()));
        assert!(!config.json_output);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = UserConfig::load_from(&temp_dir.path().join("config.json")).unwrap();
        assert_eq!(config, UserConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");
        let config = UserConfig {
            workers: 8,
            priority: PriorityPolicy {
                bias: 50,
                small_extensions: vec!["md".to_string()],
            },
            json_output: true,
        };

        config.save_to(&path).unwrap();
        let loaded = UserConfig::load_from(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{ "workers": 2, "priority": { "bias": 10 } }"#).unwrap();

        let config = UserConfig::load_from(&path).unwrap();

        assert_eq!(config.workers, 2);
        assert_eq!(config.priority.bias, 10);
        assert_eq!(
            config.priority.small_extensions,
            PriorityPolicy::default().small_extensions
        );
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        let err = UserConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, SortDirError::Config(_)));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{ "workers": 0 }"#).unwrap();

        let err = UserConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("workers must be at least 1"));
    }
}
