//! Application configuration.
//!
//! Resolves where histories are stored and carries the simulator
//! settings for a session.

use directories::ProjectDirs;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

use crate::errors::{AppError, ErrorKind};
use crate::history::{FileStore, HistoryStore, MemoryStore};
use crate::simulator::SimulatorConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "SPEEDLAB_DATA_DIR";

/// Platform data directory for history files.
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "speedlab", "speedlab")
        .map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf())
}

fn dirs_fallback() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    let mut p = PathBuf::from(home);
    p.push(".local");
    p.push("share");
    p.push("speedlab");
    p
}

/// Where histories live.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// JSON files in a directory.
    Files(PathBuf),
    /// In memory only, discarded on exit.
    Ephemeral(MemoryStore),
}

impl StorageConfig {
    /// Files in `data_dir`, or in [`default_data_dir`] when not given.
    pub fn files(data_dir: Option<PathBuf>) -> Self {
        StorageConfig::Files(data_dir.unwrap_or_else(default_data_dir))
    }

    pub fn ephemeral() -> Self {
        StorageConfig::Ephemeral(MemoryStore::new())
    }
}

/// Configuration for one invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// History storage.
    /// Default: files in the platform data directory
    pub storage: StorageConfig,

    /// Simulated speed test settings.
    pub simulator: SimulatorConfig,

    /// Seed for the speed signal; drawn from entropy when unset.
    /// Default: None
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::files(None),
            simulator: SimulatorConfig::default(),
            seed: None,
        }
    }
}

impl AppConfig {
    /// Reject settings that cannot work.
    pub fn validate(&self) -> Result<(), AppError> {
        if let StorageConfig::Files(dir) = &self.storage {
            if dir.exists() && !dir.is_dir() {
                return Err(AppError::config(format!(
                    "data directory {} is not a directory",
                    dir.display()
                ))
                .with_suggestion(format!(
                    "Pass --data-dir or set {} to a directory.",
                    DATA_DIR_ENV
                )));
            }
        }

        let sim = &self.simulator;
        if sim.tick_interval.is_zero() {
            return Err(AppError::config("tick interval must be positive"));
        }
        if sim.sample_capacity == 0 {
            return Err(AppError::config(
                "sample buffer capacity must be positive",
            ));
        }
        if sim.ping_min_ms > sim.ping_max_ms {
            return Err(AppError::config("ping range is empty"));
        }
        Ok(())
    }

    /// Open the history stored under `key`.
    pub fn open_history<T>(&self, key: &str) -> HistoryStore<T>
    where
        T: Serialize + DeserializeOwned,
    {
        match &self.storage {
            StorageConfig::Files(dir) => {
                debug!("Opening history '{}' in {}", key, dir.display());
                HistoryStore::open(key, FileStore::new(dir.clone()))
            }
            StorageConfig::Ephemeral(store) => {
                debug!("Opening in-memory history '{}'", key);
                HistoryStore::open(key, store.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::SPEED_TEST_HISTORY_KEY;
    use crate::results::SpeedTestResult;

    #[test]
    fn test_explicit_data_dir_wins() {
        let storage =
            StorageConfig::files(Some(PathBuf::from("/tmp/speedlab-test")));
        match storage {
            StorageConfig::Files(dir) => {
                assert_eq!(dir, PathBuf::from("/tmp/speedlab-test"))
            }
            StorageConfig::Ephemeral(_) => panic!("expected file storage"),
        }
    }

    #[test]
    fn test_default_data_dir_is_named_for_app() {
        let dir = default_data_dir();
        assert!(dir.to_string_lossy().to_lowercase().contains("speedlab"));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig {
            storage: StorageConfig::ephemeral(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_data_dir_must_be_a_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = AppConfig {
            storage: StorageConfig::files(Some(file.path().to_path_buf())),
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let mut config = AppConfig {
            storage: StorageConfig::ephemeral(),
            ..Default::default()
        };
        config.simulator.sample_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_histories_share_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig {
            storage: StorageConfig::files(Some(tmp.path().to_path_buf())),
            ..Default::default()
        };

        let mut writer: HistoryStore<SpeedTestResult> =
            config.open_history(SPEED_TEST_HISTORY_KEY);
        writer.append(SpeedTestResult::new(90.0, 40.0, 15.0)).unwrap();

        let reader: HistoryStore<SpeedTestResult> =
            config.open_history(SPEED_TEST_HISTORY_KEY);
        assert_eq!(reader.len(), 1);
        assert!(tmp.path().join("speedTestHistory.json").exists());
    }

    #[test]
    fn test_ephemeral_histories_share_memory() {
        let config = AppConfig {
            storage: StorageConfig::ephemeral(),
            ..Default::default()
        };

        let mut writer: HistoryStore<SpeedTestResult> =
            config.open_history(SPEED_TEST_HISTORY_KEY);
        writer.append(SpeedTestResult::new(90.0, 40.0, 15.0)).unwrap();

        let reader: HistoryStore<SpeedTestResult> =
            config.open_history(SPEED_TEST_HISTORY_KEY);
        assert_eq!(reader.items(), writer.items());
    }
}
