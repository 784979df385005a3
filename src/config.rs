//! Global configuration parsing and validation.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// Post-transmission disposal policy for files found during a poll.
#[derive(Debug, Copy, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PollingPolicy {
    /// Delete the file from disk after successful transmission.
    Delete,
    /// Move the file into a configured subfolder after successful transmission.
    Move,
}

/// Per-folder polling configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FolderConfig {
    /// Unique name identifying this folder in the configuration.
    pub folder_name: String,
    /// Absolute path of the folder on disk.
    pub path: PathBuf,
    /// Whether this folder participates in polling.
    #[serde(default)]
    pub polling: bool,
    /// Disposal policy applied after a file has been transmitted.
    #[serde(default)]
    pub polling_type: Option<PollingPolicy>,
    /// Destination subfolder (relative to `path`) for the `move` policy.
    #[serde(default)]
    pub move_to_folder: Option<String>,
    /// Webhook endpoint that receives this folder's files.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Whether to include files one subdirectory level deep.
    #[serde(default)]
    pub recursive: bool,
    /// Whether moving a file may overwrite an existing destination file.
    #[serde(default)]
    pub allow_overwrite: bool,
}

fn default_instance_name() -> String {
    "folder-courier".into()
}

fn default_polling_interval_seconds() -> u64 {
    60
}

fn default_startup_delay_seconds() -> u64 {
    10
}

fn default_max_parallel_folders() -> usize {
    10
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Human-readable instance name attached to the root tracing span.
    #[serde(default = "default_instance_name")]
    pub instance_name: String,
    /// Interval between successive polls of the same folder.
    #[serde(default = "default_polling_interval_seconds")]
    pub polling_interval_seconds: u64,
    /// Delay before the first sweep after process start.
    #[serde(default = "default_startup_delay_seconds")]
    pub startup_delay_seconds: u64,
    /// Maximum number of folders processed concurrently within one cycle.
    #[serde(default = "default_max_parallel_folders")]
    pub max_parallel_folders: usize,
    /// Configured folders, polling-enabled or not.
    #[serde(default, rename = "folder")]
    pub folders: Vec<FolderConfig>,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Interval between successive polls of the same folder.
    #[must_use]
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_seconds)
    }

    /// Delay before the first sweep after process start.
    #[must_use]
    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_seconds)
    }

    /// Folders that currently have polling enabled.
    #[must_use]
    pub fn folders_to_poll(&self) -> Vec<FolderConfig> {
        self.folders.iter().filter(|f| f.polling).cloned().collect()
    }

    /// Look up a folder by its configured name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no folder with that name exists.
    pub fn folder_by_name(&self, folder_name: &str) -> Result<FolderConfig> {
        self.folders
            .iter()
            .find(|f| f.folder_name == folder_name)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("folder {folder_name} does not exist in the config"))
            })
    }

    fn validate(&self) -> Result<()> {
        if self.polling_interval_seconds == 0 {
            return Err(AppError::Config(
                "polling_interval_seconds must be greater than zero".into(),
            ));
        }

        if self.max_parallel_folders == 0 {
            return Err(AppError::Config(
                "max_parallel_folders must be greater than zero".into(),
            ));
        }

        let mut seen = HashSet::new();
        for folder in &self.folders {
            if folder.folder_name.is_empty() {
                return Err(AppError::Config("folder_name must not be empty".into()));
            }
            if !seen.insert(folder.folder_name.as_str()) {
                return Err(AppError::Config(format!(
                    "folder {} is configured more than once",
                    folder.folder_name
                )));
            }
            if folder.polling {
                folder.validate_polling()?;
            }
        }

        Ok(())
    }
}

impl FolderConfig {
    /// Webhook URL, required when polling is enabled.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if no webhook URL is configured.
    pub fn webhook_url(&self) -> Result<&str> {
        self.webhook_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "folder {} has no webhook url configured",
                    self.folder_name
                ))
            })
    }

    /// Disposal policy, required for every transmitted file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if no policy is configured.
    pub fn policy(&self) -> Result<PollingPolicy> {
        self.polling_type.ok_or_else(|| {
            AppError::Config(format!(
                "folder {} has no polling type configured, processing impossible",
                self.folder_name
            ))
        })
    }

    fn validate_polling(&self) -> Result<()> {
        self.webhook_url()?;

        // The move destination lives inside the folder path. Combined with
        // recursive listing the destination would be re-scanned on the next
        // cycle and every moved file re-sent forever.
        if self.recursive && self.polling_type == Some(PollingPolicy::Move) {
            return Err(AppError::Config(format!(
                "folder {} cannot combine recursive polling with the move policy",
                self.folder_name
            )));
        }

        Ok(())
    }
}
