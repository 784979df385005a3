//! Read-only access to the folder configuration store.
//!
//! The polling core never mutates configuration; it reads through the
//! [`FolderRegistry`] trait once per cycle. The production implementation
//! re-reads the TOML file on every call so interval or folder changes take
//! effect on the next cycle without a restart.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use crate::config::{FolderConfig, GlobalConfig};
use crate::{AppError, Result};

/// Read-only view over the folder configuration store.
pub trait FolderRegistry: Send + Sync {
    /// All folders that currently have polling enabled.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`](crate::AppError::Config) if the store
    /// cannot be read.
    fn folders_to_poll(&self)
        -> Pin<Box<dyn Future<Output = Result<Vec<FolderConfig>>> + Send + '_>>;

    /// Resolve a single folder by its configured name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`](crate::AppError::NotFound) if no folder
    /// with that name exists.
    fn folder_by_name(
        &self,
        folder_name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<FolderConfig>> + Send + '_>>;

    /// The currently configured polling interval.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`](crate::AppError::Config) if the store
    /// cannot be read.
    fn polling_interval(&self) -> Pin<Box<dyn Future<Output = Result<Duration>> + Send + '_>>;
}

/// [`FolderRegistry`] backed by the TOML configuration file on disk.
///
/// Every read loads the file from scratch. The file is small and reads are
/// once per cycle, so caching would only buy staleness.
#[derive(Debug, Clone)]
pub struct TomlFolderRegistry {
    path: PathBuf,
}

impl TomlFolderRegistry {
    /// Create a registry over the given configuration file path.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn load(&self) -> Result<GlobalConfig> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        GlobalConfig::from_toml_str(&raw)
    }
}

impl FolderRegistry for TomlFolderRegistry {
    fn folders_to_poll(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FolderConfig>>> + Send + '_>> {
        Box::pin(async move { Ok(self.load().await?.folders_to_poll()) })
    }

    fn folder_by_name(
        &self,
        folder_name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<FolderConfig>> + Send + '_>> {
        let folder_name = folder_name.to_owned();
        Box::pin(async move { self.load().await?.folder_by_name(&folder_name) })
    }

    fn polling_interval(&self) -> Pin<Box<dyn Future<Output = Result<Duration>> + Send + '_>> {
        Box::pin(async move { Ok(self.load().await?.polling_interval()) })
    }
}
