//! Filesystem capability interface consumed by the polling core.
//!
//! All disk access in the core routes through [`FileStore`] so tests can
//! observe and fault-inject individual operations. The production
//! implementation is a thin layer over `tokio::fs`.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::fs;

use crate::{AppError, Result};

/// Filesystem operations needed by folder processing.
pub trait FileStore: Send + Sync {
    /// Enumerate files directly in `path`, optionally including files one
    /// subdirectory level deep. Results are in stable listing order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`](crate::AppError::Io) if the directory cannot
    /// be read.
    fn list_files(
        &self,
        path: &Path,
        recursive: bool,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PathBuf>>> + Send + '_>>;

    /// Remove a file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`](crate::AppError::Io) on failure.
    fn delete_file(&self, path: &Path) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Move a file into `destination_dir`, keeping its file name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`](crate::AppError::Io) if the destination file
    /// already exists and `allow_overwrite` is false, or on rename failure.
    fn move_file(
        &self,
        path: &Path,
        destination_dir: &Path,
        allow_overwrite: bool,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Create a directory (and any missing parents) if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`](crate::AppError::Io) on failure.
    fn ensure_directory(&self, path: &Path)
        -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Open a file for reading.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`](crate::AppError::Io) if the file cannot be
    /// opened.
    fn open_for_read(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn Future<Output = Result<fs::File>> + Send + '_>>;
}

/// [`FileStore`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStore;

impl LocalFileStore {
    /// Create a local filesystem store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn files_in(dir: &Path, out: &mut Vec<PathBuf>, subdirs: Option<&mut Vec<PathBuf>>) -> Result<()> {
        let mut entries = fs::read_dir(dir).await?;
        let mut collected_subdirs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_file() {
                out.push(entry.path());
            } else if file_type.is_dir() {
                collected_subdirs.push(entry.path());
            }
        }
        if let Some(subdirs) = subdirs {
            subdirs.extend(collected_subdirs);
        }
        Ok(())
    }

    async fn list(path: PathBuf, recursive: bool) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut subdirs = Vec::new();
        Self::files_in(&path, &mut files, Some(&mut subdirs)).await?;

        if recursive {
            // One level deep only; deeper nesting is out of scope.
            subdirs.sort();
            for subdir in &subdirs {
                Self::files_in(subdir, &mut files, None).await?;
            }
        }

        files.sort();
        Ok(files)
    }
}

impl FileStore for LocalFileStore {
    fn list_files(
        &self,
        path: &Path,
        recursive: bool,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PathBuf>>> + Send + '_>> {
        let path = path.to_path_buf();
        Box::pin(Self::list(path, recursive))
    }

    fn delete_file(&self, path: &Path) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let path = path.to_path_buf();
        Box::pin(async move {
            fs::remove_file(&path).await?;
            Ok(())
        })
    }

    fn move_file(
        &self,
        path: &Path,
        destination_dir: &Path,
        allow_overwrite: bool,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let path = path.to_path_buf();
        let destination_dir = destination_dir.to_path_buf();
        Box::pin(async move {
            let file_name = path
                .file_name()
                .ok_or_else(|| AppError::Io(format!("{} has no file name", path.display())))?;
            let destination = destination_dir.join(file_name);

            if !allow_overwrite && fs::try_exists(&destination).await? {
                return Err(AppError::Io(format!(
                    "destination file {} already exists",
                    destination.display()
                )));
            }

            fs::rename(&path, &destination).await?;
            Ok(())
        })
    }

    fn ensure_directory(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let path = path.to_path_buf();
        Box::pin(async move {
            fs::create_dir_all(&path).await?;
            Ok(())
        })
    }

    fn open_for_read(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn Future<Output = Result<fs::File>> + Send + '_>> {
        let path = path.to_path_buf();
        Box::pin(async move {
            let file = fs::File::open(&path).await?;
            Ok(file)
        })
    }
}
