//! Per-folder processing: list, transmit, dispose.
//!
//! Files within one folder are handled strictly sequentially in listing
//! order. The first failure (webhook, disposal, filesystem) aborts the
//! folder's remaining files for this cycle so none are silently lost or
//! duplicated. No retry happens here; errors propagate to the scheduling
//! layer.

use std::path::Path;

use tracing::info;

use crate::config::{FolderConfig, PollingPolicy};
use crate::{AppError, Result};

use super::CycleContext;

/// File name split on the last dot, as sent to the webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    /// Name portion before the last dot.
    pub stem: String,
    /// Extension after the last dot, if any.
    pub extension: Option<String>,
}

impl FileSpec {
    /// Derive a spec from a file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the path has no file name component.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| AppError::Io(format!("{} has no file name", path.display())))?;

        match file_name.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => Ok(Self {
                stem: stem.to_owned(),
                extension: Some(extension.to_owned()),
            }),
            _ => Ok(Self {
                stem: file_name.to_owned(),
                extension: None,
            }),
        }
    }

    /// Full upload name, `stem.extension` or just the stem.
    #[must_use]
    pub fn upload_name(&self) -> String {
        match &self.extension {
            Some(extension) => format!("{}.{extension}", self.stem),
            None => self.stem.clone(),
        }
    }
}

/// Process one folder: list its files, transmit each to the folder's
/// webhook, then apply the disposal policy. Returns the number of files
/// fully processed.
///
/// # Errors
///
/// Returns the first error encountered; remaining files in the folder are
/// not attempted.
pub async fn process_folder(ctx: &CycleContext, folder: &FolderConfig) -> Result<usize> {
    let webhook_url = folder.webhook_url()?;

    info!(
        folder = folder.folder_name,
        path = %folder.path.display(),
        "listing files for folder"
    );
    let files = ctx.files.list_files(&folder.path, folder.recursive).await?;
    info!(
        folder = folder.folder_name,
        count = files.len(),
        "found files"
    );

    let mut processed = 0usize;
    for file in &files {
        let spec = FileSpec::from_path(file)?;
        let upload_name = spec.upload_name();
        info!(folder = folder.folder_name, file = upload_name, "found file");

        let stream = ctx.files.open_for_read(file).await?;
        ctx.webhook.post_file(webhook_url, &upload_name, stream).await?;

        dispose(ctx, folder, file).await?;
        processed += 1;
    }

    Ok(processed)
}

/// Apply the folder's disposal policy to a successfully transmitted file.
async fn dispose(ctx: &CycleContext, folder: &FolderConfig, file: &Path) -> Result<()> {
    match folder.policy()? {
        PollingPolicy::Delete => {
            info!(file = %file.display(), "deleting file");
            ctx.files.delete_file(file).await
        }
        PollingPolicy::Move => {
            let subfolder = folder
                .move_to_folder
                .as_deref()
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "file {} cannot be moved because folder {} has no destination configured",
                        file.display(),
                        folder.folder_name
                    ))
                })?;

            let destination = folder.path.join(subfolder);
            ctx.files.ensure_directory(&destination).await?;
            info!(
                file = %file.display(),
                destination = %destination.display(),
                "moving file"
            );
            ctx.files
                .move_file(file, &destination, folder.allow_overwrite)
                .await
        }
    }
}
