//! Folder polling: per-cycle context, fan-out executor, per-folder processor.

pub mod executor;
pub mod processor;

use std::sync::Arc;

pub use executor::FolderPollExecutor;
pub use processor::{process_folder, FileSpec};

use crate::fsops::FileStore;
use crate::registry::FolderRegistry;
use crate::webhook::WebhookTransport;

/// Bundle of collaborator handles scoped to one poll cycle.
///
/// A fresh bundle is constructed per cycle so per-cycle state (open
/// connections, cached reads) never leaks across concurrently running
/// folder operations.
#[derive(Clone)]
pub struct CycleContext {
    /// Read-only configuration access.
    pub registry: Arc<dyn FolderRegistry>,
    /// Filesystem operations.
    pub files: Arc<dyn FileStore>,
    /// Webhook delivery transport.
    pub webhook: Arc<dyn WebhookTransport>,
}
