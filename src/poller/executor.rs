//! Folder poll executor: resolves a cycle's target folders and fans out
//! per-folder processing under a bounded concurrency cap.
//!
//! Follow-up scheduling is split by who observes the outcome: the executor
//! enqueues the follow-up for every folder it fans out over (success or
//! failure) and for successful single-folder cycles; cycle-level failures
//! (config unreadable, folder not found, single-folder processing error)
//! propagate to the worker loop's retry path. Each cycle therefore
//! schedules exactly one follow-up per folder.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tracing::{error, info};

use crate::scheduler::{PollHandler, TaskQueue, WorkItem};
use crate::Result;

use super::processor::process_folder;
use super::CycleContext;

/// Builds the fresh per-cycle collaborator bundle.
pub type ContextFactory = Box<dyn Fn() -> CycleContext + Send + Sync>;

/// Domain handler behind the worker loop: one invocation per [`WorkItem`].
pub struct FolderPollExecutor {
    queue: Arc<TaskQueue>,
    max_parallel: usize,
    fallback_interval: Duration,
    context: ContextFactory,
}

impl FolderPollExecutor {
    /// Create an executor over a shared queue.
    ///
    /// `max_parallel` caps concurrent in-flight folder operations within one
    /// sweep. `fallback_interval` is used for follow-up scheduling when the
    /// configured interval cannot be read mid-cycle.
    #[must_use]
    pub fn new(
        queue: Arc<TaskQueue>,
        max_parallel: usize,
        fallback_interval: Duration,
        context: ContextFactory,
    ) -> Self {
        Self {
            queue,
            max_parallel,
            fallback_interval,
            context,
        }
    }

    async fn run_cycle(&self, item: WorkItem) -> Result<()> {
        let ctx = (self.context)();
        match item.target {
            Some(folder_name) => self.poll_single(&ctx, &folder_name).await,
            None => self.poll_all(&ctx).await,
        }
    }

    /// Poll exactly one folder; used by per-folder follow-up items.
    async fn poll_single(&self, ctx: &CycleContext, folder_name: &str) -> Result<()> {
        let folder = ctx.registry.folder_by_name(folder_name).await?;

        // The polling flag is re-read every cycle; a disabled folder ends
        // its schedule chain here, with no processing and no follow-up.
        if !folder.polling {
            info!(
                folder = folder.folder_name,
                "polling disabled, dropping the folder's schedule"
            );
            return Ok(());
        }

        let processed = process_folder(ctx, &folder).await?;

        let interval = ctx.registry.polling_interval().await?;
        self.queue
            .enqueue(WorkItem::folder(&folder.folder_name, interval));
        info!(
            folder = folder.folder_name,
            processed,
            next_in_secs = interval.as_secs(),
            "folder polled and rescheduled"
        );
        Ok(())
    }

    /// Poll every polling-enabled folder, bounded by the concurrency cap.
    async fn poll_all(&self, ctx: &CycleContext) -> Result<()> {
        let folders = ctx.registry.folders_to_poll().await?;

        if folders.is_empty() {
            // Keep the generic sweep alive so the schedule self-heals once
            // a folder is enabled later.
            let interval = ctx.registry.polling_interval().await?;
            info!(
                next_in_secs = interval.as_secs(),
                "no folders enabled for polling, rescheduling sweep"
            );
            self.queue.enqueue(WorkItem::sweep(interval));
            return Ok(());
        }

        info!(count = folders.len(), "starting polling tasks");

        stream::iter(folders)
            .for_each_concurrent(self.max_parallel, |folder| {
                let queue = Arc::clone(&self.queue);
                let ctx = ctx.clone();
                let fallback_interval = self.fallback_interval;

                async move {
                    match process_folder(&ctx, &folder).await {
                        Ok(processed) => {
                            info!(folder = folder.folder_name, processed, "folder polled");
                        }
                        Err(err) => {
                            // A failing folder must not abort its siblings,
                            // and must still be rescheduled below.
                            error!(folder = folder.folder_name, %err, "folder polling failed");
                        }
                    }

                    let interval = match ctx.registry.polling_interval().await {
                        Ok(interval) => interval,
                        Err(err) => {
                            error!(%err, "failed to read polling interval, using fallback");
                            fallback_interval
                        }
                    };
                    queue.enqueue(WorkItem::folder(folder.folder_name, interval));
                }
            })
            .await;

        info!("finished all polling tasks");
        Ok(())
    }
}

impl PollHandler for FolderPollExecutor {
    fn run(&self, item: WorkItem) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.run_cycle(item))
    }
}
