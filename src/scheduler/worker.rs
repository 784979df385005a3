//! Single long-lived worker loop driving poll cycles.
//!
//! The loop seeds the queue with one startup item, then dequeues due
//! [`WorkItem`]s forever, handing each to the injected [`PollHandler`].
//! A handler failure never stops the loop: the error is logged and exactly
//! one retry item for the same target is enqueued at the currently
//! configured polling interval (read fresh, never cached). Only the
//! cancellation token ends the loop.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

use crate::registry::FolderRegistry;
use crate::Result;

use super::queue::{TaskQueue, WorkItem};

/// Handler invoked once per dequeued [`WorkItem`].
///
/// Implementations build a fresh bundle of collaborator handles per
/// invocation so no mutable per-cycle state leaks across cycles.
pub trait PollHandler: Send + Sync {
    /// Execute one poll cycle for the given item.
    ///
    /// # Errors
    ///
    /// Any error is caught by the worker loop and converted into a retry
    /// item for the same target; it never propagates further.
    fn run(&self, item: WorkItem) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Spawn the worker loop as a background task.
///
/// `startup_delay` delays the first sweep so polling does not contend with
/// process initialization. `fallback_interval` is used for retry scheduling
/// when the configured interval itself cannot be read.
#[must_use]
pub fn spawn_worker_loop(
    queue: Arc<TaskQueue>,
    handler: Arc<dyn PollHandler>,
    registry: Arc<dyn FolderRegistry>,
    startup_delay: Duration,
    fallback_interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    queue.enqueue(WorkItem::sweep(startup_delay));
    info!(startup_delay_secs = startup_delay.as_secs(), "worker loop seeded");

    tokio::spawn(async move {
        loop {
            let item = tokio::select! {
                () = cancel.cancelled() => {
                    info!("worker loop shutting down");
                    break;
                }
                item = queue.dequeue_when_due() => item,
            };

            run_cycle(&queue, handler.as_ref(), registry.as_ref(), fallback_interval, item).await;
        }
    })
}

async fn run_cycle(
    queue: &TaskQueue,
    handler: &dyn PollHandler,
    registry: &dyn FolderRegistry,
    fallback_interval: Duration,
    item: WorkItem,
) {
    let target = item.target.clone();
    let cycle_id = uuid::Uuid::new_v4();
    let span = info_span!(
        "poll_cycle",
        %cycle_id,
        target = target.as_deref().unwrap_or("all"),
    );

    if let Err(err) = handler.run(item).instrument(span).await {
        error!(
            %err,
            target = target.as_deref().unwrap_or("all"),
            "poll cycle failed, scheduling retry at the regular interval"
        );

        // The regular interval is reused on failure; there is deliberately
        // no shortened backoff.
        let interval = match registry.polling_interval().await {
            Ok(interval) => interval,
            Err(err) => {
                error!(%err, "failed to read polling interval, using fallback");
                fallback_interval
            }
        };

        let retry = match target {
            Some(folder_name) => WorkItem::folder(folder_name, interval),
            None => WorkItem::sweep(interval),
        };
        queue.enqueue(retry);
    }
}
