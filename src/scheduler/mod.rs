//! Background scheduling engine: delay queue plus worker loop.

pub mod queue;
pub mod worker;

use std::sync::Arc;
use std::time::Duration;

pub use queue::{QueueEntry, TaskQueue, WorkItem};
pub use worker::{spawn_worker_loop, PollHandler};

/// Cheap handle for scheduling out-of-band polls against a shared queue.
///
/// Collaborators outside the core (for example the configuration layer after
/// a folder was added) use this to trigger a poll without waiting for the
/// regular interval.
#[derive(Clone)]
pub struct SchedulerHandle {
    queue: Arc<TaskQueue>,
}

impl SchedulerHandle {
    /// Wrap a shared queue.
    #[must_use]
    pub fn new(queue: Arc<TaskQueue>) -> Self {
        Self { queue }
    }

    /// Schedule a one-off poll of a single folder after `delay`.
    pub fn schedule_folder(&self, folder_name: impl Into<String>, delay: Duration) {
        self.queue.enqueue(WorkItem::folder(folder_name, delay));
    }

    /// Schedule a one-off sweep of all polling-enabled folders after `delay`.
    pub fn schedule_sweep(&self, delay: Duration) {
        self.queue.enqueue(WorkItem::sweep(delay));
    }

    /// Snapshot of pending schedule entries.
    #[must_use]
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.queue.snapshot()
    }
}
