//! Delay-aware in-memory task queue.
//!
//! [`TaskQueue`] holds [`WorkItem`]s until their due-time has elapsed.
//! Multiple producers may [`enqueue`](TaskQueue::enqueue) concurrently
//! (completed cycles, out-of-band scheduling) while the single worker loop
//! consumes via [`dequeue_when_due`](TaskQueue::dequeue_when_due). All state
//! is in memory; pending items are lost on restart, which is accepted.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

// Due-times beyond this are clamped; `Instant` arithmetic panics on
// overflow and config-expressible delays can exceed the representable range.
const MAX_DELAY: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// One schedulable unit of deferred work.
///
/// Immutable once enqueued; consumed exactly once by dequeue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Delay before the item becomes due.
    pub delay: Duration,
    /// Folder this item targets; `None` means "all polling-enabled folders".
    pub target: Option<String>,
}

impl WorkItem {
    /// Item covering all polling-enabled folders.
    #[must_use]
    pub fn sweep(delay: Duration) -> Self {
        Self {
            delay,
            target: None,
        }
    }

    /// Item scoped to a single folder.
    #[must_use]
    pub fn folder(folder_name: impl Into<String>, delay: Duration) -> Self {
        Self {
            delay,
            target: Some(folder_name.into()),
        }
    }
}

/// Snapshot of one pending queue entry, for introspection and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// Target folder, or `None` for a sweep.
    pub target: Option<String>,
    /// Time remaining until the entry is due (zero if already due).
    pub due_in: Duration,
}

struct Pending {
    due: Instant,
    seq: u64,
    item: WorkItem,
}

// BinaryHeap is a max-heap; invert so the earliest due-time (then lowest
// sequence number, preserving FIFO among equal due-times) surfaces first.
impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Pending {}

struct QueueState {
    pending: BinaryHeap<Pending>,
    next_seq: u64,
}

/// Concurrency-safe delay queue of [`WorkItem`]s.
pub struct TaskQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: BinaryHeap::new(),
                next_seq: 0,
            }),
            notify: Notify::new(),
        }
    }

    /// Insert an item, computing its due-time as now plus the item's delay.
    /// Delays too large to represent are clamped to a far-future due-time.
    ///
    /// Never fails, including under concurrent calls from multiple producers.
    pub fn enqueue(&self, item: WorkItem) {
        let now = Instant::now();
        let due = now
            .checked_add(item.delay)
            .unwrap_or_else(|| now + MAX_DELAY);
        {
            let mut state = self.lock_state();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.pending.push(Pending { due, seq, item });
        }
        // Wake the consumer; the new item may be due earlier than whatever
        // it is currently sleeping on.
        self.notify.notify_one();
    }

    /// Suspend until a pending item's due-time has passed, then remove and
    /// return it. Earliest due-time wins; ties break in enqueue order.
    pub async fn dequeue_when_due(&self) -> WorkItem {
        loop {
            // Register interest before inspecting state so an enqueue between
            // the inspection and the await cannot be missed.
            let notified = self.notify.notified();

            let next_due = {
                let mut state = self.lock_state();
                let head_due = state.pending.peek().map(|pending| pending.due);
                match head_due {
                    Some(due) if due <= Instant::now() => {
                        if let Some(pending) = state.pending.pop() {
                            return pending.item;
                        }
                        None
                    }
                    other => other,
                }
            };

            match next_due {
                Some(due) => {
                    tokio::select! {
                        () = tokio::time::sleep_until(due) => {}
                        () = notified => {}
                    }
                }
                None => notified.await,
            }
        }
    }

    /// Number of pending items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_state().pending.len()
    }

    /// Whether the queue holds no pending items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all pending entries with their time until due.
    ///
    /// Order is unspecified; intended for status display and logging.
    #[must_use]
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        let now = Instant::now();
        self.lock_state()
            .pending
            .iter()
            .map(|pending| QueueEntry {
                target: pending.item.target.clone(),
                due_in: pending.due.saturating_duration_since(now),
            })
            .collect()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, QueueState> {
        // A poisoned lock only means a panic mid-push; the heap is still
        // structurally valid, so keep going rather than propagating.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
