//! Integration tests for the failure taxonomy: configuration errors,
//! transport errors, filesystem errors, and sibling isolation.

use std::sync::Arc;
use std::time::Duration;

use folder_courier::poller::FolderPollExecutor;
use folder_courier::registry::FolderRegistry;
use folder_courier::scheduler::{PollHandler, TaskQueue, WorkItem};
use folder_courier::webhook::WebhookTransport;
use folder_courier::AppError;

use super::test_helpers::{delete_folder, make_context, move_folder, InMemoryRegistry, RecordingWebhook};

const INTERVAL: Duration = Duration::from_secs(500);

fn executor_over(
    queue: &Arc<TaskQueue>,
    registry: Arc<InMemoryRegistry>,
    webhook: Arc<RecordingWebhook>,
) -> FolderPollExecutor {
    let registry = registry as Arc<dyn FolderRegistry>;
    let webhook = webhook as Arc<dyn WebhookTransport>;
    FolderPollExecutor::new(
        Arc::clone(queue),
        10,
        INTERVAL,
        Box::new(move || make_context(Arc::clone(&registry), Arc::clone(&webhook))),
    )
}

#[tokio::test]
async fn move_policy_without_destination_leaves_file_in_place() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("stuck.txt");
    tokio::fs::write(&file, "stuck").await.expect("write");

    let registry = Arc::new(InMemoryRegistry::new(
        vec![move_folder(
            "broken",
            dir.path().to_path_buf(),
            None,
            "http://hook.test/broken",
        )],
        INTERVAL,
    ));
    let webhook = Arc::new(RecordingWebhook::new());
    let queue = Arc::new(TaskQueue::new());
    let executor = executor_over(&queue, Arc::clone(&registry), Arc::clone(&webhook));

    // Fan-out contains the configuration error and still reschedules the
    // folder at the normal interval.
    executor
        .run(WorkItem::sweep(Duration::ZERO))
        .await
        .expect("sweep itself succeeds");

    assert!(file.exists(), "file must remain untouched");
    let snapshot = queue.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].target.as_deref(), Some("broken"));
}

#[tokio::test]
async fn single_folder_cycle_propagates_configuration_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("stuck.txt");
    tokio::fs::write(&file, "stuck").await.expect("write");

    let registry = Arc::new(InMemoryRegistry::new(
        vec![move_folder(
            "broken",
            dir.path().to_path_buf(),
            None,
            "http://hook.test/broken",
        )],
        INTERVAL,
    ));
    let webhook = Arc::new(RecordingWebhook::new());
    let queue = Arc::new(TaskQueue::new());
    let executor = executor_over(&queue, Arc::clone(&registry), Arc::clone(&webhook));

    let err = executor
        .run(WorkItem::folder("broken", Duration::ZERO))
        .await
        .expect_err("missing destination is a configuration error");

    assert!(matches!(err, AppError::Config(_)), "got {err:?}");
    assert!(file.exists(), "file must remain in its original location");
    // The worker loop owns the retry for failed single-folder cycles.
    assert!(queue.is_empty());
}

#[tokio::test]
async fn webhook_failure_aborts_remaining_files_in_the_folder() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file_a = dir.path().join("a.txt");
    let file_b = dir.path().join("b.txt");
    let file_c = dir.path().join("c.txt");
    for (path, contents) in [(&file_a, "a"), (&file_b, "b"), (&file_c, "c")] {
        tokio::fs::write(path, contents).await.expect("write");
    }

    let registry = Arc::new(InMemoryRegistry::new(
        vec![delete_folder(
            "inbox",
            dir.path().to_path_buf(),
            "http://hook.test/inbox",
        )],
        INTERVAL,
    ));
    // HTTP 500 on the second file.
    let webhook = Arc::new(RecordingWebhook::failing_for("b.txt"));
    let queue = Arc::new(TaskQueue::new());
    let executor = executor_over(&queue, Arc::clone(&registry), Arc::clone(&webhook));

    executor
        .run(WorkItem::sweep(Duration::ZERO))
        .await
        .expect("sweep itself succeeds");

    // File 1 transmitted and disposed; file 2 failed; file 3 never attempted.
    assert_eq!(webhook.recorded_names(), vec!["a.txt", "b.txt"]);
    assert!(!file_a.exists());
    assert!(file_b.exists());
    assert!(file_c.exists());

    // The folder is rescheduled normally despite the failure.
    let snapshot = queue.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].target.as_deref(), Some("inbox"));
}

#[tokio::test]
async fn unknown_folder_target_propagates_not_found() {
    let registry = Arc::new(InMemoryRegistry::new(Vec::new(), INTERVAL));
    let webhook = Arc::new(RecordingWebhook::new());
    let queue = Arc::new(TaskQueue::new());
    let executor = executor_over(&queue, registry, webhook);

    let err = executor
        .run(WorkItem::folder("ghost", Duration::ZERO))
        .await
        .expect_err("unknown folder fails the cycle");

    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    assert!(queue.is_empty());
}

#[tokio::test]
async fn failing_folder_does_not_abort_its_siblings() {
    let good_dir = tempfile::tempdir().expect("tempdir");
    let good_file = good_dir.path().join("fine.txt");
    tokio::fs::write(&good_file, "fine").await.expect("write");

    let missing_path = good_dir.path().join("does-not-exist");
    let registry = Arc::new(InMemoryRegistry::new(
        vec![
            delete_folder("bad", missing_path, "http://hook.test/bad"),
            delete_folder(
                "good",
                good_dir.path().to_path_buf(),
                "http://hook.test/good",
            ),
        ],
        INTERVAL,
    ));
    let webhook = Arc::new(RecordingWebhook::new());
    let queue = Arc::new(TaskQueue::new());
    let executor = executor_over(&queue, Arc::clone(&registry), Arc::clone(&webhook));

    executor
        .run(WorkItem::sweep(Duration::ZERO))
        .await
        .expect("sweep itself succeeds");

    // The good folder completed despite its sibling's filesystem error.
    assert_eq!(webhook.recorded_names(), vec!["fine.txt"]);
    assert!(!good_file.exists());

    // Both folders get their follow-up item.
    let mut targets: Vec<_> = queue
        .snapshot()
        .iter()
        .map(|e| e.target.clone().expect("folder target"))
        .collect();
    targets.sort();
    assert_eq!(targets, vec!["bad", "good"]);
}
