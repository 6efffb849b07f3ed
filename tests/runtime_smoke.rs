use std::{sync::Arc, time::Duration};

use fieldsync::{
    mutation::Operation,
    observe::LifecycleCategory,
    runtime::{
        events::QueueEvent,
        handle::{QueueConfig, QueueError, spawn_queue},
    },
    store::memory::MemoryStore,
    transport::{SyncResponse, Transport, TransportError},
    types::{HttpMethod, MutationStatus},
};

fn ok_transport() -> Arc<dyn Transport> {
    Arc::new(|_op: &Operation| Ok::<_, TransportError>(SyncResponse::new(200)))
}

fn op(path: &str) -> Operation {
    Operation::new(HttpMethod::Post, path, None)
}

fn offline_config() -> QueueConfig {
    QueueConfig {
        start_online: false,
        ..QueueConfig::default()
    }
}

#[tokio::test]
async fn queued_and_synced_events_arrive_in_order() {
    let queue = spawn_queue(
        Box::new(MemoryStore::new()),
        ok_transport(),
        QueueConfig::default(),
    )
    .expect("spawn");
    let mut sub = queue.subscribe();

    queue
        .enqueue("stop-1", op("/api/stops/1/complete"))
        .await
        .expect("enqueue");

    let first = tokio::time::timeout(Duration::from_secs(5), sub.recv())
        .await
        .expect("event")
        .expect("recv");
    let second = tokio::time::timeout(Duration::from_secs(5), sub.recv())
        .await
        .expect("event")
        .expect("recv");

    assert_eq!(first, QueueEvent::MutationQueued);
    assert_eq!(second, QueueEvent::MutationSynced);

    queue.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn pending_mutations_visible_while_offline() {
    let queue = spawn_queue(Box::new(MemoryStore::new()), ok_transport(), offline_config())
        .expect("spawn");

    let a = queue
        .enqueue("stop-1", op("/api/stops/1/arrive"))
        .await
        .expect("enqueue");
    let b = queue
        .enqueue("stop-2", op("/api/stops/2/arrive"))
        .await
        .expect("enqueue");
    assert!(b.id > a.id);

    let active = queue.active_by_entity("stop-1").await.expect("active");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].status, MutationStatus::Pending);
    assert_eq!(active[0].attempts, 0);

    let all = queue.list_all().await.expect("list");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, a.id);
    assert_eq!(all[1].id, b.id);

    queue.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn debug_trail_records_transitions_not_baselines() {
    let queue = spawn_queue(
        Box::new(MemoryStore::new()),
        ok_transport(),
        QueueConfig::default(),
    )
    .expect("spawn");

    // The initial online observation is a baseline, not a transition.
    assert!(queue.debug_trail().await.expect("trail").is_empty());

    queue.set_online(false).await.expect("set_online");
    assert_eq!(queue.debug_trail().await.expect("trail").len(), 1);

    // Repeating the current state records nothing.
    queue.set_online(false).await.expect("set_online");
    assert_eq!(queue.debug_trail().await.expect("trail").len(), 1);

    queue.set_online(true).await.expect("set_online");

    queue
        .record_lifecycle(LifecycleCategory::Navigation, "/jobs")
        .await
        .expect("record");
    queue
        .record_lifecycle(LifecycleCategory::Navigation, "/jobs")
        .await
        .expect("record");
    queue
        .record_lifecycle(LifecycleCategory::Navigation, "/map")
        .await
        .expect("record");

    let trail = queue.debug_trail().await.expect("trail");
    assert_eq!(trail.len(), 3);
    assert_eq!(trail[0].category, LifecycleCategory::Network);
    assert_eq!(trail[0].detail, "offline");
    assert_eq!(trail[1].detail, "online");
    assert_eq!(trail[2].category, LifecycleCategory::Navigation);
    assert_eq!(trail[2].detail, "/map");

    queue.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn retry_and_discard_reject_non_terminal_targets() {
    let queue = spawn_queue(Box::new(MemoryStore::new()), ok_transport(), offline_config())
        .expect("spawn");

    let pending = queue
        .enqueue("stop-1", op("/api/stops/1/arrive"))
        .await
        .expect("enqueue");

    assert!(matches!(
        queue.retry(pending.id).await,
        Err(QueueError::NotRetryable(id)) if id == pending.id
    ));
    assert!(matches!(
        queue.discard(pending.id).await,
        Err(QueueError::NotDiscardable(id)) if id == pending.id
    ));
    assert!(matches!(
        queue.retry(9_999).await,
        Err(QueueError::NotFound(9_999))
    ));

    queue.shutdown().await.expect("shutdown");
}
