use fieldsync::{
    mutation::{Mutation, Operation},
    store::{QueueStore, StoreError, sqlite::SqliteStore},
    types::{HttpMethod, MutationStatus},
};
use serde_json::json;

fn mutation(id: u64, entity_id: &str, path: &str) -> Mutation {
    Mutation {
        id,
        entity_id: entity_id.to_string(),
        operation: Operation::new(
            HttpMethod::Post,
            path,
            Some(json!({ "note": "gate code 4417" })),
        ),
        status: MutationStatus::Pending,
        attempts: 0,
        created_at_ms: 1_700_000_000_000 + id,
    }
}

#[test]
fn reopen_preserves_queue_exactly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("queue.db");

    let m1 = mutation(1, "stop-1", "/api/stops/1/arrive");
    let m2 = mutation(2, "stop-1", "/api/stops/1/complete");
    let m3 = mutation(3, "stop-2", "/api/stops/2/arrive");

    {
        let mut store = SqliteStore::open(&path).expect("open");
        store.append(&m1).expect("append");
        store.append(&m2).expect("append");
        store.append(&m3).expect("append");
        store
            .update(m2.id, MutationStatus::Conflict, 4)
            .expect("update");
    }

    let store = SqliteStore::open(&path).expect("reopen");
    let all = store.list_all().expect("list");
    assert_eq!(all.len(), 3);
    assert_eq!(all[0], m1);
    assert_eq!(all[1].status, MutationStatus::Conflict);
    assert_eq!(all[1].attempts, 4);
    assert_eq!(all[1].operation, m2.operation);
    assert_eq!(all[2], m3);
}

#[test]
fn duplicate_append_is_rejected() {
    let mut store = SqliteStore::open_in_memory().expect("open");
    store
        .append(&mutation(7, "stop-1", "/api/stops/1/arrive"))
        .expect("append");

    let err = store
        .append(&mutation(7, "stop-9", "/api/stops/9/arrive"))
        .expect_err("duplicate");
    assert!(matches!(err, StoreError::Duplicate(7)));

    // The original row is untouched.
    let kept = store.get(7).expect("get").expect("row");
    assert_eq!(kept.entity_id, "stop-1");
}

#[test]
fn update_on_missing_id_is_a_noop() {
    let mut store = SqliteStore::open_in_memory().expect("open");
    store
        .update(42, MutationStatus::Failed, 9)
        .expect("update missing");
    assert!(store.get(42).expect("get").is_none());
}

#[test]
fn remove_reports_whether_row_existed() {
    let mut store = SqliteStore::open_in_memory().expect("open");
    store
        .append(&mutation(1, "stop-1", "/api/stops/1/arrive"))
        .expect("append");

    assert!(store.remove(1).expect("remove"));
    assert!(!store.remove(1).expect("remove again"));
    assert!(store.list_all().expect("list").is_empty());
}

#[test]
fn list_by_entity_filters_and_orders_by_id() {
    let mut store = SqliteStore::open_in_memory().expect("open");
    store
        .append(&mutation(5, "stop-2", "/api/stops/2/arrive"))
        .expect("append");
    store
        .append(&mutation(2, "stop-1", "/api/stops/1/arrive"))
        .expect("append");
    store
        .append(&mutation(9, "stop-1", "/api/stops/1/complete"))
        .expect("append");

    let rows = store.list_by_entity("stop-1").expect("list");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, 2);
    assert_eq!(rows[1].id, 9);

    assert!(store.list_by_entity("stop-3").expect("list").is_empty());
}

#[test]
fn bodyless_operation_round_trips() {
    let mut store = SqliteStore::open_in_memory().expect("open");
    let m = Mutation {
        operation: Operation::new(HttpMethod::Delete, "/api/stops/1/note", None),
        ..mutation(1, "stop-1", "")
    };
    store.append(&m).expect("append");

    let back = store.get(1).expect("get").expect("row");
    assert_eq!(back.operation.body, None);
    assert_eq!(back.operation.method, HttpMethod::Delete);
}
