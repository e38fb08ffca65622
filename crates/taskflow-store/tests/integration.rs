//! Integration tests for the taskflow-store crate.
//!
//! Both backends are driven through the `TaskRecordStore` trait object that
//! `open_store` returns, against real files on disk (via tempfile).

use std::sync::Arc;

use taskflow_store::{Outcome, RetryPolicy, TaskRecordStore, TaskStatus, open_store};

async fn sqlite_store(dir: &tempfile::TempDir, policy: RetryPolicy) -> Arc<dyn TaskRecordStore> {
    open_store(dir.path().join("tasks.db"), policy).await.unwrap()
}

async fn json_store(dir: &tempfile::TempDir, policy: RetryPolicy) -> Arc<dyn TaskRecordStore> {
    let path = dir.path().join("tasks.json");
    std::fs::write(&path, "[]").unwrap();
    open_store(path, policy).await.unwrap()
}

async fn both_backends(policy: RetryPolicy) -> Vec<(tempfile::TempDir, Arc<dyn TaskRecordStore>)> {
    let a = tempfile::tempdir().unwrap();
    let sqlite = sqlite_store(&a, policy).await;
    let b = tempfile::tempdir().unwrap();
    let json = json_store(&b, policy).await;
    vec![(a, sqlite), (b, json)]
}

// ═══════════════════════════════════════════════════════════════════════
//  Queue selection
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn first_pending_row_in_stored_order() {
    for (_dir, store) in both_backends(RetryPolicy::default()).await {
        let a = store.append("a").await.unwrap();
        let b = store.append("b").await.unwrap();
        store.append("c").await.unwrap();

        assert_eq!(store.load_next_pending().await.unwrap().unwrap().id, a);
        store.persist(a, Outcome::Done, "ok").await.unwrap();
        assert_eq!(store.load_next_pending().await.unwrap().unwrap().id, b);
    }
}

#[tokio::test]
async fn persisted_done_row_is_never_returned_again() {
    for (_dir, store) in both_backends(RetryPolicy::default()).await {
        let id = store.append("only").await.unwrap();
        store.persist(id, Outcome::Done, "X").await.unwrap();

        assert!(store.load_next_pending().await.unwrap().is_none());
        assert!(store.load_next_pending().await.unwrap().is_none());

        let rows = store.list().await.unwrap();
        assert_eq!(rows[0].status, TaskStatus::Done);
        assert_eq!(rows[0].result.as_deref(), Some("X"));
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Failed rows
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn unbounded_policy_reselects_failed_rows() {
    for (_dir, store) in both_backends(RetryPolicy::unbounded()).await {
        let id = store.append("bad path").await.unwrap();
        for _ in 0..5 {
            store.persist(id, Outcome::Failed, "nope").await.unwrap();
            assert_eq!(store.load_next_pending().await.unwrap().unwrap().id, id);
        }
    }
}

#[tokio::test]
async fn bounded_policy_retires_failed_rows() {
    for (_dir, store) in both_backends(RetryPolicy::new(2)).await {
        let failing = store.append("bad path").await.unwrap();
        let next = store.append("good").await.unwrap();

        store.persist(failing, Outcome::Failed, "nope").await.unwrap();
        assert_eq!(store.load_next_pending().await.unwrap().unwrap().id, failing);

        store.persist(failing, Outcome::Failed, "nope").await.unwrap();
        assert_eq!(store.load_next_pending().await.unwrap().unwrap().id, next);

        let rows = store.list().await.unwrap();
        assert_eq!(rows[0].attempts, 2);
        assert_eq!(rows[0].status, TaskStatus::Failed);
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  No caching between calls
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn json_store_sees_external_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    std::fs::write(&path, r#"[{"task_input": "a", "status": "done"}]"#).unwrap();
    let store = open_store(&path, RetryPolicy::default()).await.unwrap();
    assert!(store.load_next_pending().await.unwrap().is_none());

    std::fs::write(&path, r#"[{"task_input": "a", "status": ""}]"#).unwrap();
    let row = store.load_next_pending().await.unwrap().unwrap();
    assert_eq!(row.input(), "a");
}

#[tokio::test]
async fn sqlite_store_sees_rows_added_by_another_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    let reader = open_store(&path, RetryPolicy::default()).await.unwrap();
    let writer = open_store(&path, RetryPolicy::default()).await.unwrap();

    assert!(reader.load_next_pending().await.unwrap().is_none());
    writer.append("late arrival").await.unwrap();
    assert_eq!(
        reader.load_next_pending().await.unwrap().unwrap().input(),
        "late arrival"
    );
}
