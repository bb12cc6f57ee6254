//! Integration tests for ordered task lists and their persisted priorities.
//!
//! Every test drives a `TaskManager` against a store and then reads the
//! store back, checking that the persisted priorities are `1..=N` in the
//! manager's order.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use taskboard::store::{InMemoryStore, StoreError, TaskStore};
use taskboard::tasks::{PersistenceWarning, TaskDraft, TaskError, TaskManager, TaskOptions};
use taskboard_proto::path::DocumentPath;
use taskboard_proto::task::{Level, Task, TaskId, TaskRecord};
use taskboard_proto::user::{Snapshot, User, UserId};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn alice() -> UserId {
    UserId::new("alice").unwrap()
}

async fn store_with_alice() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store
        .create_user(&User::new(alice(), "Alice".to_string()))
        .await
        .unwrap();
    store
}

fn draft(name: &str) -> TaskDraft {
    TaskDraft::new(name).with_date("03-03-2026")
}

/// Stored `(name, priority)` pairs in priority order.
async fn stored<S: TaskStore>(store: &S) -> Vec<(String, u32)> {
    let user = store.read_user(&alice()).await.unwrap();
    user.ordered_tasks()
        .into_iter()
        .map(|t| (t.name.clone(), t.priority))
        .collect()
}

fn names(manager: &TaskManager<impl TaskStore + 'static>) -> Vec<&str> {
    manager.tasks().iter().map(|t| t.name.as_str()).collect()
}

/// Adds tasks one by one, waiting for every batch.
async fn populate<S: TaskStore + 'static>(manager: &mut TaskManager<S>, tasks: &[&str]) {
    for name in tasks {
        let (_, pending) = manager.add_task(draft(name)).unwrap();
        assert!(pending.wait().await.is_success());
    }
}

/// Store wrapper whose task writes can be switched off.
struct FlakyStore {
    inner: InMemoryStore,
    failing: AtomicBool,
}

impl TaskStore for FlakyStore {
    async fn read_user(&self, user_id: &UserId) -> Result<User, StoreError> {
        self.inner.read_user(user_id).await
    }

    async fn read_all_users(&self) -> Result<Snapshot, StoreError> {
        self.inner.read_all_users().await
    }

    async fn write_task(
        &self,
        user_id: &UserId,
        task_id: &TaskId,
        record: &TaskRecord,
    ) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("network down".to_string()));
        }
        self.inner.write_task(user_id, task_id, record).await
    }

    async fn remove_task(&self, user_id: &UserId, task_id: &TaskId) -> Result<(), StoreError> {
        self.inner.remove_task(user_id, task_id).await
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.inner.create_user(user).await
    }
}

/// Store wrapper that delays each task write by a varying amount, so
/// writes of successive batches finish out of order.
struct SlowStore {
    inner: InMemoryStore,
    calls: AtomicU64,
}

impl TaskStore for SlowStore {
    async fn read_user(&self, user_id: &UserId) -> Result<User, StoreError> {
        self.inner.read_user(user_id).await
    }

    async fn read_all_users(&self) -> Result<Snapshot, StoreError> {
        self.inner.read_all_users().await
    }

    async fn write_task(
        &self,
        user_id: &UserId,
        task_id: &TaskId,
        record: &TaskRecord,
    ) -> Result<(), StoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis((call * 7) % 11)).await;
        self.inner.write_task(user_id, task_id, record).await
    }

    async fn remove_task(&self, user_id: &UserId, task_id: &TaskId) -> Result<(), StoreError> {
        self.inner.remove_task(user_id, task_id).await
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.inner.create_user(user).await
    }
}

// ===========================================================================
// Ordering and renumbering
// ===========================================================================

#[tokio::test]
async fn added_tasks_get_contiguous_priorities() {
    let store = store_with_alice().await;
    let (mut manager, _rx) = TaskManager::load(Arc::clone(&store), alice(), TaskOptions::default())
        .await
        .unwrap();
    populate(&mut manager, &["A", "B", "C"]).await;

    assert_eq!(
        stored(store.as_ref()).await,
        vec![
            ("A".to_string(), 1),
            ("B".to_string(), 2),
            ("C".to_string(), 3)
        ]
    );
    assert!(manager.tasks().iter().all(|t| !t.is_done));
}

#[tokio::test]
async fn move_down_swaps_and_rewrites() {
    let store = store_with_alice().await;
    let (mut manager, _rx) = TaskManager::load(Arc::clone(&store), alice(), TaskOptions::default())
        .await
        .unwrap();
    populate(&mut manager, &["A", "B", "C"]).await;

    let report = manager.move_down(0).unwrap().unwrap().wait().await;
    assert_eq!(report.written(), 3);
    assert_eq!(names(&manager), vec!["B", "A", "C"]);
    assert_eq!(
        stored(store.as_ref()).await,
        vec![
            ("B".to_string(), 1),
            ("A".to_string(), 2),
            ("C".to_string(), 3)
        ]
    );
}

#[tokio::test]
async fn delete_renumbers_following_tasks_and_removes_document() {
    let store = store_with_alice().await;
    let (mut manager, _rx) = TaskManager::load(Arc::clone(&store), alice(), TaskOptions::default())
        .await
        .unwrap();
    populate(&mut manager, &["A", "B", "C", "D"]).await;

    let (removed, pending) = manager.delete(1).unwrap();
    assert_eq!(removed.name, "B");
    let report = pending.wait().await;
    assert!(report.is_success());
    assert!(
        report
            .results
            .iter()
            .any(|(path, _)| *path == DocumentPath::task(alice(), removed.id.clone()))
    );

    assert_eq!(
        stored(store.as_ref()).await,
        vec![
            ("A".to_string(), 1),
            ("C".to_string(), 2),
            ("D".to_string(), 3)
        ]
    );
    let user = store.read_user(&alice()).await.unwrap();
    assert!(!user.tasks.contains_key(&removed.id));
}

#[tokio::test]
async fn boundary_moves_do_not_write() {
    let store = store_with_alice().await;
    let (mut manager, _rx) = TaskManager::load(Arc::clone(&store), alice(), TaskOptions::default())
        .await
        .unwrap();
    populate(&mut manager, &["A", "B"]).await;

    assert!(manager.move_up(0).unwrap().is_none());
    assert!(manager.move_down(1).unwrap().is_none());
    assert_eq!(names(&manager), vec!["A", "B"]);
}

#[tokio::test]
async fn out_of_range_positions_are_rejected() {
    let store = store_with_alice().await;
    let (mut manager, _rx) = TaskManager::load(Arc::clone(&store), alice(), TaskOptions::default())
        .await
        .unwrap();
    populate(&mut manager, &["A"]).await;

    assert!(matches!(
        manager.move_up(1),
        Err(TaskError::IndexOutOfRange { index: 1, len: 1 })
    ));
    assert!(matches!(
        manager.delete(5),
        Err(TaskError::IndexOutOfRange { .. })
    ));
    assert!(matches!(
        manager.toggle_done(1),
        Err(TaskError::IndexOutOfRange { .. })
    ));
    assert_eq!(manager.len(), 1);
}

#[tokio::test]
async fn toggle_and_edit_keep_priorities() {
    let store = store_with_alice().await;
    let (mut manager, _rx) = TaskManager::load(Arc::clone(&store), alice(), TaskOptions::default())
        .await
        .unwrap();
    populate(&mut manager, &["A", "B"]).await;

    assert!(manager.toggle_done(1).unwrap().wait().await.is_success());
    assert!(
        manager
            .edit(0, Some("A2".to_string()), Some(Level::Hard))
            .unwrap()
            .wait()
            .await
            .is_success()
    );

    let user = store.read_user(&alice()).await.unwrap();
    let tasks: Vec<&Task> = user.ordered_tasks();
    assert_eq!(tasks[0].name, "A2");
    assert_eq!(tasks[0].level, Level::Hard);
    assert_eq!(tasks[0].priority, 1);
    assert!(tasks[1].is_done);
    assert_eq!(tasks[1].priority, 2);
}

// ===========================================================================
// Loading and repair
// ===========================================================================

#[tokio::test]
async fn gapped_priorities_load_in_order_and_repair() {
    let mut user = User::new(alice(), "Alice".to_string());
    for (name, priority) in [("low", 9), ("high", 2), ("mid", 5)] {
        let task = Task {
            id: TaskId::new(),
            date: "03-03-2026".to_string(),
            name: name.to_string(),
            level: Level::Easy,
            is_done: false,
            priority,
        };
        user.tasks.insert(task.id.clone(), task);
    }
    let store = Arc::new(InMemoryStore::from_snapshot(std::iter::once(user).collect()));

    let (mut manager, _rx) = TaskManager::load(Arc::clone(&store), alice(), TaskOptions::default())
        .await
        .unwrap();
    assert!(manager.needs_repair());
    assert_eq!(names(&manager), vec!["high", "mid", "low"]);
    let priorities: Vec<u32> = manager.tasks().iter().map(|t| t.priority).collect();
    assert_eq!(priorities, vec![1, 2, 3]);

    // Nothing written until renormalization.
    assert_eq!(
        stored(store.as_ref()).await,
        vec![
            ("high".to_string(), 2),
            ("mid".to_string(), 5),
            ("low".to_string(), 9)
        ]
    );

    assert!(manager.renormalize().wait().await.is_success());
    assert!(!manager.needs_repair());
    assert_eq!(
        stored(store.as_ref()).await,
        vec![
            ("high".to_string(), 1),
            ("mid".to_string(), 2),
            ("low".to_string(), 3)
        ]
    );
}

#[tokio::test]
async fn loading_unknown_user_fails() {
    let store = Arc::new(InMemoryStore::new());
    let result = TaskManager::load(store, alice(), TaskOptions::default()).await;
    assert!(matches!(
        result,
        Err(TaskError::Load(StoreError::NotFound(_)))
    ));
}

// ===========================================================================
// Persistence failures
// ===========================================================================

#[tokio::test]
async fn failed_writes_warn_and_keep_memory_order() {
    let inner = InMemoryStore::new();
    inner
        .create_user(&User::new(alice(), "Alice".to_string()))
        .await
        .unwrap();
    let store = Arc::new(FlakyStore {
        inner,
        failing: AtomicBool::new(false),
    });
    let (mut manager, mut warnings) =
        TaskManager::load(Arc::clone(&store), alice(), TaskOptions::default())
            .await
            .unwrap();
    populate(&mut manager, &["A", "B"]).await;

    store.failing.store(true, Ordering::SeqCst);
    let report = manager.move_up(1).unwrap().unwrap().wait().await;
    assert_eq!(report.failures().len(), 2);
    assert_eq!(names(&manager), vec!["B", "A"]);

    let PersistenceWarning::WriteFailed {
        generation, reason, ..
    } = warnings.recv().await.unwrap();
    assert_eq!(generation, report.generation);
    assert!(reason.contains("network down"));

    // Store still holds the previous order.
    assert_eq!(
        stored(&store.inner).await,
        vec![("A".to_string(), 1), ("B".to_string(), 2)]
    );

    // Retrying after the outage converges.
    store.failing.store(false, Ordering::SeqCst);
    assert!(manager.renormalize().wait().await.is_success());
    assert_eq!(
        stored(&store.inner).await,
        vec![("B".to_string(), 1), ("A".to_string(), 2)]
    );
}

#[tokio::test]
async fn consecutive_batches_converge_to_latest_order() {
    let store = store_with_alice().await;
    let (mut manager, _rx) = TaskManager::load(Arc::clone(&store), alice(), TaskOptions::default())
        .await
        .unwrap();
    populate(&mut manager, &["A", "B", "C"]).await;

    // Issue several batches without waiting between them.
    let first = manager.move_down(0).unwrap().unwrap();
    let second = manager.move_down(1).unwrap().unwrap();
    let third = manager.move_up(2).unwrap().unwrap();
    assert!(first.generation() < second.generation());
    assert!(second.generation() < third.generation());

    for pending in [first, second, third] {
        assert!(pending.wait().await.is_success());
    }

    let expected: Vec<(String, u32)> = manager
        .tasks()
        .iter()
        .map(|t| (t.name.clone(), t.priority))
        .collect();
    assert_eq!(stored(store.as_ref()).await, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn out_of_order_writes_converge_to_latest_order() {
    let inner = InMemoryStore::new();
    inner
        .create_user(&User::new(alice(), "Alice".to_string()))
        .await
        .unwrap();
    let store = Arc::new(SlowStore {
        inner,
        calls: AtomicU64::new(0),
    });
    let (mut manager, _rx) = TaskManager::load(Arc::clone(&store), alice(), TaskOptions::default())
        .await
        .unwrap();
    let names: Vec<String> = (0..6).map(|i| format!("T{i}")).collect();
    for name in &names {
        let (_, pending) = manager.add_task(draft(name)).unwrap();
        assert!(pending.wait().await.is_success());
    }

    for round in 0..10 {
        let mut batches = Vec::new();
        for step in 0..12usize {
            let index = (step * 5 + round) % manager.len();
            let pending = if step % 2 == 0 {
                manager.move_down(index).unwrap()
            } else {
                manager.move_up(index).unwrap()
            };
            batches.extend(pending);
        }
        if round == 9 {
            let (_, pending) = manager.delete(2).unwrap();
            batches.push(pending);
        }

        let mut superseded = 0;
        for pending in batches {
            let report = pending.wait().await;
            assert!(report.is_success());
            superseded += report.superseded();
        }

        let expected: Vec<(String, u32)> = manager
            .tasks()
            .iter()
            .map(|t| (t.name.clone(), t.priority))
            .collect();
        assert_eq!(stored(&store.inner).await, expected, "round {round}, superseded {superseded}");
    }
    assert_eq!(manager.len(), 5);
}
