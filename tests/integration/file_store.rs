//! Integration tests for the snapshot-file backed store.
//!
//! Mutations made through a `TaskManager` must survive reopening the file.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use taskboard::leaderboard;
use taskboard::store::{FileStore, StoreError, TaskStore};
use taskboard::tasks::{TaskDraft, TaskManager, TaskOptions};
use taskboard_proto::task::Level;
use taskboard_proto::user::{User, UserId};

fn alice() -> UserId {
    UserId::new("alice").unwrap()
}

#[tokio::test]
async fn manager_changes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board").join("snapshot.bin");

    {
        let store = Arc::new(FileStore::open(path.clone()).await.unwrap());
        store
            .create_user(&User::new(alice(), "Alice".to_string()))
            .await
            .unwrap();
        let (mut manager, _rx) =
            TaskManager::load(Arc::clone(&store), alice(), TaskOptions::default())
                .await
                .unwrap();
        for name in ["A", "B", "C"] {
            let draft = TaskDraft::new(name)
                .with_level(Level::Hard)
                .with_date("05-05-2026");
            let (_, pending) = manager.add_task(draft).unwrap();
            assert!(pending.wait().await.is_success());
        }
        assert!(manager.move_up(2).unwrap().unwrap().wait().await.is_success());
        let (_, pending) = manager.delete(0).unwrap();
        assert!(pending.wait().await.is_success());
        assert!(manager.toggle_done(0).unwrap().wait().await.is_success());
    }

    let reopened = Arc::new(FileStore::open(path).await.unwrap());
    let (manager, _rx) = TaskManager::load(Arc::clone(&reopened), alice(), TaskOptions::default())
        .await
        .unwrap();
    assert!(!manager.needs_repair());

    let tasks: Vec<(&str, u32, bool)> = manager
        .tasks()
        .iter()
        .map(|t| (t.name.as_str(), t.priority, t.is_done))
        .collect();
    assert_eq!(tasks, vec![("C", 1, true), ("B", 2, false)]);
    assert!(manager.tasks().iter().all(|t| t.level == Level::Hard));

    let board = leaderboard::aggregate(reopened.as_ref()).await.unwrap();
    assert_eq!(board.entries()[0].score, 1);
}

#[tokio::test]
async fn missing_file_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("absent.bin")).await.unwrap();
    assert!(store.read_all_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.bin");
    std::fs::write(&path, b"not a snapshot").unwrap();

    let result = FileStore::open(path).await;
    assert!(matches!(result, Err(StoreError::ReadFailed(_))));
}

#[tokio::test]
async fn duplicate_user_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("snapshot.bin")).await.unwrap();
    let user = User::new(alice(), "Alice".to_string());
    store.create_user(&user).await.unwrap();
    assert!(matches!(
        store.create_user(&user).await,
        Err(StoreError::UserExists(_))
    ));
}
