//! In-memory document store.

use std::collections::BTreeMap;

use taskboard_proto::path::DocumentPath;
use taskboard_proto::task::{Task, TaskId, TaskRecord};
use taskboard_proto::user::{Snapshot, User, UserId};
use tokio::sync::RwLock;

use super::{StoreError, TaskStore};

/// In-memory implementation of [`TaskStore`].
///
/// Users are kept in a `BTreeMap`, so [`read_all_users`](TaskStore::read_all_users)
/// yields them in key order. Thread-safe via [`RwLock`]. Not persistent:
/// all data is lost when the process exits.
pub struct InMemoryStore {
    users: RwLock<BTreeMap<UserId, User>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates a store pre-populated with the users of a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let users = snapshot
            .users
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }
}

impl TaskStore for InMemoryStore {
    async fn read_user(&self, user_id: &UserId) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(DocumentPath::user(user_id.clone()).to_string()))
    }

    async fn read_all_users(&self) -> Result<Snapshot, StoreError> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn write_task(
        &self,
        user_id: &UserId,
        task_id: &TaskId,
        record: &TaskRecord,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(DocumentPath::user(user_id.clone()).to_string()))?;
        user.tasks.insert(
            task_id.clone(),
            Task::from_record(task_id.clone(), record.clone()),
        );
        Ok(())
    }

    async fn remove_task(&self, user_id: &UserId, task_id: &TaskId) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(DocumentPath::user(user_id.clone()).to_string()))?;
        user.tasks.remove(task_id);
        Ok(())
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(StoreError::UserExists(user.id.to_string()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }
}
