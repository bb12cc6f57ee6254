//! Snapshot-file document store.
//!
//! The whole document tree is held in memory and rewritten to disk after
//! every successful mutation, using the headered snapshot encoding from
//! [`taskboard_proto::codec`]. Files are replaced atomically (write to a
//! sibling temp file, then rename), so a crash never leaves a torn file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use taskboard_proto::codec;
use taskboard_proto::path::DocumentPath;
use taskboard_proto::task::{Task, TaskId, TaskRecord};
use taskboard_proto::user::{Snapshot, User, UserId};
use tokio::sync::Mutex;

use super::{StoreError, TaskStore};

/// File-backed implementation of [`TaskStore`].
pub struct FileStore {
    path: PathBuf,
    users: Mutex<BTreeMap<UserId, User>>,
}

impl FileStore {
    /// Opens the store at `path`.
    ///
    /// A missing file is treated as an empty store; it is created on the
    /// first write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReadFailed`] if the file exists but cannot be
    /// read or decoded.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let users = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot = codec::decode_file(&bytes).map_err(|e| {
                    StoreError::ReadFailed(format!("{}: {e}", path.display()))
                })?;
                tracing::debug!(
                    path = %path.display(),
                    users = snapshot.users.len(),
                    "loaded snapshot file"
                );
                snapshot
                    .users
                    .into_iter()
                    .map(|user| (user.id.clone(), user))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(StoreError::ReadFailed(format!("{}: {e}", path.display())));
            }
        };
        Ok(Self {
            path,
            users: Mutex::new(users),
        })
    }

    /// Returns the snapshot file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `mutate` to a copy of the tree and persists it.
    ///
    /// The in-memory tree is only replaced once the file write succeeded.
    async fn commit<F>(&self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<UserId, User>) -> Result<(), StoreError> + Send,
    {
        let mut users = self.users.lock().await;
        let mut next = users.clone();
        mutate(&mut next)?;
        self.persist(&next).await?;
        *users = next;
        drop(users);
        Ok(())
    }

    async fn persist(&self, users: &BTreeMap<UserId, User>) -> Result<(), StoreError> {
        let snapshot: Snapshot = users.values().cloned().collect();
        let bytes =
            codec::encode_file(&snapshot).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Unavailable(format!("{}: {e}", parent.display())))?;
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("{}: {e}", self.path.display())))?;
        Ok(())
    }
}

fn user_mut<'a>(
    users: &'a mut BTreeMap<UserId, User>,
    user_id: &UserId,
) -> Result<&'a mut User, StoreError> {
    users
        .get_mut(user_id)
        .ok_or_else(|| StoreError::NotFound(DocumentPath::user(user_id.clone()).to_string()))
}

impl TaskStore for FileStore {
    async fn read_user(&self, user_id: &UserId) -> Result<User, StoreError> {
        self.users
            .lock()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(DocumentPath::user(user_id.clone()).to_string()))
    }

    async fn read_all_users(&self) -> Result<Snapshot, StoreError> {
        Ok(self.users.lock().await.values().cloned().collect())
    }

    async fn write_task(
        &self,
        user_id: &UserId,
        task_id: &TaskId,
        record: &TaskRecord,
    ) -> Result<(), StoreError> {
        let task = Task::from_record(task_id.clone(), record.clone());
        self.commit(move |users| {
            user_mut(users, user_id)?.tasks.insert(task.id.clone(), task);
            Ok(())
        })
        .await
    }

    async fn remove_task(&self, user_id: &UserId, task_id: &TaskId) -> Result<(), StoreError> {
        self.commit(|users| {
            user_mut(users, user_id)?.tasks.remove(task_id);
            Ok(())
        })
        .await
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let user = user.clone();
        self.commit(move |users| {
            if users.contains_key(&user.id) {
                return Err(StoreError::UserExists(user.id.to_string()));
            }
            users.insert(user.id.clone(), user);
            Ok(())
        })
        .await
    }
}
