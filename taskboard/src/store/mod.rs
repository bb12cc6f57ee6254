//! Document store consumed by the task manager and the leaderboard.
//!
//! The store is a path-addressed key-value document store: user
//! documents under `users/{userId}` and task documents under
//! `users/{userId}/tasks/{taskId}`. It is the only shared mutable
//! resource; there are no transactions and the last full write of a
//! document wins.
//!
//! Implementations:
//! - [`InMemoryStore`] for tests and embedding
//! - [`FileStore`] persisting a snapshot file on disk

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::InMemoryStore;

use taskboard_proto::task::{TaskId, TaskRecord};
use taskboard_proto::user::{Snapshot, User, UserId};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested document was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A user with the same ID is already registered.
    #[error("user already exists: {0}")]
    UserExists(String),

    /// A write operation failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// A read operation failed.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// The underlying storage is unavailable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Read/write interface to the document store.
pub trait TaskStore: Send + Sync {
    /// Reads one user with its full task set.
    ///
    /// Returns [`StoreError::NotFound`] if the user is not registered.
    fn read_user(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<User, StoreError>> + Send;

    /// Reads every user in one bulk read, in store key order.
    fn read_all_users(&self)
    -> impl std::future::Future<Output = Result<Snapshot, StoreError>> + Send;

    /// Writes the full record of one task, replacing any previous record.
    fn write_task(
        &self,
        user_id: &UserId,
        task_id: &TaskId,
        record: &TaskRecord,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Removes one task document. Removing an absent task is not an error.
    fn remove_task(
        &self,
        user_id: &UserId,
        task_id: &TaskId,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Registers a new user document.
    ///
    /// Returns [`StoreError::UserExists`] if the ID is taken.
    fn create_user(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
