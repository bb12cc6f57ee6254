//! Document paths in the key-value store.
//!
//! Users live under `users/{userId}` and each task document under
//! `users/{userId}/tasks/{taskId}`.

use crate::task::TaskId;
use crate::user::UserId;

/// Root collection holding every user document.
pub const USERS_ROOT: &str = "users";

/// Collection segment holding a user's task documents.
pub const TASKS_SEGMENT: &str = "tasks";

/// Errors produced when parsing a document path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path does not have the `users/{id}[/tasks/{id}]` shape.
    #[error("malformed document path: {0}")]
    Malformed(String),
    /// The task segment is not a valid task identifier.
    #[error("invalid task id in path: {0}")]
    InvalidTaskId(String),
}

/// Address of a document in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentPath {
    /// `users/{userId}`
    User(UserId),
    /// `users/{userId}/tasks/{taskId}`
    Task(UserId, TaskId),
}

impl DocumentPath {
    /// Path of a user document.
    #[must_use]
    pub const fn user(user_id: UserId) -> Self {
        Self::User(user_id)
    }

    /// Path of a task document.
    #[must_use]
    pub const fn task(user_id: UserId, task_id: TaskId) -> Self {
        Self::Task(user_id, task_id)
    }

    /// Returns the user the document belongs to.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        match self {
            Self::User(user_id) | Self::Task(user_id, _) => user_id,
        }
    }
}

impl std::fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(user_id) => write!(f, "{USERS_ROOT}/{user_id}"),
            Self::Task(user_id, task_id) => {
                write!(f, "{USERS_ROOT}/{user_id}/{TASKS_SEGMENT}/{task_id}")
            }
        }
    }
}

impl std::str::FromStr for DocumentPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PathError::Malformed(s.to_string());
        let segments: Vec<&str> = s.trim_end_matches('/').split('/').collect();
        match segments.as_slice() {
            [USERS_ROOT, user] => Ok(Self::User(UserId::new(*user).map_err(|_| malformed())?)),
            [USERS_ROOT, user, TASKS_SEGMENT, task] => {
                let user_id = UserId::new(*user).map_err(|_| malformed())?;
                let task_id = task
                    .parse()
                    .map_err(|_| PathError::InvalidTaskId((*task).to_string()))?;
                Ok(Self::Task(user_id, task_id))
            }
            _ => Err(malformed()),
        }
    }
}
