//! User aggregate and all-users snapshot.
//!
//! A [`User`] owns its task set as an unordered map keyed by [`TaskId`].
//! Display order is derived from each task's `priority`, never from map
//! iteration order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskId};

/// Opaque user identifier.
///
/// Identifiers are path segments in the document store, so they must be
/// non-empty and must not contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

/// Error returned for a user identifier that cannot be a path segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidUserId {
    /// The identifier is empty.
    #[error("user id cannot be empty")]
    Empty,
    /// The identifier contains a path separator.
    #[error("user id cannot contain '/': {0}")]
    ContainsSeparator(String),
}

impl UserId {
    /// Creates a user identifier, validating it as a path segment.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidUserId`] if `id` is empty or contains `/`.
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidUserId> {
        let id = id.into();
        if id.is_empty() {
            return Err(InvalidUserId::Empty);
        }
        if id.contains('/') {
            return Err(InvalidUserId::ContainsSeparator(id));
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = InvalidUserId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A user's identity plus its full task set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Display name.
    pub username: String,
    /// Task ID -> Task. Unordered storage; see [`User::ordered_tasks`].
    pub tasks: BTreeMap<TaskId, Task>,
}

impl User {
    /// Creates a user with no tasks.
    #[must_use]
    pub const fn new(id: UserId, username: String) -> Self {
        Self {
            id,
            username,
            tasks: BTreeMap::new(),
        }
    }

    /// Returns the user's tasks in display order.
    ///
    /// Sorted by `priority` ascending; equal priorities (only possible
    /// in a store that was never renormalized) fall back to task ID.
    #[must_use]
    pub fn ordered_tasks(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.values().collect();
        tasks.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        tasks
    }
}

/// A full read of all users and their tasks at one point in time.
///
/// The order of `users` is the snapshot iteration order. Ranking keeps
/// this order for users that tie on every sort key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Users in snapshot iteration order.
    pub users: Vec<User>,
}

impl Snapshot {
    /// Returns `true` if the snapshot holds no users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl FromIterator<User> for Snapshot {
    fn from_iter<I: IntoIterator<Item = User>>(iter: I) -> Self {
        Self {
            users: iter.into_iter().collect(),
        }
    }
}
