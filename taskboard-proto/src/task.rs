//! Task model for a single user's to-do list.
//!
//! A [`Task`] is the in-memory form (identifier plus fields). The
//! [`TaskRecord`] is the document persisted under
//! `users/{userId}/tasks/{taskId}`; it carries every field except the
//! identifier, which is part of the path.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum allowed task name length in characters.
pub const MAX_TASK_NAME_LENGTH: usize = 256;

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Difficulty level of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Quick, low-effort task.
    #[default]
    Easy,
    /// Moderate effort.
    Medium,
    /// Substantial effort.
    Hard,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

/// Error returned when a string does not name a [`Level`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown level: {0} (expected easy, medium or hard)")]
pub struct ParseLevelError(String);

impl std::str::FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// The persisted document for one task.
///
/// Writes always carry the full record; the store never receives a
/// partial patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Creation/due date as a calendar date string.
    pub date: String,
    /// Free-text label.
    pub name: String,
    /// Difficulty level.
    pub level: Level,
    /// Completion flag.
    pub is_done: bool,
    /// Display position, 1-based. Smaller is shown first.
    pub priority: u32,
}

/// A task together with its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable identifier for the lifetime of the task.
    pub id: TaskId,
    /// Creation/due date as a calendar date string.
    pub date: String,
    /// Free-text label.
    pub name: String,
    /// Difficulty level.
    pub level: Level,
    /// Completion flag.
    pub is_done: bool,
    /// Display position, 1-based. Smaller is shown first.
    pub priority: u32,
}

impl Task {
    /// Rebuilds a task from its identifier and persisted record.
    #[must_use]
    pub fn from_record(id: TaskId, record: TaskRecord) -> Self {
        Self {
            id,
            date: record.date,
            name: record.name,
            level: record.level,
            is_done: record.is_done,
            priority: record.priority,
        }
    }

    /// Returns the full persisted record for this task.
    #[must_use]
    pub fn record(&self) -> TaskRecord {
        TaskRecord {
            date: self.date.clone(),
            name: self.name.clone(),
            level: self.level,
            is_done: self.is_done,
            priority: self.priority,
        }
    }
}
