//! Personal ordered task lists with persisted priorities.
//!
//! A user's tasks form a total order. Priorities visible in the store are
//! always the contiguous range `1..=N` in that order: every structural
//! change renormalizes the whole sequence and rewrites every task
//! document, rather than computing which tasks moved.

pub mod manager;
pub mod order;
pub mod writer;

pub use manager::{TaskDraft, TaskManager, TaskOptions};
pub use order::TaskOrder;
pub use writer::{PendingWrites, PersistenceWarning, WriteOutcome, WriteReport};

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during task operations.
///
/// All of these are raised before any mutation or store write happens.
#[derive(Debug, Error)]
pub enum TaskError {
    /// A position outside the current sequence was requested.
    #[error("index {index} out of range for {len} tasks")]
    IndexOutOfRange {
        /// Requested position (0-based).
        index: usize,
        /// Current sequence length.
        len: usize,
    },
    /// Task name cannot be empty.
    #[error("task name cannot be empty")]
    NameEmpty,
    /// Task name exceeds the configured maximum length.
    #[error("task name too long (max {max} characters)")]
    NameTooLong {
        /// Maximum allowed length in characters.
        max: usize,
    },
    /// The task date is not a calendar date in the configured format.
    #[error("invalid task date: {0}")]
    InvalidDate(String),
    /// The user's task list could not be loaded.
    #[error("failed to load tasks: {0}")]
    Load(#[from] StoreError),
}
