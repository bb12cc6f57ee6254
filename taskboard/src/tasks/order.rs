//! In-memory ordered task sequence.
//!
//! `TaskOrder` holds no store handle. Operations only reorder the
//! sequence; [`TaskOrder::renormalize`] then rewrites every priority to
//! `position + 1`.

use taskboard_proto::task::Task;

use super::TaskError;

/// A single user's tasks as a totally ordered sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOrder {
    tasks: Vec<Task>,
}

impl TaskOrder {
    /// Creates an empty sequence.
    #[must_use]
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Builds a sequence from unordered tasks.
    ///
    /// Tasks are ordered by stored priority, ties broken by task ID.
    /// Priorities are kept as loaded; see [`is_normalized`](Self::is_normalized).
    #[must_use]
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut tasks: Vec<Task> = tasks.into_iter().collect();
        tasks.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        Self { tasks }
    }

    /// Returns the tasks in display order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Returns the number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if there are no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns `true` if priorities are exactly `1..=N` in sequence order.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        self.tasks
            .iter()
            .zip(1u32..)
            .all(|(task, expected)| task.priority == expected)
    }

    /// Returns the task at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::IndexOutOfRange`] if `index >= len`.
    pub fn get(&self, index: usize) -> Result<&Task, TaskError> {
        let len = self.tasks.len();
        self.tasks
            .get(index)
            .ok_or(TaskError::IndexOutOfRange { index, len })
    }

    /// Returns a mutable reference to the task at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::IndexOutOfRange`] if `index >= len`.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut Task, TaskError> {
        let len = self.tasks.len();
        self.tasks
            .get_mut(index)
            .ok_or(TaskError::IndexOutOfRange { index, len })
    }

    /// Swaps the task at `index` with the one above it.
    ///
    /// Returns `Ok(false)` without changes when `index == 0`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::IndexOutOfRange`] if `index >= len`.
    pub fn move_up(&mut self, index: usize) -> Result<bool, TaskError> {
        self.get(index)?;
        if index == 0 {
            return Ok(false);
        }
        self.tasks.swap(index, index - 1);
        Ok(true)
    }

    /// Swaps the task at `index` with the one below it.
    ///
    /// Returns `Ok(false)` without changes when `index` is the last position.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::IndexOutOfRange`] if `index >= len`.
    pub fn move_down(&mut self, index: usize) -> Result<bool, TaskError> {
        self.get(index)?;
        if index + 1 == self.tasks.len() {
            return Ok(false);
        }
        self.tasks.swap(index, index + 1);
        Ok(true)
    }

    /// Removes and returns the task at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::IndexOutOfRange`] if `index >= len`.
    pub fn remove(&mut self, index: usize) -> Result<Task, TaskError> {
        self.get(index)?;
        Ok(self.tasks.remove(index))
    }

    /// Appends a task at the end with priority `len + 1`.
    pub fn push(&mut self, mut task: Task) {
        task.priority = next_priority(self.tasks.len());
        self.tasks.push(task);
    }

    /// Reassigns `priority = position + 1` for every task.
    pub fn renormalize(&mut self) {
        for (position, task) in self.tasks.iter_mut().enumerate() {
            task.priority = next_priority(position);
        }
    }
}

/// Priority for the task at 0-based `position`.
fn next_priority(position: usize) -> u32 {
    u32::try_from(position).map_or(u32::MAX, |p| p.saturating_add(1))
}
