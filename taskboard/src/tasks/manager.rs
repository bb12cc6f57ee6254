//! Task priority manager for one user's ordered task list.
//!
//! `TaskManager` owns the in-memory sequence and pushes normalized state
//! to the store after every mutation. Mutations are applied in memory
//! first and never rolled back; the returned [`PendingWrites`] tracks the
//! writes and may be awaited or dropped.

use std::sync::Arc;

use chrono::NaiveDate;
use taskboard_proto::task::{Level, MAX_TASK_NAME_LENGTH, Task, TaskId};
use taskboard_proto::user::UserId;
use tokio::sync::mpsc;

use super::TaskError;
use super::order::TaskOrder;
use super::writer::{PendingWrites, PersistenceWarning, TaskWriter, WriteOp};
use crate::store::TaskStore;

/// Default calendar date format for task dates (`dd-mm-yyyy`).
pub const DEFAULT_DATE_FORMAT: &str = "%d-%m-%Y";

/// Tunables for a [`TaskManager`].
#[derive(Debug, Clone)]
pub struct TaskOptions {
    /// Maximum task name length in characters.
    pub max_name_len: usize,
    /// chrono format string task dates must match.
    pub date_format: String,
    /// Capacity of the persistence warning channel.
    pub warning_buffer: usize,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            max_name_len: MAX_TASK_NAME_LENGTH,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            warning_buffer: 64,
        }
    }
}

/// Fields for a new task.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    /// Free-text label.
    pub name: String,
    /// Calendar date; today's date when `None`.
    pub date: Option<String>,
    /// Difficulty level.
    pub level: Level,
}

impl TaskDraft {
    /// Creates a draft with the given name, today's date and [`Level::Easy`].
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the difficulty level.
    #[must_use]
    pub const fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the calendar date.
    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

/// Maintains one user's tasks as an ordered sequence in sync with the store.
pub struct TaskManager<S: TaskStore + 'static> {
    user_id: UserId,
    username: String,
    order: TaskOrder,
    writer: TaskWriter<S>,
    options: TaskOptions,
    needs_repair: bool,
}

impl<S: TaskStore + 'static> TaskManager<S> {
    /// Loads `user_id`'s tasks from the store.
    ///
    /// Tasks are ordered by stored priority and renumbered `1..=N` in
    /// memory without writing. If the stored priorities were not already
    /// contiguous, [`needs_repair`](Self::needs_repair) returns `true`
    /// until the next renormalization.
    ///
    /// Returns the manager and a receiver for [`PersistenceWarning`] events.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Load`] if the user cannot be read.
    pub async fn load(
        store: Arc<S>,
        user_id: UserId,
        options: TaskOptions,
    ) -> Result<(Self, mpsc::Receiver<PersistenceWarning>), TaskError> {
        let user = store.read_user(&user_id).await?;
        let mut order = TaskOrder::from_tasks(user.tasks.into_values());
        let needs_repair = !order.is_normalized();
        if needs_repair {
            tracing::info!(user = %user_id, tasks = order.len(), "stored priorities not contiguous");
            order.renormalize();
        }
        let (writer, warnings) = TaskWriter::new(store, user_id.clone(), options.warning_buffer);
        let manager = Self {
            user_id,
            username: user.username,
            order,
            writer,
            options,
            needs_repair,
        };
        Ok((manager, warnings))
    }

    /// The user whose list this is.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// The user's display name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Tasks in display order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        self.order.tasks()
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if the stored priorities were found non-contiguous
    /// at load time and no renormalization has been issued since.
    #[must_use]
    pub const fn needs_repair(&self) -> bool {
        self.needs_repair
    }

    /// Moves the task at `index` one position up.
    ///
    /// Returns `Ok(None)` without writing when `index == 0`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::IndexOutOfRange`] if `index >= len`.
    pub fn move_up(&mut self, index: usize) -> Result<Option<PendingWrites>, TaskError> {
        if self.order.move_up(index)? {
            Ok(Some(self.renormalize()))
        } else {
            Ok(None)
        }
    }

    /// Moves the task at `index` one position down.
    ///
    /// Returns `Ok(None)` without writing when `index` is the last position.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::IndexOutOfRange`] if `index >= len`.
    pub fn move_down(&mut self, index: usize) -> Result<Option<PendingWrites>, TaskError> {
        if self.order.move_down(index)? {
            Ok(Some(self.renormalize()))
        } else {
            Ok(None)
        }
    }

    /// Deletes the task at `index` and renumbers the tasks after it.
    ///
    /// The batch removes the deleted task's document and rewrites every
    /// remaining task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::IndexOutOfRange`] if `index >= len`.
    pub fn delete(&mut self, index: usize) -> Result<(Task, PendingWrites), TaskError> {
        let removed = self.order.remove(index)?;
        let pending = self.renormalize_with(vec![(removed.id.clone(), WriteOp::Remove)]);
        Ok((removed, pending))
    }

    /// Appends a new task with the next priority and `is_done = false`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NameEmpty`], [`TaskError::NameTooLong`] or
    /// [`TaskError::InvalidDate`] if the draft is invalid.
    pub fn add_task(&mut self, draft: TaskDraft) -> Result<(TaskId, PendingWrites), TaskError> {
        self.validate_name(&draft.name)?;
        let date = match draft.date {
            Some(date) => self.validate_date(date)?,
            None => chrono::Local::now()
                .date_naive()
                .format(&self.options.date_format)
                .to_string(),
        };
        let task = Task {
            id: TaskId::new(),
            date,
            name: draft.name,
            level: draft.level,
            is_done: false,
            priority: 0,
        };
        let id = task.id.clone();
        self.order.push(task);
        Ok((id, self.renormalize()))
    }

    /// Flips the completion flag of the task at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::IndexOutOfRange`] if `index >= len`.
    pub fn toggle_done(&mut self, index: usize) -> Result<PendingWrites, TaskError> {
        let task = self.order.get_mut(index)?;
        task.is_done = !task.is_done;
        Ok(self.renormalize())
    }

    /// Edits the name and/or level of the task at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::IndexOutOfRange`] if `index >= len`, or a
    /// validation error for an invalid name. Nothing changes on error.
    pub fn edit(
        &mut self,
        index: usize,
        name: Option<String>,
        level: Option<Level>,
    ) -> Result<PendingWrites, TaskError> {
        self.order.get(index)?;
        if let Some(name) = &name {
            self.validate_name(name)?;
        }
        let task = self.order.get_mut(index)?;
        if let Some(name) = name {
            task.name = name;
        }
        if let Some(level) = level {
            task.level = level;
        }
        Ok(self.renormalize())
    }

    /// Reassigns `priority = position + 1` and rewrites every task.
    ///
    /// This is the only path that writes priorities. Call it again to
    /// retry after a [`PersistenceWarning`].
    pub fn renormalize(&mut self) -> PendingWrites {
        self.renormalize_with(Vec::new())
    }

    fn renormalize_with(&mut self, mut ops: Vec<(TaskId, WriteOp)>) -> PendingWrites {
        self.order.renormalize();
        self.needs_repair = false;
        ops.extend(
            self.order
                .tasks()
                .iter()
                .map(|task| (task.id.clone(), WriteOp::Put(task.record()))),
        );
        let pending = self.writer.submit(ops);
        tracing::info!(
            user = %self.user_id,
            generation = pending.generation(),
            tasks = self.order.len(),
            writes = pending.len(),
            "renormalized task list"
        );
        pending
    }

    fn validate_name(&self, name: &str) -> Result<(), TaskError> {
        if name.trim().is_empty() {
            return Err(TaskError::NameEmpty);
        }
        if name.chars().count() > self.options.max_name_len {
            return Err(TaskError::NameTooLong {
                max: self.options.max_name_len,
            });
        }
        Ok(())
    }

    fn validate_date(&self, date: String) -> Result<String, TaskError> {
        match NaiveDate::parse_from_str(&date, &self.options.date_format) {
            Ok(_) => Ok(date),
            Err(e) => Err(TaskError::InvalidDate(format!("{date}: {e}"))),
        }
    }
}
