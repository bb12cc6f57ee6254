//! Tracked, fire-and-forget persistence of task documents.
//!
//! Each renormalization becomes one batch of writes, stamped with a
//! monotonically increasing generation. Every write runs as its own
//! tokio task, so writes of one batch (and of successive batches) may
//! complete in any order.
//!
//! Writes to the same task pass through a per-task gate that remembers
//! the newest generation already stored. A write from an older generation
//! that reaches the gate after a newer one succeeded is skipped
//! ([`WriteOutcome::Superseded`]), so the store converges to the most
//! recent renormalization.
//!
//! A failed write never rolls back the in-memory order. It is:
//! 1. logged via `tracing::warn!`
//! 2. emitted as a [`PersistenceWarning`] on the warning channel
//! 3. reported as [`WriteOutcome::Failed`] in the batch's [`WriteReport`]
//!
//! Recovery is to renormalize again, which rewrites every task.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use taskboard_proto::path::DocumentPath;
use taskboard_proto::task::{TaskId, TaskRecord};
use taskboard_proto::user::UserId;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::store::TaskStore;

/// One document write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Write the full task record.
    Put(TaskRecord),
    /// Remove the task document.
    Remove,
}

/// How a single tracked write ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The store accepted the write.
    Written,
    /// A newer generation had already been stored for this task.
    Superseded,
    /// The store rejected the write.
    Failed(String),
}

/// Warning emitted when a task write fails.
///
/// The UI layer should watch for these and decide whether to show a
/// notice or renormalize again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceWarning {
    /// One task document could not be written.
    WriteFailed {
        /// Document that could not be written.
        path: DocumentPath,
        /// Renormalization generation the write belonged to.
        generation: u64,
        /// Description of the error.
        reason: String,
    },
}

/// Outcome of every write in one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    /// Renormalization generation of the batch.
    pub generation: u64,
    /// Per-document outcome, in submission order.
    pub results: Vec<(DocumentPath, WriteOutcome)>,
}

impl WriteReport {
    /// Number of writes the store accepted.
    #[must_use]
    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, WriteOutcome::Written))
    }

    /// Number of writes skipped in favour of a newer generation.
    #[must_use]
    pub fn superseded(&self) -> usize {
        self.count(|o| matches!(o, WriteOutcome::Superseded))
    }

    /// Paths and reasons of the writes that failed.
    #[must_use]
    pub fn failures(&self) -> Vec<(&DocumentPath, &str)> {
        self.results
            .iter()
            .filter_map(|(path, outcome)| match outcome {
                WriteOutcome::Failed(reason) => Some((path, reason.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Returns `true` if no write in the batch failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures().is_empty()
    }

    fn count(&self, pred: impl Fn(&WriteOutcome) -> bool) -> usize {
        self.results.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Handle to the in-flight writes of one batch.
///
/// Dropping the handle does not cancel the writes.
#[derive(Debug)]
pub struct PendingWrites {
    generation: u64,
    handles: Vec<(DocumentPath, JoinHandle<WriteOutcome>)>,
}

impl PendingWrites {
    /// Renormalization generation of the batch.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of writes in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if the batch holds no writes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Waits for every write of the batch and collects the outcomes.
    pub async fn wait(self) -> WriteReport {
        let mut results = Vec::with_capacity(self.handles.len());
        for (path, handle) in self.handles {
            let outcome = handle
                .await
                .unwrap_or_else(|e| WriteOutcome::Failed(format!("write task aborted: {e}")));
            results.push((path, outcome));
        }
        WriteReport {
            generation: self.generation,
            results,
        }
    }
}

/// Spawns and tracks task writes for one user.
pub struct TaskWriter<S: TaskStore + 'static> {
    store: Arc<S>,
    user_id: UserId,
    generation: AtomicU64,
    /// Task ID -> newest generation stored for it.
    gates: parking_lot::Mutex<HashMap<TaskId, Arc<Mutex<u64>>>>,
    warning_tx: mpsc::Sender<PersistenceWarning>,
}

impl<S: TaskStore + 'static> TaskWriter<S> {
    /// Creates a writer for `user_id`.
    ///
    /// Returns the writer and a receiver for [`PersistenceWarning`] events.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        user_id: UserId,
        warning_buffer: usize,
    ) -> (Self, mpsc::Receiver<PersistenceWarning>) {
        let (tx, rx) = mpsc::channel(warning_buffer.max(1));
        let writer = Self {
            store,
            user_id,
            generation: AtomicU64::new(0),
            gates: parking_lot::Mutex::new(HashMap::new()),
            warning_tx: tx,
        };
        (writer, rx)
    }

    /// Spawns one write per entry as a new generation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, ops: Vec<(TaskId, WriteOp)>) -> PendingWrites {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let handles = ops
            .into_iter()
            .map(|(task_id, op)| {
                let path = DocumentPath::task(self.user_id.clone(), task_id.clone());
                let gate = self.gate(&task_id);
                let store = Arc::clone(&self.store);
                let warning_tx = self.warning_tx.clone();
                let write_path = path.clone();
                let handle = tokio::spawn(async move {
                    run_gated(&*store, &gate, generation, write_path, op, &warning_tx).await
                });
                (path, handle)
            })
            .collect();
        PendingWrites {
            generation,
            handles,
        }
    }

    fn gate(&self, task_id: &TaskId) -> Arc<Mutex<u64>> {
        Arc::clone(self.gates.lock().entry(task_id.clone()).or_default())
    }
}

/// Performs one write behind its task gate.
async fn run_gated<S: TaskStore>(
    store: &S,
    gate: &Mutex<u64>,
    generation: u64,
    path: DocumentPath,
    op: WriteOp,
    warning_tx: &mpsc::Sender<PersistenceWarning>,
) -> WriteOutcome {
    let mut stored = gate.lock().await;
    if *stored > generation {
        tracing::debug!(path = %path, generation, newer = *stored, "task write superseded");
        return WriteOutcome::Superseded;
    }

    let DocumentPath::Task(user_id, task_id) = &path else {
        return WriteOutcome::Failed(format!("not a task document: {path}"));
    };
    let result = match &op {
        WriteOp::Put(record) => store.write_task(user_id, task_id, record).await,
        WriteOp::Remove => store.remove_task(user_id, task_id).await,
    };

    match result {
        Ok(()) => {
            *stored = generation;
            tracing::debug!(path = %path, generation, "task write stored");
            WriteOutcome::Written
        }
        Err(err) => {
            drop(stored);
            tracing::warn!(
                path = %path,
                generation,
                error = %err,
                "task write failed, in-memory order kept"
            );
            let reason = err.to_string();
            // Dropped when the channel is full.
            let _ = warning_tx.try_send(PersistenceWarning::WriteFailed {
                path,
                generation,
                reason: reason.clone(),
            });
            WriteOutcome::Failed(reason)
        }
    }
}
