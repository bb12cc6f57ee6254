//! Shared leaderboard derived from completed tasks.
//!
//! Rankings are pure functions of a [`Snapshot`]: recomputed on every
//! read, never cached or stored. [`aggregate`] performs the single bulk
//! read and ranks the result; [`Leaderboard::from_snapshot`] ranks a
//! snapshot the caller already holds.
//!
//! [`Snapshot`]: taskboard_proto::user::Snapshot

pub mod ranking;
pub mod reward;

pub use ranking::{Leaderboard, LeaderboardEntry, PODIUM_SIZE, Standing};
pub use reward::Reward;

use thiserror::Error;

use crate::store::{StoreError, TaskStore};

/// Errors that can occur while building a leaderboard.
#[derive(Debug, Error)]
pub enum LeaderboardError {
    /// The all-users snapshot could not be read; no ranking was computed.
    #[error("snapshot read failed: {0}")]
    SnapshotReadFailed(#[source] StoreError),
}

/// Reads every user from the store and ranks them.
///
/// An empty store yields an empty leaderboard.
///
/// # Errors
///
/// Returns [`LeaderboardError::SnapshotReadFailed`] if the bulk read fails.
/// No partial ranking is produced.
pub async fn aggregate<S: TaskStore>(store: &S) -> Result<Leaderboard, LeaderboardError> {
    let snapshot = store.read_all_users().await.map_err(|e| {
        tracing::warn!(error = %e, "leaderboard snapshot read failed");
        LeaderboardError::SnapshotReadFailed(e)
    })?;
    let leaderboard = Leaderboard::from_snapshot(&snapshot);
    tracing::info!(users = leaderboard.len(), "leaderboard aggregated");
    Ok(leaderboard)
}
