//! Score computation and deterministic ranking.
//!
//! Score is the sum of `priority` over completed tasks, so finishing a
//! task further down the list is worth more than finishing one at the
//! top. Sort keys, in order:
//! 1. `score` descending
//! 2. `completed_tasks` descending
//! 3. snapshot order (stable sort)

use serde::Serialize;
use taskboard_proto::user::{Snapshot, User, UserId};

use super::reward::Reward;

/// Number of entries shown on the podium.
pub const PODIUM_SIZE: usize = 3;

/// Derived per-user totals. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// User the totals belong to.
    pub user_id: UserId,
    /// Display name.
    pub username: String,
    /// Number of tasks with `is_done = true`.
    pub completed_tasks: usize,
    /// Sum of `priority` over tasks with `is_done = true`.
    pub score: u64,
}

impl LeaderboardEntry {
    /// Computes the totals for one user. Unfinished tasks contribute nothing.
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        let (completed_tasks, score) = user
            .tasks
            .values()
            .filter(|task| task.is_done)
            .fold((0, 0u64), |(count, score), task| {
                (count + 1, score + u64::from(task.priority))
            });
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            completed_tasks,
            score,
        }
    }
}

/// One entry together with its position in the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    /// 1-based position.
    pub rank: usize,
    /// User the standing belongs to.
    pub user_id: UserId,
    /// Display name.
    pub username: String,
    /// Number of completed tasks.
    pub completed_tasks: usize,
    /// Sum of completed task priorities.
    pub score: u64,
    /// Reward tier for the rank.
    pub reward: Reward,
}

impl Standing {
    fn new(rank: usize, entry: &LeaderboardEntry) -> Self {
        Self {
            rank,
            user_id: entry.user_id.clone(),
            username: entry.username.clone(),
            completed_tasks: entry.completed_tasks,
            score: entry.score,
            reward: Reward::for_rank(rank),
        }
    }
}

/// All users of a snapshot in ranked order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Ranks every user of the snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut entries: Vec<LeaderboardEntry> =
            snapshot.users.iter().map(LeaderboardEntry::from_user).collect();
        // `sort_by` is stable: full ties keep snapshot order.
        entries.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.completed_tasks.cmp(&a.completed_tasks))
        });
        Self { entries }
    }

    /// Entries in ranked order; rank is index + 1.
    #[must_use]
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Number of ranked users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no users are ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first `k` entries, or all of them if there are fewer.
    #[must_use]
    pub fn top(&self, k: usize) -> &[LeaderboardEntry] {
        &self.entries[..k.min(self.entries.len())]
    }

    /// The top [`PODIUM_SIZE`] entries.
    #[must_use]
    pub fn podium(&self) -> &[LeaderboardEntry] {
        self.top(PODIUM_SIZE)
    }

    /// Every entry with its rank and reward.
    pub fn standings(&self) -> impl Iterator<Item = Standing> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| Standing::new(index + 1, entry))
    }

    /// Looks up a user's standing.
    ///
    /// Returns `None` if the user is not in the snapshot.
    #[must_use]
    pub fn rank_of(&self, user_id: &UserId) -> Option<Standing> {
        self.entries
            .iter()
            .position(|entry| entry.user_id == *user_id)
            .map(|index| Standing::new(index + 1, &self.entries[index]))
    }
}
