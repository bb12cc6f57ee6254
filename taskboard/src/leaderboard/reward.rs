//! Medal tiers shown next to each rank.

use serde::Serialize;

/// Reward tier for a leaderboard rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reward {
    /// Rank 1.
    Gold,
    /// Rank 2.
    Silver,
    /// Rank 3.
    Bronze,
    /// Every other rank.
    Participant,
}

impl Reward {
    /// Returns the reward for a 1-based rank.
    #[must_use]
    pub const fn for_rank(rank: usize) -> Self {
        match rank {
            1 => Self::Gold,
            2 => Self::Silver,
            3 => Self::Bronze,
            _ => Self::Participant,
        }
    }

    /// Get the display symbol for this reward.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Gold => "\u{1f3c6}",
            Self::Silver => "\u{1f948}",
            Self::Bronze => "\u{1f949}",
            Self::Participant => "\u{1f396}",
        }
    }
}

impl std::fmt::Display for Reward {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gold => write!(f, "Gold Medal"),
            Self::Silver => write!(f, "Silver Medal"),
            Self::Bronze => write!(f, "Bronze Medal"),
            Self::Participant => write!(f, "Participant"),
        }
    }
}
