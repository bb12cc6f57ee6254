//! `Taskboard`: ordered personal task lists with a shared completion leaderboard.

pub mod app;
pub mod config;
pub mod leaderboard;
pub mod store;
pub mod tasks;
