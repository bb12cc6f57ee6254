//! Command dispatch for the `taskboard` binary.
//!
//! Each [`Command`] loads the state it needs from the store, applies one
//! operation, waits for the resulting writes and prints a human-readable
//! (or JSON) summary to the supplied writer. Positions on the command line
//! are 1-based; the task manager works with 0-based indices.

use std::io::Write;
use std::sync::Arc;

use taskboard_proto::task::Task;
use taskboard_proto::user::{InvalidUserId, User, UserId};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::{Command, Config, UserCommand};
use crate::leaderboard::{self, Leaderboard, LeaderboardError, Standing};
use crate::store::{StoreError, TaskStore};
use crate::tasks::{PendingWrites, PersistenceWarning, TaskDraft, TaskError, TaskManager};

/// Errors surfaced to the user by a command.
#[derive(Debug, Error)]
pub enum AppError {
    /// A task operation was rejected.
    #[error(transparent)]
    Task(#[from] TaskError),

    /// The leaderboard could not be built.
    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),

    /// A direct store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The command needs an acting user and none was configured.
    #[error("no user selected (pass --user, set TASKBOARD_USER or [user] id in the config file)")]
    NoUser,

    /// The configured user id is not valid.
    #[error("invalid user id: {0}")]
    InvalidUser(#[from] InvalidUserId),

    /// A 1-based position outside the list.
    #[error("no task at position {position} (list has {len})")]
    InvalidPosition {
        /// Position given on the command line.
        position: usize,
        /// Number of tasks in the list.
        len: usize,
    },

    /// Some writes of the batch were not stored.
    #[error("{failed} of {total} task writes failed; run `taskboard repair` to retry")]
    WritesFailed {
        /// Number of failed writes.
        failed: usize,
        /// Number of writes in the batch.
        total: usize,
    },

    /// Writing to the output failed.
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Runs one command against the store, printing results to `out`.
///
/// # Errors
///
/// Returns [`AppError`] if the command cannot be carried out, or if any
/// of its writes fail after the in-memory change was applied.
pub async fn run_command<S, W>(
    store: Arc<S>,
    config: &Config,
    command: Command,
    out: &mut W,
) -> Result<(), AppError>
where
    S: TaskStore + 'static,
    W: Write,
{
    match command {
        Command::User(UserCommand::Add { id, username }) => {
            let user_id = UserId::new(id)?;
            store.create_user(&User::new(user_id.clone(), username)).await?;
            tracing::info!(user = %user_id, "user registered");
            writeln!(out, "registered user {user_id}")?;
            Ok(())
        }
        Command::List => {
            let (manager, _warnings) = load_manager(store, config).await?;
            print_tasks(&manager, out)
        }
        Command::Add { name, level, date } => {
            let (mut manager, _warnings) = load_manager(store, config).await?;
            let mut draft = TaskDraft::new(name).with_level(level);
            if let Some(date) = date {
                draft = draft.with_date(date);
            }
            let (_, pending) = manager.add_task(draft)?;
            await_writes(pending, out).await?;
            writeln!(out, "added task at position {}", manager.len())?;
            Ok(())
        }
        Command::Up { position } => {
            let (mut manager, _warnings) = load_manager(store, config).await?;
            let index = to_index(position, manager.len())?;
            match manager.move_up(index)? {
                Some(pending) => {
                    await_writes(pending, out).await?;
                    writeln!(out, "moved task {position} up")?;
                }
                None => writeln!(out, "task {position} is already at the top")?,
            }
            Ok(())
        }
        Command::Down { position } => {
            let (mut manager, _warnings) = load_manager(store, config).await?;
            let index = to_index(position, manager.len())?;
            match manager.move_down(index)? {
                Some(pending) => {
                    await_writes(pending, out).await?;
                    writeln!(out, "moved task {position} down")?;
                }
                None => writeln!(out, "task {position} is already at the bottom")?,
            }
            Ok(())
        }
        Command::Delete { position } => {
            let (mut manager, _warnings) = load_manager(store, config).await?;
            let index = to_index(position, manager.len())?;
            let (removed, pending) = manager.delete(index)?;
            await_writes(pending, out).await?;
            writeln!(out, "deleted \"{}\"", removed.name)?;
            Ok(())
        }
        Command::Toggle { position } => {
            let (mut manager, _warnings) = load_manager(store, config).await?;
            let index = to_index(position, manager.len())?;
            let pending = manager.toggle_done(index)?;
            await_writes(pending, out).await?;
            let state = if manager.tasks()[index].is_done {
                "done"
            } else {
                "not done"
            };
            writeln!(out, "task {position} marked {state}")?;
            Ok(())
        }
        Command::Edit {
            position,
            name,
            level,
        } => {
            let (mut manager, _warnings) = load_manager(store, config).await?;
            let index = to_index(position, manager.len())?;
            let pending = manager.edit(index, name, level)?;
            await_writes(pending, out).await?;
            writeln!(out, "updated task {position}")?;
            Ok(())
        }
        Command::Repair => {
            let (mut manager, _warnings) = load_manager(store, config).await?;
            let pending = manager.renormalize();
            await_writes(pending, out).await?;
            writeln!(out, "rewrote {} task(s)", manager.len())?;
            Ok(())
        }
        Command::Leaderboard { top, json } => {
            let board = leaderboard::aggregate(store.as_ref()).await?;
            let k = top.unwrap_or(config.top_k);
            if json {
                let standings: Vec<Standing> = board.standings().take(k).collect();
                serde_json::to_writer_pretty(&mut *out, &standings)?;
                writeln!(out)?;
                Ok(())
            } else {
                print_leaderboard(&board, k, out)
            }
        }
        Command::Rank { json } => {
            let user_id = acting_user(config)?;
            let board = leaderboard::aggregate(store.as_ref()).await?;
            let standing = board.rank_of(&user_id);
            if json {
                serde_json::to_writer_pretty(&mut *out, &standing)?;
                writeln!(out)?;
                return Ok(());
            }
            match standing {
                Some(standing) => writeln!(
                    out,
                    "{} {} is ranked #{} of {}: score {}, {} completed ({})",
                    standing.reward.symbol(),
                    standing.username,
                    standing.rank,
                    board.len(),
                    standing.score,
                    standing.completed_tasks,
                    standing.reward,
                )?,
                None => writeln!(out, "{user_id}: rank N/A (not on the leaderboard)")?,
            }
            Ok(())
        }
    }
}

fn acting_user(config: &Config) -> Result<UserId, AppError> {
    let id = config.user_id.as_deref().ok_or(AppError::NoUser)?;
    Ok(UserId::new(id)?)
}

async fn load_manager<S: TaskStore + 'static>(
    store: Arc<S>,
    config: &Config,
) -> Result<(TaskManager<S>, mpsc::Receiver<PersistenceWarning>), AppError> {
    let user_id = acting_user(config)?;
    Ok(TaskManager::load(store, user_id, config.task_options()).await?)
}

/// Converts a 1-based position into an index, checking it against `len`.
const fn to_index(position: usize, len: usize) -> Result<usize, AppError> {
    if position == 0 || position > len {
        Err(AppError::InvalidPosition { position, len })
    } else {
        Ok(position - 1)
    }
}

/// Waits for a batch and reports any failed writes.
async fn await_writes<W: Write>(pending: PendingWrites, out: &mut W) -> Result<(), AppError> {
    let report = pending.wait().await;
    let failures = report.failures();
    if failures.is_empty() {
        return Ok(());
    }
    for (path, reason) in &failures {
        writeln!(out, "warning: {path} was not saved: {reason}")?;
    }
    Err(AppError::WritesFailed {
        failed: failures.len(),
        total: report.results.len(),
    })
}

fn print_tasks<S: TaskStore + 'static, W: Write>(
    manager: &TaskManager<S>,
    out: &mut W,
) -> Result<(), AppError> {
    if manager.needs_repair() {
        writeln!(
            out,
            "note: stored priorities were out of order; run `taskboard repair` to rewrite them"
        )?;
    }
    if manager.is_empty() {
        writeln!(out, "{} has no tasks", manager.username())?;
        return Ok(());
    }
    writeln!(out, "Tasks for {}:", manager.username())?;
    for (index, task) in manager.tasks().iter().enumerate() {
        writeln!(out, "{}", format_task(index + 1, task))?;
    }
    Ok(())
}

fn format_task(position: usize, task: &Task) -> String {
    let mark = if task.is_done { 'x' } else { ' ' };
    format!(
        "{position:>3}. [{mark}] {} ({}, {})",
        task.name, task.level, task.date
    )
}

fn print_leaderboard<W: Write>(board: &Leaderboard, k: usize, out: &mut W) -> Result<(), AppError> {
    if board.is_empty() {
        writeln!(out, "no users yet")?;
        return Ok(());
    }
    writeln!(out, "Podium")?;
    for standing in board.standings().take(board.podium().len()) {
        writeln!(
            out,
            "  {} {:<20} {} pts ({})",
            standing.reward.symbol(),
            standing.username,
            standing.score,
            standing.reward,
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Leaderboard")?;
    writeln!(
        out,
        "{:>4}  {:<20} {:>7} {:>5}  {}",
        "Rank", "User", "Score", "Done", "Reward"
    )?;
    for standing in board.standings() {
        writeln!(
            out,
            "{:>4}  {:<20} {:>7} {:>5}  {} {}",
            standing.rank,
            standing.username,
            standing.score,
            standing.completed_tasks,
            standing.reward.symbol(),
            standing.reward,
        )?;
    }

    // Comparison view.
    writeln!(out)?;
    writeln!(out, "Top {} by score", board.top(k).len())?;
    for standing in board.standings().take(k) {
        writeln!(out, "  {:<20} {:>7}", standing.username, standing.score)?;
    }
    Ok(())
}
