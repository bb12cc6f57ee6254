//! Configuration system for `Taskboard`.
//!
//! Settings are layered, highest priority first:
//! 1. command-line flags
//! 2. environment variables (clap `env`)
//! 3. the TOML file (`~/.config/taskboard/config.toml`)
//! 4. compiled defaults
//!
//! The default file may be absent. A file named with `--config` must exist.

use std::path::PathBuf;

use taskboard_proto::task::{Level, MAX_TASK_NAME_LENGTH};

use crate::tasks::TaskOptions;
use crate::tasks::manager::DEFAULT_DATE_FORMAT;

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// File schema (every field optional)
// ---------------------------------------------------------------------------

/// Whole settings file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    store: StoreFileConfig,
    user: UserFileConfig,
    tasks: TasksFileConfig,
    leaderboard: LeaderboardFileConfig,
    persistence: PersistenceFileConfig,
}

/// `[store]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StoreFileConfig {
    path: Option<PathBuf>,
}

/// `[user]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UserFileConfig {
    id: Option<String>,
}

/// `[tasks]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct TasksFileConfig {
    max_name_len: Option<usize>,
    date_format: Option<String>,
}

/// `[leaderboard]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct LeaderboardFileConfig {
    top_k: Option<usize>,
}

/// `[persistence]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct PersistenceFileConfig {
    warning_buffer: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Snapshot file backing the store.
    pub store_path: PathBuf,
    /// Acting user, passed explicitly to every command.
    pub user_id: Option<String>,
    /// Maximum task name length in characters.
    pub max_name_len: usize,
    /// chrono format string for task dates.
    pub date_format: String,
    /// Size of the leaderboard comparison view.
    pub top_k: usize,
    /// Capacity of the persistence warning channel.
    pub warning_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            user_id: None,
            max_name_len: MAX_TASK_NAME_LENGTH,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            top_k: 10,
            warning_buffer: 64,
        }
    }
}

impl Config {
    /// Merges flags, environment and the settings file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if the default config file exists but is invalid.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `Config` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            store_path: cli
                .store
                .clone()
                .or_else(|| file.store.path.clone())
                .unwrap_or(defaults.store_path),
            user_id: cli.user.clone().or_else(|| file.user.id.clone()),
            max_name_len: file.tasks.max_name_len.unwrap_or(defaults.max_name_len),
            date_format: file
                .tasks
                .date_format
                .clone()
                .unwrap_or(defaults.date_format),
            top_k: file.leaderboard.top_k.unwrap_or(defaults.top_k),
            warning_buffer: file
                .persistence
                .warning_buffer
                .unwrap_or(defaults.warning_buffer),
        }
    }

    /// Task manager options derived from this configuration.
    #[must_use]
    pub fn task_options(&self) -> TaskOptions {
        TaskOptions {
            max_name_len: self.max_name_len,
            date_format: self.date_format.clone(),
            warning_buffer: self.warning_buffer,
        }
    }
}

/// Global flags and the command to run.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Ordered personal task lists with a shared leaderboard")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/taskboard/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Snapshot file backing the store.
    #[arg(long, env = "TASKBOARD_STORE")]
    pub store: Option<PathBuf>,

    /// Acting user ID.
    #[arg(short, long, env = "TASKBOARD_USER")]
    pub user: Option<String>,

    /// Log filter directive, overridden by `RUST_LOG`.
    #[arg(long, default_value = "warn", env = "TASKBOARD_LOG")]
    pub log_level: String,

    /// Path to log file (default: stderr).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Commands understood by the CLI. Positions are 1-based.
#[derive(clap::Subcommand, Debug, Clone, Default, PartialEq, Eq)]
pub enum Command {
    /// Register a user.
    #[command(subcommand)]
    User(UserCommand),
    /// Show the acting user's tasks in order.
    #[default]
    List,
    /// Append a task at the bottom of the list.
    Add {
        /// Task name.
        name: String,
        /// Difficulty level (easy, medium, hard).
        #[arg(short, long, default_value = "easy")]
        level: Level,
        /// Calendar date (default: today).
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Move a task one position up.
    Up {
        /// Position of the task.
        position: usize,
    },
    /// Move a task one position down.
    Down {
        /// Position of the task.
        position: usize,
    },
    /// Delete a task.
    Delete {
        /// Position of the task.
        position: usize,
    },
    /// Toggle a task's completion flag.
    Toggle {
        /// Position of the task.
        position: usize,
    },
    /// Change a task's name or level.
    Edit {
        /// Position of the task.
        position: usize,
        /// New name.
        #[arg(short, long)]
        name: Option<String>,
        /// New difficulty level.
        #[arg(short, long)]
        level: Option<Level>,
    },
    /// Rewrite every task's priority from the current order.
    Repair,
    /// Show the leaderboard.
    Leaderboard {
        /// Size of the comparison view (default from config).
        #[arg(short, long)]
        top: Option<usize>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Show the acting user's rank.
    Rank {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

/// User management commands.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Register a new user with no tasks.
    Add {
        /// User ID.
        id: String,
        /// Display name.
        username: String,
    },
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Default snapshot location under the user's data directory.
fn default_store_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from("taskboard-snapshot.bin"),
        |dir| dir.join("taskboard").join("snapshot.bin"),
    )
}

/// Reads the settings file.
///
/// An explicit path must exist. Otherwise the default location is tried
/// and a missing file yields an empty schema.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("taskboard").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
