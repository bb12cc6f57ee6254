//! Shared data model and storage encoding for `Taskboard`.

pub mod codec;
pub mod path;
pub mod task;
pub mod user;
