//! tasker - persistent personal task list
//!
//! This library provides the storage and query layer behind the tasker CLI.
//! Tasks live as an ordered JSON list in a data directory next to a counter
//! file that hands out ascending numeric ids.
//!
//! # Core Concepts
//!
//! - **Task records**: title, description, category, deadline, priority, done flag
//! - **Id allocation**: a persisted counter, lenient when its file is damaged
//! - **Task store**: whole-file load/save with lookups by binary search on id
//! - **Pagination**: fixed-size pages over any ordered result
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `tasker.toml`
//! - `error`: Error types and result aliases
//! - `id_alloc`: Persisted id counter
//! - `output`: Human and JSON output envelopes
//! - `paginate`: Page splitting
//! - `storage`: Data directory layout and atomic JSON writes
//! - `task`: Task records and the task store

pub mod cli;
pub mod config;
pub mod error;
pub mod id_alloc;
pub mod output;
pub mod paginate;
pub mod storage;
pub mod task;

pub use error::{Error, Result};
