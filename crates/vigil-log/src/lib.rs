//! Vigil Log
//!
//! Execution logs written by the validation output callback, and the queries
//! built on top of them.
//!
//! Each execution produces one JSON document named
//! `{uuid}_{validation_id}_{timestamp}.json` in the log directory:
//!
//! ```text
//! {
//!   "plays": [ { "play": { "id", "host", "validation_id", "validation_path",
//!                           "duration": { "start", "end", "time_elapsed" } },
//!                "tasks": [...] } ],
//!   "stats": { "<host>": { "changed", "failures", "ignored", "ok",
//!                          "rescued", "skipped", "unreachable" } },
//!   "validation_output": [ { "task": { "name", "hosts": {...}, "status" } } ]
//! }
//! ```
//!
//! [`ValidationLog`] parses one document; [`LogRepository`] scans the log
//! directory and turns logs into [`RunResult`] rows, statistics and history.

mod document;
mod error;
mod log;
mod repository;
mod result;
mod table;

pub use document::{HostStats, LogDocument, OutputEntry, Play, PlayDuration, PlayEntry, TaskOutput};
pub use error::LogError;
pub use log::ValidationLog;
pub use repository::{LogRepository, LogSelector};
pub use result::{HostStatus, RunResult, ValidationStats, ValidationStatus};
pub use table::{HistoryRow, Row, TaskStatusRow};

/// Default extension of execution logs.
pub const DEFAULT_LOG_EXTENSION: &str = "json";
