//! Serde model of an execution log document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::result::HostStatus;

/// A whole execution log. Every section is optional; see
/// [`crate::ValidationLog::is_valid_format`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogDocument {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub plays: Option<Vec<PlayEntry>>,

  /// Per-host counters, keyed by host name.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub stats: Option<BTreeMap<String, HostStats>>,

  /// Tasks that reported a validation failure.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub validation_output: Option<Vec<OutputEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayEntry {
  pub play: Play,
  #[serde(default)]
  pub tasks: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Play {
  /// The run uuid the play belongs to.
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub host: Option<String>,
  #[serde(default)]
  pub validation_id: String,
  #[serde(default)]
  pub validation_path: Option<String>,
  #[serde(default)]
  pub duration: PlayDuration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayDuration {
  #[serde(default)]
  pub start: Option<String>,
  #[serde(default)]
  pub end: Option<String>,
  #[serde(default)]
  pub time_elapsed: Option<String>,
}

/// Ansible play recap counters for one host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStats {
  #[serde(default)]
  pub changed: u64,
  #[serde(default)]
  pub failures: u64,
  #[serde(default)]
  pub ignored: u64,
  #[serde(default)]
  pub ok: u64,
  #[serde(default)]
  pub rescued: u64,
  #[serde(default)]
  pub skipped: u64,
  #[serde(default)]
  pub unreachable: u64,
}

impl HostStats {
  /// Failures take precedence over unreachability.
  pub fn status(&self) -> HostStatus {
    if self.failures > 0 {
      HostStatus::Failed
    } else if self.unreachable > 0 {
      HostStatus::Unreachable
    } else {
      HostStatus::Passed
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEntry {
  pub task: TaskOutput,
}

/// A failed task and the per-host detail it reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub hosts: BTreeMap<String, serde_json::Value>,
  #[serde(default)]
  pub status: String,
}
