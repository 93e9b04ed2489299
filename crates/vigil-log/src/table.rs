//! Tabular query rows.

use serde::Serialize;

use crate::result::{RunResult, ValidationStatus};

/// A row with fixed column names, for presentation layers.
pub trait Row {
  fn columns() -> &'static [&'static str];

  fn cells(&self) -> Vec<String>;
}

/// One play of a past execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
  pub uuid: String,
  pub validation: String,
  /// Aggregate status of the log the play came from.
  pub status: ValidationStatus,
  pub execution_at: String,
  pub duration: String,
}

impl Row for HistoryRow {
  fn columns() -> &'static [&'static str] {
    &["UUID", "Validations", "Status", "Execution at", "Duration"]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.uuid.clone(),
      self.validation.clone(),
      self.status.to_string(),
      self.execution_at.clone(),
      self.duration.clone(),
    ]
  }
}

/// One host affected by a task with the requested status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStatusRow {
  pub name: String,
  pub host: String,
  pub status: String,
  pub task_data: serde_json::Value,
}

impl Row for TaskStatusRow {
  fn columns() -> &'static [&'static str] {
    &["name", "host", "status", "task_data"]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.name.clone(),
      self.host.clone(),
      self.status.clone(),
      self.task_data.to_string(),
    ]
  }
}

impl Row for RunResult {
  fn columns() -> &'static [&'static str] {
    &[
      "UUID",
      "Validations",
      "Status",
      "Status_by_Host",
      "Host_Group",
      "Unreachable_Hosts",
      "Duration",
    ]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.uuid.clone(),
      self.validation.clone(),
      self.status.to_string(),
      self.status_by_host.clone(),
      self.host_group.clone(),
      self.unreachable_hosts.clone(),
      self.duration.clone(),
    ]
  }
}
