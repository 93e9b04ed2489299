//! Result types derived from execution logs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Aggregate outcome of a validation execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
  Passed,
  Failed,
}

impl fmt::Display for ValidationStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationStatus::Passed => f.write_str("PASSED"),
      ValidationStatus::Failed => f.write_str("FAILED"),
    }
  }
}

/// Outcome of a validation execution on one host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HostStatus {
  Passed,
  Failed,
  Unreachable,
}

impl fmt::Display for HostStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HostStatus::Passed => f.write_str("PASSED"),
      HostStatus::Failed => f.write_str("FAILED"),
      HostStatus::Unreachable => f.write_str("UNREACHABLE"),
    }
  }
}

/// One row of a run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
  #[serde(rename = "UUID")]
  pub uuid: String,
  #[serde(rename = "Validations")]
  pub validation: String,
  #[serde(rename = "Status")]
  pub status: ValidationStatus,
  /// `"host,STATUS"` pairs joined by `", "`.
  #[serde(rename = "Status_by_Host")]
  pub status_by_host: String,
  #[serde(rename = "Host_Group")]
  pub host_group: String,
  #[serde(rename = "Unreachable_Hosts")]
  pub unreachable_hosts: String,
  #[serde(rename = "Duration")]
  pub duration: String,
}

impl RunResult {
  pub fn is_failed(&self) -> bool {
    self.status == ValidationStatus::Failed
  }
}

/// Execution statistics of a validation across its logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationStats {
  /// Most recent play start, `%Y-%m-%d %H:%M:%S`.
  #[serde(rename = "Last execution date")]
  pub last_execution_date: Option<String>,
  /// `"Total: N, Passed: P, Failed: F"`.
  #[serde(rename = "Number of execution")]
  pub execution_summary: String,
  #[serde(skip)]
  pub total: usize,
  #[serde(skip)]
  pub passed: usize,
  #[serde(skip)]
  pub failed: usize,
}
