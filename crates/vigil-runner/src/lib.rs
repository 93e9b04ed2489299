//! Vigil Runner
//!
//! The seam between vigil and the engine that actually executes playbooks.
//!
//! - [`ValidationRunner`] is the execution adapter contract: it receives a
//!   [`RunRequest`] and reports a [`RunOutcome`].
//! - [`create_artifacts_dir`] allocates the per-execution uuid and scratch
//!   directory.
//! - [`AnsiblePlaybookRunner`] runs `ansible-playbook` as a child process.

mod ansible;
mod artifacts;
mod error;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use ansible::AnsiblePlaybookRunner;
pub use artifacts::{ArtifactDir, create_artifacts_dir, current_time};
pub use error::RunnerError;

/// Status reported by a synchronous run that succeeded.
pub const STATUS_SUCCESSFUL: &str = "successful";
/// Status reported by a synchronous run that failed.
pub const STATUS_FAILED: &str = "failed";
/// Status reported while an asynchronous run has not completed.
pub const STATUS_UNSTARTED: &str = "unstarted";

/// Hosts to run against: an inventory path or host list, or an inline
/// inventory document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Inventory {
  Path(String),
  Inline(serde_json::Value),
}

impl Default for Inventory {
  fn default() -> Self {
    Inventory::Path("localhost".to_string())
  }
}

/// Ansible fact gathering policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatheringPolicy {
  Smart,
  Implicit,
  #[default]
  Explicit,
}

impl fmt::Display for GatheringPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GatheringPolicy::Smart => f.write_str("smart"),
      GatheringPolicy::Implicit => f.write_str("implicit"),
      GatheringPolicy::Explicit => f.write_str("explicit"),
    }
  }
}

/// Everything the execution engine needs to run one playbook.
#[derive(Debug, Clone)]
pub struct RunRequest {
  /// Uuid allocated for this execution; the log file is named after it.
  pub uuid: String,
  pub playbook: PathBuf,
  pub playbook_dir: PathBuf,
  /// Artifact directory for this execution.
  pub workdir: PathBuf,
  /// Directory holding roles and plugins.
  pub base_dir: PathBuf,
  /// Directory execution logs are written to.
  pub log_dir: PathBuf,
  pub inventory: Inventory,
  pub extra_vars: serde_json::Map<String, serde_json::Value>,
  pub extra_env_vars: BTreeMap<String, String>,
  /// Ansible host pattern restricting the run.
  pub limit_hosts: Option<String>,
  pub connection: String,
  pub output_callback: String,
  pub ansible_config: Option<PathBuf>,
  pub python_interpreter: Option<String>,
  pub ssh_user: Option<String>,
  pub gathering_policy: GatheringPolicy,
  pub parallel_run: bool,
  pub quiet: bool,
  /// Return without waiting for the execution to finish.
  pub run_async: bool,
}

/// What the execution engine reported for one playbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
  pub playbook: String,
  /// `None` while an asynchronous run is pending or when the engine
  /// produced no exit code.
  pub rc_code: Option<i32>,
  pub status: String,
}

impl RunOutcome {
  pub fn unstarted(playbook: impl Into<String>) -> Self {
    Self {
      playbook: playbook.into(),
      rc_code: None,
      status: STATUS_UNSTARTED.to_string(),
    }
  }

  pub fn is_failed(&self) -> bool {
    self.status == STATUS_FAILED || self.rc_code.is_some_and(|rc| rc != 0)
  }
}

/// Executes playbooks on behalf of the orchestration layer.
///
/// Implementations decide how the playbook runs (child process, remote
/// service, test stub). A failing playbook is reported through the
/// [`RunOutcome`]; errors are reserved for the run not being possible at all.
#[async_trait]
pub trait ValidationRunner: Send + Sync {
  async fn run(&self, request: RunRequest) -> Result<RunOutcome, RunnerError>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_inventory_untagged() {
    let path: Inventory = serde_json::from_str(r#""/etc/ansible/hosts""#).unwrap();
    assert_eq!(path, Inventory::Path("/etc/ansible/hosts".to_string()));

    let inline: Inventory =
      serde_json::from_str(r#"{"all": {"hosts": {"undercloud": {}}}}"#).unwrap();
    assert!(matches!(inline, Inventory::Inline(_)));
  }

  #[test]
  fn test_outcome_failure_markers() {
    let ok = RunOutcome {
      playbook: "check-ram.yaml".into(),
      rc_code: Some(0),
      status: STATUS_SUCCESSFUL.into(),
    };
    assert!(!ok.is_failed());

    let rc = RunOutcome {
      rc_code: Some(2),
      ..ok.clone()
    };
    assert!(rc.is_failed());

    let status = RunOutcome {
      rc_code: None,
      status: STATUS_FAILED.into(),
      ..ok
    };
    assert!(status.is_failed());

    assert!(!RunOutcome::unstarted("check-ram.yaml").is_failed());
  }

  #[test]
  fn test_gathering_policy_display() {
    assert_eq!(GatheringPolicy::default().to_string(), "explicit");
  }
}
