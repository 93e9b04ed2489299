//! `ansible-playbook` process runner.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{error, info, instrument};

use crate::error::RunnerError;
use crate::{
  Inventory, RunOutcome, RunRequest, STATUS_FAILED, STATUS_SUCCESSFUL, ValidationRunner,
};

/// Callback writing the JSON execution log into `VALIDATIONS_LOG_DIR`.
const LOG_CALLBACK: &str = "validation_json";

/// Runs each playbook as an `ansible-playbook` child process.
///
/// The execution log is produced by the `validation_json` callback, which
/// reads the log directory and run uuid from the environment. With
/// `quiet`, the child's output goes to `stdout`/`stderr` files in the
/// artifact directory instead of the terminal.
#[derive(Debug, Clone)]
pub struct AnsiblePlaybookRunner {
  program: PathBuf,
}

impl Default for AnsiblePlaybookRunner {
  fn default() -> Self {
    Self::new()
  }
}

impl AnsiblePlaybookRunner {
  pub fn new() -> Self {
    Self::with_program("ansible-playbook")
  }

  /// Use a different executable, e.g. a wrapper script.
  pub fn with_program(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
    }
  }

  /// Environment exported to the child process. Caller supplied variables
  /// win over the computed ones.
  pub fn environment(request: &RunRequest) -> BTreeMap<String, String> {
    let base = request.base_dir.display();
    let mut env = BTreeMap::new();

    env.insert("ANSIBLE_UUID".to_string(), request.uuid.clone());
    env.insert(
      "VALIDATIONS_LOG_DIR".to_string(),
      absolute(&request.log_dir).display().to_string(),
    );
    env.insert(
      "ANSIBLE_STDOUT_CALLBACK".to_string(),
      request.output_callback.clone(),
    );
    env.insert(
      "ANSIBLE_CALLBACKS_ENABLED".to_string(),
      LOG_CALLBACK.to_string(),
    );
    env.insert(
      "ANSIBLE_GATHERING".to_string(),
      request.gathering_policy.to_string(),
    );
    env.insert("ANSIBLE_ROLES_PATH".to_string(), format!("{}/roles", base));
    env.insert("ANSIBLE_LIBRARY".to_string(), format!("{}/library", base));
    env.insert(
      "ANSIBLE_CALLBACK_PLUGINS".to_string(),
      format!("{}/callback_plugins", base),
    );
    env.insert(
      "ANSIBLE_LOOKUP_PLUGINS".to_string(),
      format!("{}/lookup_plugins", base),
    );
    if request.parallel_run {
      env.insert("ANSIBLE_STRATEGY".to_string(), "free".to_string());
    }
    if let Some(config) = &request.ansible_config {
      env.insert(
        "ANSIBLE_CONFIG".to_string(),
        absolute(config).display().to_string(),
      );
    }
    if let Some(interpreter) = &request.python_interpreter {
      env.insert(
        "ANSIBLE_PYTHON_INTERPRETER".to_string(),
        interpreter.clone(),
      );
    }

    for (key, value) in &request.extra_env_vars {
      env.insert(key.clone(), value.clone());
    }

    env
  }

  fn command(&self, request: &RunRequest) -> Result<Command, RunnerError> {
    // The child runs from the playbook directory, so every path handed to
    // it must not depend on our working directory.
    let inventory = match &request.inventory {
      Inventory::Path(path) if Path::new(path).exists() => {
        absolute(Path::new(path)).display().to_string()
      }
      Inventory::Path(hosts) => hosts.clone(),
      Inventory::Inline(document) => {
        let path = request.workdir.join("inventory.json");
        std::fs::write(&path, serde_json::to_string(document)?)?;
        absolute(&path).display().to_string()
      }
    };

    let mut command = Command::new(&self.program);
    command
      .arg(absolute(&request.playbook))
      .arg("--inventory")
      .arg(inventory)
      .arg("--connection")
      .arg(&request.connection)
      .current_dir(absolute(&request.playbook_dir))
      .envs(Self::environment(request));

    if let Some(limit) = &request.limit_hosts {
      command.arg("--limit").arg(limit);
    }
    if let Some(user) = &request.ssh_user {
      command.arg("--user").arg(user);
    }
    if !request.extra_vars.is_empty() {
      command
        .arg("--extra-vars")
        .arg(serde_json::to_string(&request.extra_vars)?);
    }

    if request.quiet {
      let stdout = std::fs::File::create(request.workdir.join("stdout"))?;
      let stderr = std::fs::File::create(request.workdir.join("stderr"))?;
      command.stdout(Stdio::from(stdout)).stderr(Stdio::from(stderr));
    }

    Ok(command)
  }
}

/// `path` resolved against the current directory when relative.
fn absolute(path: &Path) -> PathBuf {
  std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[async_trait]
impl ValidationRunner for AnsiblePlaybookRunner {
  #[instrument(
    name = "ansible_playbook",
    skip(self, request),
    fields(uuid = %request.uuid, playbook = %request.playbook.display())
  )]
  async fn run(&self, request: RunRequest) -> Result<RunOutcome, RunnerError> {
    let playbook = request
      .playbook
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();

    let mut child = self
      .command(&request)?
      .spawn()
      .map_err(|source| RunnerError::Spawn {
        program: self.program.display().to_string(),
        source,
      })?;

    if request.run_async {
      let uuid = request.uuid.clone();
      tokio::spawn(async move {
        match child.wait().await {
          Ok(status) => info!(uuid = %uuid, rc = ?status.code(), "background playbook finished"),
          Err(e) => error!(uuid = %uuid, error = %e, "background playbook failed"),
        }
      });
      return Ok(RunOutcome::unstarted(playbook));
    }

    let exit = child.wait().await?;
    let status = if exit.success() {
      STATUS_SUCCESSFUL
    } else {
      STATUS_FAILED
    };
    info!(rc = ?exit.code(), status, "playbook finished");

    Ok(RunOutcome {
      playbook,
      rc_code: exit.code(),
      status: status.to_string(),
    })
  }
}
