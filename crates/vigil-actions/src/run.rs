//! The run pipeline: select, skip-check, execute, collect, query.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use vigil_config::{DEFAULT_BASE_DIR, DEFAULT_OUTPUT_CALLBACK, Settings, SkipList};
use vigil_log::{LogRepository, RunResult, ValidationStatus};
use vigil_runner::{
  GatheringPolicy, Inventory, RunOutcome, RunRequest, STATUS_FAILED, ValidationRunner,
  create_artifacts_dir,
};
use vigil_validation::{ValidationCatalog, ValidationFilter};

use crate::actions::ValidationActions;
use crate::error::RunError;
use crate::events::{RunEvent, RunNotifier};
use crate::skip::{SkipDecision, skip_playbook};

/// What to run and how.
#[derive(Debug, Clone)]
pub struct RunOptions {
  /// Validation ids, with or without the `.yaml` suffix.
  pub validation_names: Vec<String>,
  /// Selects by group, category or product. Takes precedence over
  /// `validation_names` when non-empty.
  pub filter: ValidationFilter,
  /// Overrides the configured validation directory for this run.
  pub validation_dir: Option<PathBuf>,
  pub inventory: Inventory,
  pub extra_vars: serde_json::Map<String, serde_json::Value>,
  pub extra_env_vars: BTreeMap<String, String>,
  pub limit_hosts: Option<String>,
  pub skip_list: SkipList,
  pub base_dir: PathBuf,
  pub connection: String,
  pub output_callback: String,
  pub ansible_config: Option<PathBuf>,
  pub python_interpreter: Option<String>,
  pub ssh_user: Option<String>,
  pub quiet: bool,
  /// Dispatch every playbook without waiting for it to finish.
  pub run_async: bool,
}

impl Default for RunOptions {
  fn default() -> Self {
    Self {
      validation_names: Vec::new(),
      filter: ValidationFilter::new(),
      validation_dir: None,
      inventory: Inventory::default(),
      extra_vars: serde_json::Map::new(),
      extra_env_vars: BTreeMap::new(),
      limit_hosts: None,
      skip_list: SkipList::new(),
      base_dir: PathBuf::from(DEFAULT_BASE_DIR),
      connection: "smart".to_string(),
      output_callback: DEFAULT_OUTPUT_CALLBACK.to_string(),
      ansible_config: None,
      python_interpreter: None,
      ssh_user: None,
      quiet: true,
      run_async: false,
    }
  }
}

impl From<&Settings> for RunOptions {
  fn from(settings: &Settings) -> Self {
    Self {
      inventory: Inventory::Path(settings.inventory.clone()),
      base_dir: settings.ansible_base_dir.clone(),
      output_callback: settings.output_callback.clone(),
      ansible_config: settings.ansible_config.clone(),
      python_interpreter: settings.python_interpreter.clone(),
      ssh_user: settings.ssh_user.clone(),
      ..Self::default()
    }
  }
}

/// What was recorded for one executed playbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
  pub playbook: String,
  pub rc_code: Option<i32>,
  pub status: String,
  /// Validation id of the playbook.
  pub validations: String,
  /// Uuid allocated for the execution.
  pub uuid: String,
}

impl ExecutionRecord {
  /// FAILED row standing in for an execution that left no log behind.
  fn missing_log_result(&self) -> RunResult {
    RunResult {
      uuid: self.uuid.clone(),
      validation: self.validations.clone(),
      status: ValidationStatus::Failed,
      status_by_host: String::new(),
      host_group: String::new(),
      unreachable_hosts: String::new(),
      duration: String::new(),
    }
  }
}

/// Result of [`ValidationActions::run_validations`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RunReport {
  /// Results read back from the execution logs.
  Completed(Vec<RunResult>),
  /// Records of dispatched executions that may still be running.
  Dispatched(Vec<ExecutionRecord>),
}

impl RunReport {
  /// Validations reported as failed.
  pub fn failed(&self) -> Vec<String> {
    match self {
      RunReport::Completed(results) => results
        .iter()
        .filter(|r| r.is_failed())
        .map(|r| r.validation.clone())
        .collect(),
      RunReport::Dispatched(records) => records
        .iter()
        .filter(|r| r.status == STATUS_FAILED)
        .map(|r| r.validations.clone())
        .collect(),
    }
  }

  /// Fail with [`RunError::ValidationsFailed`] when any validation failed.
  pub fn ensure_passed(&self) -> Result<(), RunError> {
    let failed = self.failed();
    if failed.is_empty() {
      Ok(())
    } else {
      Err(RunError::ValidationsFailed { failed })
    }
  }
}

impl<R: ValidationRunner, N: RunNotifier> ValidationActions<R, N> {
  /// Run the selected validations one after another and report on them.
  ///
  /// Playbooks execute strictly in selection order. Skip list entries
  /// covering all hosts suppress a playbook; entries naming hosts restrict
  /// the host limit for that playbook only. A runner error is recorded as a
  /// failed execution and the run goes on.
  #[instrument(
    name = "run_validations",
    skip(self, options),
    fields(names = ?options.validation_names, run_async = options.run_async)
  )]
  pub async fn run_validations(&self, options: RunOptions) -> Result<RunReport, RunError> {
    let catalog = match &options.validation_dir {
      Some(dir) => ValidationCatalog::new(dir),
      None => self.catalog.clone(),
    };

    let playbooks = select(&catalog, &options)?;
    info!(count = playbooks.len(), "validations selected");

    let mut records = Vec::new();
    let mut skipped = 0;
    for playbook in playbooks {
      let validation = file_stem(&playbook);

      let limit_hosts =
        match skip_playbook(&options.skip_list, &validation, options.limit_hosts.as_deref()) {
          SkipDecision::Skip => {
            skipped += 1;
            if let Some(entry) = options.skip_list.get(&validation) {
              self.notifier.notify(RunEvent::ValidationSkipped {
                validation: validation.clone(),
                hosts: entry.hosts.to_string(),
                reason: entry.reason.clone(),
                lp: entry.lp.clone(),
              });
            }
            continue;
          }
          SkipDecision::Run { limit_hosts } => limit_hosts,
        };

      let record = self.execute(&playbook, &validation, limit_hosts, &options).await?;
      records.push(record);
    }

    self.notifier.notify(RunEvent::RunCompleted {
      executed: records.len(),
      skipped,
    });

    if options.run_async {
      return Ok(RunReport::Dispatched(records));
    }
    if records.is_empty() {
      return Ok(RunReport::Completed(Vec::new()));
    }

    let logs = LogRepository::new(&self.config.log_dir);
    let mut results = Vec::with_capacity(records.len());
    for record in &records {
      let found = logs.results(std::slice::from_ref(&record.uuid), None)?;
      if found.is_empty() {
        warn!(
          validation = %record.validations,
          uuid = %record.uuid,
          status = %record.status,
          "no execution log written"
        );
        results.push(record.missing_log_result());
      } else {
        results.extend(found);
      }
    }
    Ok(RunReport::Completed(results))
  }

  async fn execute(
    &self,
    playbook: &Path,
    validation: &str,
    limit_hosts: Option<String>,
    options: &RunOptions,
  ) -> Result<ExecutionRecord, RunError> {
    let file_name = playbook
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    let artifacts = create_artifacts_dir(&self.config.log_dir, &file_name)?;

    info!(
      validation,
      uuid = %artifacts.uuid,
      limit_hosts = limit_hosts.as_deref().unwrap_or_default(),
      "validation started"
    );
    self.notifier.notify(RunEvent::ValidationStarted {
      validation: validation.to_string(),
      uuid: artifacts.uuid.clone(),
      limit_hosts: limit_hosts.clone(),
    });

    let request = RunRequest {
      uuid: artifacts.uuid.clone(),
      playbook: playbook.to_path_buf(),
      playbook_dir: playbook.parent().map(Path::to_path_buf).unwrap_or_default(),
      workdir: artifacts.path,
      base_dir: options.base_dir.clone(),
      log_dir: self.config.log_dir.clone(),
      inventory: options.inventory.clone(),
      extra_vars: options.extra_vars.clone(),
      extra_env_vars: options.extra_env_vars.clone(),
      limit_hosts,
      connection: options.connection.clone(),
      output_callback: options.output_callback.clone(),
      ansible_config: options.ansible_config.clone(),
      python_interpreter: options.python_interpreter.clone(),
      ssh_user: options.ssh_user.clone(),
      gathering_policy: GatheringPolicy::Explicit,
      parallel_run: true,
      quiet: options.quiet,
      run_async: options.run_async,
    };

    let outcome = match self.runner.run(request).await {
      Ok(outcome) => outcome,
      Err(e) => {
        error!(validation, uuid = %artifacts.uuid, error = %e, "runner failed");
        RunOutcome {
          playbook: file_name,
          rc_code: None,
          status: STATUS_FAILED.to_string(),
        }
      }
    };

    self.notifier.notify(RunEvent::ValidationCompleted {
      validation: validation.to_string(),
      uuid: artifacts.uuid.clone(),
      rc_code: outcome.rc_code,
      status: outcome.status.clone(),
    });

    Ok(ExecutionRecord {
      playbook: outcome.playbook,
      rc_code: outcome.rc_code,
      status: outcome.status,
      validations: validation.to_string(),
      uuid: artifacts.uuid,
    })
  }
}

/// Resolve the playbooks a run covers.
///
/// A non-empty filter wins over names. Every requested name must resolve.
fn select(catalog: &ValidationCatalog, options: &RunOptions) -> Result<Vec<PathBuf>, RunError> {
  if !options.filter.is_empty() {
    let validations = catalog.scan(&options.filter)?;
    return Ok(
      validations
        .iter()
        .map(|v| catalog.definition_path(v.id()))
        .collect(),
    );
  }

  if options.validation_names.is_empty() {
    return Err(RunError::NoValidations);
  }

  let playbooks = catalog.playbooks(&options.validation_names, &ValidationFilter::new())?;
  let found: Vec<String> = playbooks.iter().map(|p| file_stem(p)).collect();

  let mut missing: Vec<String> = options
    .validation_names
    .iter()
    .filter(|name| {
      let id = name.strip_suffix(".yaml").unwrap_or(name.as_str());
      !found.iter().any(|f| f == id)
    })
    .cloned()
    .collect();

  if !missing.is_empty() {
    missing.sort();
    missing.dedup();
    return Err(RunError::ValidationsNotFound {
      missing,
      dir: catalog.root().to_path_buf(),
    });
  }

  Ok(playbooks)
}

fn file_stem(path: &Path) -> String {
  path
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;
  use vigil_log::ValidationStatus;

  fn result(validation: &str, status: ValidationStatus) -> RunResult {
    RunResult {
      uuid: "1234".to_string(),
      validation: validation.to_string(),
      status,
      status_by_host: String::new(),
      host_group: String::new(),
      unreachable_hosts: String::new(),
      duration: String::new(),
    }
  }

  #[test]
  fn test_report_failed_rows() {
    let report = RunReport::Completed(vec![
      result("check-ram", ValidationStatus::Passed),
      result("check-cpu", ValidationStatus::Failed),
    ]);
    assert_eq!(report.failed(), vec!["check-cpu".to_string()]);
    assert!(matches!(
      report.ensure_passed(),
      Err(RunError::ValidationsFailed { .. })
    ));
  }

  #[test]
  fn test_dispatched_report_passes() {
    let report = RunReport::Dispatched(vec![ExecutionRecord {
      playbook: "check-ram.yaml".to_string(),
      rc_code: None,
      status: "unstarted".to_string(),
      validations: "check-ram".to_string(),
      uuid: "1234".to_string(),
    }]);
    assert!(report.ensure_passed().is_ok());
  }

  #[test]
  fn test_options_from_settings() {
    let settings = Settings {
      inventory: "/etc/ansible/hosts".to_string(),
      ssh_user: Some("stack".to_string()),
      ..Settings::default()
    };

    let options = RunOptions::from(&settings);
    assert_eq!(options.inventory, Inventory::Path("/etc/ansible/hosts".to_string()));
    assert_eq!(options.ssh_user.as_deref(), Some("stack"));
    assert_eq!(options.base_dir, settings.ansible_base_dir);
    assert!(options.quiet);
  }
}
