//! Read-only queries over validation definitions, groups and logs.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;
use vigil_log::{HistoryRow, LogError, LogRepository, LogSelector, TaskStatusRow};
use vigil_runner::ValidationRunner;
use vigil_validation::{GroupRegistry, ValidationCatalog, ValidationFilter, ValidationMetadata};

use crate::error::ShowError;
use crate::events::{NoopNotifier, RunNotifier};
use crate::rows::{GroupInfoRow, ValidationDetails, ValidationParameters, ValidationRow};

/// Directories the actions operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionsConfig {
  pub validation_dir: PathBuf,
  pub log_dir: PathBuf,
}

impl From<&vigil_config::Settings> for ActionsConfig {
  fn from(settings: &vigil_config::Settings) -> Self {
    Self {
      validation_dir: settings.validation_dir.clone(),
      log_dir: settings.log_dir.clone(),
    }
  }
}

/// Output format of exported validation parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParameterFormat {
  #[default]
  Json,
  Yaml,
}

impl FromStr for ParameterFormat {
  type Err = ShowError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "json" => Ok(ParameterFormat::Json),
      "yaml" => Ok(ParameterFormat::Yaml),
      other => Err(ShowError::UnsupportedFormat(other.to_string())),
    }
  }
}

impl fmt::Display for ParameterFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ParameterFormat::Json => f.write_str("json"),
      ParameterFormat::Yaml => f.write_str("yaml"),
    }
  }
}

impl ParameterFormat {
  /// Render exported parameters in this format.
  pub fn render(
    &self,
    parameters: &BTreeMap<String, ValidationParameters>,
  ) -> Result<String, ShowError> {
    Ok(match self {
      ParameterFormat::Json => serde_json::to_string_pretty(parameters)?,
      ParameterFormat::Yaml => serde_yaml::to_string(parameters)?,
    })
  }
}

/// Entry point for listing, showing, running and reporting on validations.
///
/// The runner executes playbooks; the notifier receives run lifecycle
/// events. Queries that do not execute anything ignore both.
pub struct ValidationActions<R: ValidationRunner, N: RunNotifier = NoopNotifier> {
  pub(crate) config: ActionsConfig,
  pub(crate) catalog: ValidationCatalog,
  pub(crate) runner: R,
  pub(crate) notifier: N,
}

impl<R: ValidationRunner> ValidationActions<R, NoopNotifier> {
  pub fn new(config: ActionsConfig, runner: R) -> Self {
    Self::with_notifier(config, runner, NoopNotifier)
  }
}

impl<R: ValidationRunner, N: RunNotifier> ValidationActions<R, N> {
  pub fn with_notifier(config: ActionsConfig, runner: R, notifier: N) -> Self {
    let catalog = ValidationCatalog::new(&config.validation_dir);
    Self {
      config,
      catalog,
      runner,
      notifier,
    }
  }

  pub fn config(&self) -> &ActionsConfig {
    &self.config
  }

  pub fn runner(&self) -> &R {
    &self.runner
  }

  fn logs(&self) -> LogRepository {
    LogRepository::new(&self.config.log_dir)
  }

  /// Validations matching `filter`, one row each, in file name order.
  pub fn list_validations(&self, filter: &ValidationFilter) -> Result<Vec<ValidationRow>, ShowError> {
    let validations = self.catalog.scan(filter)?;
    Ok(validations.iter().map(ValidationRow::from).collect())
  }

  /// Metadata, parameters and execution statistics of one validation.
  pub fn show_validations(&self, validation_id: &str) -> Result<ValidationDetails, ShowError> {
    let metadata =
      self
        .catalog
        .get(validation_id)?
        .ok_or_else(|| ShowError::ValidationNotFound {
          id: validation_id.to_string(),
          dir: self.catalog.root().to_path_buf(),
        })?;

    let logs = self.logs().contents_by_validation(validation_id)?;
    debug!(validation = validation_id, logs = logs.len(), "loaded validation logs");

    Ok(ValidationDetails {
      metadata: metadata.formatted(),
      parameters: metadata.parameters().clone(),
      stats: LogRepository::stats(&logs),
    })
  }

  /// Every group of `group_file` with the number of validations in it.
  pub fn group_information(&self, group_file: &Path) -> Result<Vec<GroupInfoRow>, ShowError> {
    let registry = GroupRegistry::load(group_file)?;
    if registry.is_empty() {
      return Ok(Vec::new());
    }

    let validations = self
      .catalog
      .scan(&ValidationFilter::new().with_groups(registry.names()))?;

    Ok(
      registry
        .iter()
        .map(|group| GroupInfoRow {
          group: group.name.clone(),
          description: group.description.clone(),
          validation_count: validations
            .iter()
            .filter(|v| v.groups().contains(&group.name))
            .count(),
        })
        .collect(),
    )
  }

  /// Parameters of the validations named in `names` or matching `filter`,
  /// keyed by validation id. With `download_file`, the rendered document is
  /// also written there.
  pub fn show_validations_parameters(
    &self,
    names: &[String],
    filter: &ValidationFilter,
    format: ParameterFormat,
    download_file: Option<&Path>,
  ) -> Result<BTreeMap<String, ValidationParameters>, ShowError> {
    let mut parameters = BTreeMap::new();
    for playbook in self.catalog.playbooks(names, filter)? {
      let metadata = ValidationMetadata::load(&playbook)?;
      parameters.insert(
        metadata.id().to_string(),
        ValidationParameters {
          parameters: metadata.parameters().clone(),
        },
      );
    }

    if let Some(path) = download_file {
      let document = format.render(&parameters)?;
      std::fs::write(path, document).map_err(|source| ShowError::Write {
        path: path.to_path_buf(),
        source,
      })?;
      debug!(file = %path.display(), %format, "parameters written");
    }

    Ok(parameters)
  }

  /// Past executions, one row per play.
  pub fn show_history(
    &self,
    validation_ids: &[String],
    extension: &str,
    limit: Option<usize>,
  ) -> Result<Vec<HistoryRow>, LogError> {
    self.logs().history(validation_ids, extension, limit)
  }

  /// Hosts affected by tasks with `status` in the selected logs.
  pub fn get_status(
    &self,
    selector: &LogSelector,
    status: &str,
  ) -> Result<Vec<TaskStatusRow>, LogError> {
    self.logs().task_status(selector, status)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parameter_format_from_str() {
    assert_eq!("json".parse::<ParameterFormat>().unwrap(), ParameterFormat::Json);
    assert_eq!("yaml".parse::<ParameterFormat>().unwrap(), ParameterFormat::Yaml);

    let err = "xml".parse::<ParameterFormat>().unwrap_err();
    assert!(matches!(err, ShowError::UnsupportedFormat(ref f) if f == "xml"));
    assert_eq!(err.to_string(), "xml output format not supported");
  }

  #[test]
  fn test_render_parameters() {
    let mut parameters = BTreeMap::new();
    parameters.insert(
      "check-ram".to_string(),
      ValidationParameters {
        parameters: BTreeMap::from([("minimal_ram_gb".to_string(), serde_json::json!(8))]),
      },
    );

    let json = ParameterFormat::Json.render(&parameters).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["check-ram"]["parameters"]["minimal_ram_gb"], 8);

    let yaml = ParameterFormat::Yaml.render(&parameters).unwrap();
    assert!(yaml.contains("minimal_ram_gb: 8"));
  }
}
