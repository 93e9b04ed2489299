use std::path::PathBuf;

use vigil_log::LogError;
use vigil_runner::RunnerError;
use vigil_validation::ValidationError;

/// Errors raised by the run pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
  /// Some requested validation names have no definition.
  #[error("validation(s) {missing:?} not found in {}", dir.display())]
  ValidationsNotFound { missing: Vec<String>, dir: PathBuf },

  /// The request named no validation, group, category or product.
  #[error("no validations found")]
  NoValidations,

  /// Raised by callers that treat any FAILED result as an error.
  #[error("validation(s) {failed:?} failed")]
  ValidationsFailed { failed: Vec<String> },

  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error(transparent)]
  Log(#[from] LogError),

  #[error(transparent)]
  Runner(#[from] RunnerError),
}

/// Errors raised by read-only queries.
#[derive(Debug, thiserror::Error)]
pub enum ShowError {
  #[error("validation {id} not found in the path: {}", dir.display())]
  ValidationNotFound { id: String, dir: PathBuf },

  #[error("{0} output format not supported")]
  UnsupportedFormat(String),

  #[error("failed to write {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error(transparent)]
  Log(#[from] LogError),

  #[error("json serialization failed: {0}")]
  Json(#[from] serde_json::Error),

  #[error("yaml serialization failed: {0}")]
  Yaml(#[from] serde_yaml::Error),
}
