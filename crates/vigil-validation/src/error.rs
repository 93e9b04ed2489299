use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
  #[error("not found: {}", path.display())]
  NotFound { path: PathBuf },

  #[error("failed to parse {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  /// The document parsed but does not have the expected shape.
  #[error("invalid definition {}: {message}", path.display())]
  Schema { path: PathBuf, message: String },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl ValidationError {
  pub(crate) fn schema(path: &std::path::Path, message: impl Into<String>) -> Self {
    ValidationError::Schema {
      path: path.to_path_buf(),
      message: message.into(),
    }
  }
}
