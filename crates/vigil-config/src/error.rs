use std::path::PathBuf;

/// Errors raised while loading configuration documents.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The configuration file does not exist.
  #[error("configuration file not found: {}", path.display())]
  NotFound { path: PathBuf },

  /// The file extension is neither JSON nor YAML.
  #[error("unsupported configuration format: {}", path.display())]
  UnsupportedFormat { path: PathBuf },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid yaml: {0}")]
  Yaml(#[from] serde_yaml::Error),
}
