use std::path::PathBuf;

/// Errors that can occur while reading execution logs.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
  /// Neither a log file nor a uuid and validation id pair was given.
  #[error("a logfile or a validation id and uuid is required")]
  MissingLocator,

  #[error("log file not found: {}", path.display())]
  NotFound { path: PathBuf },

  /// The log file is not valid JSON or does not match the log schema.
  #[error("bad json format in {}: {source}", path.display())]
  Format {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  /// A results query was made without any run identifier.
  #[error("at least one non-empty uuid is required to look up results")]
  NoIdentifier,

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}
