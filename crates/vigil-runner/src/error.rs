/// Errors that prevent a playbook from being run at all.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
  #[error("failed to start {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to serialize runner input: {0}")]
  Serialize(#[from] serde_json::Error),
}
