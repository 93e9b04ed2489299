use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::RunnerError;

/// Scratch directory allocated for one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDir {
  pub uuid: String,
  pub path: PathBuf,
}

/// UTC timestamp in the format used in log and artifact names,
/// e.g. `2020-03-30T13:17:22.447857Z`.
pub fn current_time() -> String {
  Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Allocate a fresh uuid and create
/// `{log_dir}/artifacts/{uuid}_{prefix}_{timestamp}`.
pub fn create_artifacts_dir(log_dir: &Path, prefix: &str) -> Result<ArtifactDir, RunnerError> {
  let uuid = uuid::Uuid::new_v4().to_string();
  let path = log_dir
    .join("artifacts")
    .join(format!("{}_{}_{}", uuid, prefix, current_time()));
  std::fs::create_dir_all(&path)?;

  Ok(ArtifactDir { uuid, path })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_create_artifacts_dir() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = create_artifacts_dir(dir.path(), "check-ram.yaml").unwrap();

    assert!(artifacts.path.is_dir());
    assert!(artifacts.path.starts_with(dir.path().join("artifacts")));
    let name = artifacts.path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with(&format!("{}_check-ram.yaml_", artifacts.uuid)));
    assert!(uuid::Uuid::parse_str(&artifacts.uuid).is_ok());
  }

  #[test]
  fn test_uuids_are_unique() {
    let dir = tempfile::tempdir().unwrap();
    let first = create_artifacts_dir(dir.path(), "a").unwrap();
    let second = create_artifacts_dir(dir.path(), "a").unwrap();
    assert_ne!(first.uuid, second.uuid);
    assert_ne!(first.path, second.path);
  }

  #[test]
  fn test_current_time_format() {
    let now = current_time();
    assert!(now.ends_with('Z'));
    assert!(chrono::NaiveDateTime::parse_from_str(&now, "%Y-%m-%dT%H:%M:%S%.fZ").is_ok());
  }
}
