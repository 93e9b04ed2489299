use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::LogError;
use crate::log::ValidationLog;
use crate::result::{RunResult, ValidationStats, ValidationStatus};
use crate::table::{HistoryRow, TaskStatusRow};

/// Which logs a task status query looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSelector {
  Validation(String),
  Uuid(String),
}

/// The directory execution logs are written to.
///
/// Lookups by uuid or validation id match file names only, following the
/// `{uuid}_{validation_id}_{timestamp}.{ext}` convention. A validation id
/// that is a prefix of another id can therefore match the other id's logs
/// when the rest of the name lines up.
#[derive(Debug, Clone)]
pub struct LogRepository {
  root: PathBuf,
}

impl LogRepository {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Logs of validation `validation_id` (`*_{validation_id}_*`).
  pub fn by_validation_id(&self, validation_id: &str) -> Result<Vec<PathBuf>, LogError> {
    let needle = format!("_{}_", validation_id);
    self.matching(|name| name.contains(&needle))
  }

  /// Logs of run `uuid` (`{uuid}_*`).
  pub fn by_uuid(&self, uuid: &str) -> Result<Vec<PathBuf>, LogError> {
    let prefix = format!("{}_", uuid);
    self.matching(|name| name.starts_with(&prefix))
  }

  /// Logs of validation `validation_id` in run `uuid` (`{uuid}_{validation_id}_*`).
  pub fn by_uuid_and_validation_id(
    &self,
    uuid: &str,
    validation_id: &str,
  ) -> Result<Vec<PathBuf>, LogError> {
    let prefix = format!("{}_{}_", uuid, validation_id);
    self.matching(|name| name.starts_with(&prefix))
  }

  /// Every log whose extension contains `extension`.
  ///
  /// The match is a substring test on `.{ext}`, so `json` also matches
  /// `foo.jsonx`.
  pub fn all_logfiles(&self, extension: &str) -> Result<Vec<PathBuf>, LogError> {
    self.matching_paths(|path| {
      let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
      ext.contains(extension)
    })
  }

  /// Load every log of validation `validation_id`.
  pub fn contents_by_validation(&self, validation_id: &str) -> Result<Vec<ValidationLog>, LogError> {
    self
      .by_validation_id(validation_id)?
      .into_iter()
      .map(ValidationLog::from_path)
      .collect()
  }

  /// Execution statistics over `logs`.
  ///
  /// A log counts as failed when it carries validation output
  /// ([`ValidationLog::output_presence_status`]), not by its host stats.
  pub fn stats(logs: &[ValidationLog]) -> ValidationStats {
    let total = logs.len();
    let failed = logs
      .iter()
      .filter(|log| log.output_presence_status() == ValidationStatus::Failed)
      .count();
    let passed = total - failed;

    let last_execution_date = logs
      .iter()
      .filter_map(|log| {
        let start = log.plays().next()?.duration.start.as_deref()?;
        parse_play_start(start)
      })
      .max()
      .map(|date| date.format("%Y-%m-%d %H:%M:%S").to_string());

    ValidationStats {
      last_execution_date,
      execution_summary: format!("Total: {}, Passed: {}, Failed: {}", total, passed, failed),
      total,
      passed,
      failed,
    }
  }

  /// Run results for each uuid, optionally restricted to one validation.
  pub fn results(
    &self,
    uuids: &[String],
    validation_id: Option<&str>,
  ) -> Result<Vec<RunResult>, LogError> {
    if uuids.is_empty() || uuids.iter().any(|uuid| uuid.is_empty()) {
      return Err(LogError::NoIdentifier);
    }

    let mut results = Vec::new();
    for uuid in uuids {
      let files = match validation_id {
        Some(validation_id) => self.by_uuid_and_validation_id(uuid, validation_id)?,
        None => self.by_uuid(uuid)?,
      };
      for file in files {
        results.push(ValidationLog::from_path(file)?.to_run_result());
      }
    }

    Ok(results)
  }

  /// One row per play of past executions.
  ///
  /// Logs come from `validation_ids` when given, else every log with
  /// `extension`. With a non-zero `limit`, only the `limit` most recently
  /// modified logs are read; `Some(0)` reads every log. Logs without any
  /// known section are skipped.
  pub fn history(
    &self,
    validation_ids: &[String],
    extension: &str,
    limit: Option<usize>,
  ) -> Result<Vec<HistoryRow>, LogError> {
    let mut files = if validation_ids.is_empty() {
      self.all_logfiles(extension)?
    } else {
      let mut files = Vec::new();
      for validation_id in validation_ids {
        files.extend(self.by_validation_id(validation_id)?);
      }
      files
    };

    if let Some(limit) = limit.filter(|limit| *limit > 0) {
      files = most_recent(files, limit)?;
    }

    let mut rows = Vec::new();
    for file in files {
      let log = ValidationLog::from_path(&file)?;
      if !log.is_valid_format() {
        debug!(file = %file.display(), "skipping log with unknown format");
        continue;
      }

      let status = log.status();
      for play in log.plays() {
        rows.push(HistoryRow {
          uuid: play.id.clone(),
          validation: play.validation_id.clone(),
          status,
          execution_at: play.duration.start.clone().unwrap_or_default(),
          duration: play.duration.time_elapsed.clone().unwrap_or_default(),
        });
      }
    }

    Ok(rows)
  }

  /// Hosts affected by tasks whose status equals `status`.
  pub fn task_status(
    &self,
    selector: &LogSelector,
    status: &str,
  ) -> Result<Vec<TaskStatusRow>, LogError> {
    let files = match selector {
      LogSelector::Validation(validation_id) => self.by_validation_id(validation_id)?,
      LogSelector::Uuid(uuid) => self.by_uuid(uuid)?,
    };

    let mut rows = Vec::new();
    for file in files {
      let log = ValidationLog::from_path(&file)?;
      if !log.is_valid_format() {
        continue;
      }

      for task in log.task_outputs().filter(|task| task.status == status) {
        for (host, detail) in &task.hosts {
          rows.push(TaskStatusRow {
            name: task.name.clone(),
            host: host.clone(),
            status: task.status.clone(),
            task_data: detail.clone(),
          });
        }
      }
    }

    Ok(rows)
  }

  fn matching(&self, predicate: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>, LogError> {
    self.matching_paths(|path| {
      path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(&predicate)
    })
  }

  /// Regular files directly under the root accepted by `predicate`, sorted
  /// by name. A missing log directory holds no logs.
  fn matching_paths(&self, predicate: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>, LogError> {
    if !self.root.is_dir() {
      return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&self.root)? {
      let path = entry?.path();
      if path.is_file() && predicate(&path) {
        files.push(path);
      }
    }
    files.sort();

    Ok(files)
  }
}

/// Keep the `limit` most recently modified files, oldest first.
fn most_recent(files: Vec<PathBuf>, limit: usize) -> Result<Vec<PathBuf>, LogError> {
  let mut dated: Vec<(SystemTime, PathBuf)> = files
    .into_iter()
    .map(|path| -> std::io::Result<(SystemTime, PathBuf)> {
      Ok((std::fs::metadata(&path)?.modified()?, path))
    })
    .collect::<Result<_, _>>()?;
  dated.sort_by_key(|(modified, _)| *modified);

  let skip = dated.len().saturating_sub(limit);
  Ok(dated.into_iter().skip(skip).map(|(_, path)| path).collect())
}

fn parse_play_start(start: &str) -> Option<NaiveDateTime> {
  let trimmed = start.trim_end_matches('Z');
  NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_play_start() {
    let parsed = parse_play_start("2020-03-30T13:17:22.447857Z").unwrap();
    assert_eq!(parsed.format("%Y-%m-%d %H:%M:%S").to_string(), "2020-03-30 13:17:22");
    assert!(parse_play_start("yesterday").is_none());
  }

  #[test]
  fn test_missing_root_has_no_logs() {
    let repository = LogRepository::new("/nonexistent/logs");
    assert!(repository.all_logfiles("json").unwrap().is_empty());
    assert!(repository.by_uuid("123").unwrap().is_empty());
  }
}
