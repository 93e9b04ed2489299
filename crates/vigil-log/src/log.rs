use std::path::{Path, PathBuf};

use tracing::warn;

use crate::document::{LogDocument, Play, TaskOutput};
use crate::error::LogError;
use crate::result::{RunResult, ValidationStatus};

/// One parsed execution log.
///
/// The uuid, validation id and timestamp come from the file name
/// `{uuid}_{validation_id}_{timestamp}.{ext}`. The validation id may itself
/// contain underscores: the uuid is everything before the first `_` and the
/// timestamp everything after the last one.
#[derive(Debug, Clone)]
pub struct ValidationLog {
  path: PathBuf,
  uuid: String,
  validation_id: String,
  datetime: Option<String>,
  document: LogDocument,
}

impl ValidationLog {
  /// Load the log file at `path`.
  pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, LogError> {
    Self::open(path.into(), "", "")
  }

  /// Locate `{uuid}_{validation_id}_*.{extension}` in `log_dir` and load it.
  pub fn find(
    log_dir: &Path,
    uuid: &str,
    validation_id: &str,
    extension: &str,
  ) -> Result<Self, LogError> {
    if uuid.is_empty() || validation_id.is_empty() {
      return Err(LogError::MissingLocator);
    }

    let prefix = format!("{}_{}_", uuid, validation_id);
    let suffix = format!(".{}", extension);
    let not_found = || LogError::NotFound {
      path: log_dir.join(format!("{}*{}", prefix, suffix)),
    };

    if !log_dir.is_dir() {
      return Err(not_found());
    }

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
      let path = entry?.path();
      let matches = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(&suffix));
      if matches && path.is_file() {
        candidates.push(path);
      }
    }
    candidates.sort();

    let path = candidates.into_iter().next().ok_or_else(not_found)?;
    Self::open(path, uuid, validation_id)
  }

  fn open(path: PathBuf, uuid: &str, validation_id: &str) -> Result<Self, LogError> {
    let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
      std::io::ErrorKind::NotFound => LogError::NotFound { path: path.clone() },
      _ => LogError::Io(e),
    })?;
    let document: LogDocument =
      serde_json::from_str(&content).map_err(|source| LogError::Format {
        path: path.clone(),
        source,
      })?;

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let (uuid, validation_id, datetime) = match parse_log_name(stem) {
      Some((uuid, validation_id, datetime)) => (uuid, validation_id, Some(datetime)),
      None => {
        warn!(
          file = %path.display(),
          "wrong log file name, expected {{uuid}}_{{validation_id}}_{{timestamp}}"
        );
        (uuid.to_string(), validation_id.to_string(), None)
      }
    };

    Ok(Self {
      path,
      uuid,
      validation_id,
      datetime,
      document,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn uuid(&self) -> &str {
    &self.uuid
  }

  pub fn validation_id(&self) -> &str {
    &self.validation_id
  }

  /// Timestamp part of the file name.
  pub fn datetime(&self) -> Option<&str> {
    self.datetime.as_deref()
  }

  pub fn document(&self) -> &LogDocument {
    &self.document
  }

  /// A log is usable if it has at least one of `stats`, `validation_output`
  /// or `plays`.
  pub fn is_valid_format(&self) -> bool {
    self.document.plays.is_some()
      || self.document.stats.is_some()
      || self.document.validation_output.is_some()
  }

  /// FAILED if any host recorded failures or was unreachable.
  ///
  /// Missing or empty `stats` count as PASSED.
  pub fn host_level_status(&self) -> ValidationStatus {
    let failed = self
      .document
      .stats
      .iter()
      .flatten()
      .any(|(_, stats)| stats.failures > 0 || stats.unreachable > 0);

    if failed {
      ValidationStatus::Failed
    } else {
      ValidationStatus::Passed
    }
  }

  /// The status reported for this log in run results and history.
  pub fn status(&self) -> ValidationStatus {
    self.host_level_status()
  }

  /// FAILED if the log carries any `validation_output` entry.
  ///
  /// This is the criterion execution statistics count failures with; it
  /// can disagree with [`ValidationLog::host_level_status`].
  pub fn output_presence_status(&self) -> ValidationStatus {
    let has_output = self
      .document
      .validation_output
      .as_ref()
      .is_some_and(|output| !output.is_empty());

    if has_output {
      ValidationStatus::Failed
    } else {
      ValidationStatus::Passed
    }
  }

  /// `"host,STATUS"` for every host in `stats`, joined by `", "`.
  pub fn hosts_status(&self) -> String {
    self
      .document
      .stats
      .iter()
      .flatten()
      .map(|(host, stats)| format!("{},{}", host, stats.status()))
      .collect::<Vec<_>>()
      .join(", ")
  }

  /// Hosts targeted by the plays, joined by `", "`.
  pub fn host_group(&self) -> String {
    self
      .plays()
      .filter_map(|play| play.host.as_deref())
      .collect::<Vec<_>>()
      .join(", ")
  }

  pub fn unreachable_hosts(&self) -> String {
    self
      .document
      .stats
      .iter()
      .flatten()
      .filter(|(_, stats)| stats.unreachable > 0)
      .map(|(host, _)| host.as_str())
      .collect::<Vec<_>>()
      .join(", ")
  }

  /// Elapsed time of the first play that recorded one.
  pub fn duration(&self) -> String {
    self
      .plays()
      .find_map(|play| play.duration.time_elapsed.clone())
      .unwrap_or_default()
  }

  /// Start time of the first play that recorded one.
  pub fn start_time(&self) -> String {
    self
      .plays()
      .find_map(|play| play.duration.start.clone())
      .unwrap_or_default()
  }

  pub fn plays(&self) -> impl Iterator<Item = &Play> {
    self.document.plays.iter().flatten().map(|entry| &entry.play)
  }

  pub fn task_outputs(&self) -> impl Iterator<Item = &TaskOutput> {
    self
      .document
      .validation_output
      .iter()
      .flatten()
      .map(|entry| &entry.task)
  }

  pub fn to_run_result(&self) -> RunResult {
    RunResult {
      uuid: self.uuid.clone(),
      validation: self.validation_id.clone(),
      status: self.status(),
      status_by_host: self.hosts_status(),
      host_group: self.host_group(),
      unreachable_hosts: self.unreachable_hosts(),
      duration: self.duration(),
    }
  }
}

/// Split a log file stem into `(uuid, validation_id, timestamp)`.
fn parse_log_name(stem: &str) -> Option<(String, String, String)> {
  let (uuid, rest) = stem.split_once('_')?;
  let (validation_id, datetime) = rest.rsplit_once('_')?;
  Some((uuid.to_string(), validation_id.to_string(), datetime.to_string()))
}
