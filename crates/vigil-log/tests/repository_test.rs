//! Integration tests for LogRepository queries over a log directory.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde_json::json;
use vigil_log::{LogError, LogRepository, LogSelector, Row, ValidationLog, ValidationStatus};

fn play(uuid: &str, validation_id: &str, host: &str, start: &str) -> serde_json::Value {
  json!({
    "play": {
      "id": uuid,
      "host": host,
      "validation_id": validation_id,
      "validation_path": "/usr/share/ansible/validation-playbooks",
      "duration": {"start": start, "end": start, "time_elapsed": "0:00:01.000"}
    },
    "tasks": []
  })
}

/// Write a log for a passing run of `validation_id`.
fn write_passed(dir: &Path, uuid: &str, validation_id: &str, start: &str) -> PathBuf {
  write_log(
    dir,
    uuid,
    validation_id,
    start,
    json!({
      "plays": [play(uuid, validation_id, "undercloud", start)],
      "stats": {"undercloud": {"ok": 3, "failures": 0, "unreachable": 0}},
      "validation_output": []
    }),
  )
}

fn write_log(
  dir: &Path,
  uuid: &str,
  validation_id: &str,
  start: &str,
  content: serde_json::Value,
) -> PathBuf {
  let path = dir.join(format!("{}_{}_{}.json", uuid, validation_id, start));
  std::fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();
  path
}

fn set_mtime(path: &Path, secs_after_epoch: u64) {
  let file = File::options().write(true).open(path).unwrap();
  file
    .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs_after_epoch))
    .unwrap();
}

#[test]
fn test_lookup_by_uuid_and_validation_id() {
  let dir = tempfile::tempdir().unwrap();
  write_passed(dir.path(), "aaa", "check-ram", "2021-01-01T10:00:00.000000Z");
  write_passed(dir.path(), "bbb", "check-ram", "2021-01-02T10:00:00.000000Z");
  write_passed(dir.path(), "bbb", "check-cpu", "2021-01-02T10:00:05.000000Z");

  let repository = LogRepository::new(dir.path());
  assert_eq!(repository.by_validation_id("check-ram").unwrap().len(), 2);
  assert_eq!(repository.by_uuid("bbb").unwrap().len(), 2);
  assert_eq!(
    repository
      .by_uuid_and_validation_id("bbb", "check-cpu")
      .unwrap()
      .len(),
    1
  );
}

#[test]
fn test_validation_id_lookup_is_filename_only() {
  let dir = tempfile::tempdir().unwrap();
  write_passed(dir.path(), "aaa", "check", "2021-01-01T10:00:00.000000Z");
  // `check_ram` contains `_check_` too once the uuid prefix is accounted for.
  write_passed(dir.path(), "bbb", "check_ram", "2021-01-01T10:00:00.000000Z");

  let repository = LogRepository::new(dir.path());
  assert_eq!(repository.by_validation_id("check").unwrap().len(), 2);
}

#[test]
fn test_all_logfiles_matches_extension_substring() {
  let dir = tempfile::tempdir().unwrap();
  write_passed(dir.path(), "aaa", "check-ram", "2021-01-01T10:00:00.000000Z");
  std::fs::write(dir.path().join("notes.jsonx"), "{}").unwrap();
  std::fs::write(dir.path().join("notes.txt"), "").unwrap();
  std::fs::create_dir(dir.path().join("artifacts")).unwrap();

  let repository = LogRepository::new(dir.path());
  let files = repository.all_logfiles("json").unwrap();
  assert_eq!(files.len(), 2);
  assert!(files.iter().any(|f| f.ends_with("notes.jsonx")));
}

#[test]
fn test_results_for_many_uuids() {
  let dir = tempfile::tempdir().unwrap();
  write_passed(dir.path(), "aaa", "check-ram", "2021-01-01T10:00:00.000000Z");
  write_log(
    dir.path(),
    "bbb",
    "check-cpu",
    "2021-01-01T10:00:01.000000Z",
    json!({
      "plays": [play("bbb", "check-cpu", "compute-0", "2021-01-01T10:00:01.000000Z")],
      "stats": {
        "compute-0": {"failures": 1},
        "compute-1": {"unreachable": 1}
      }
    }),
  );

  let repository = LogRepository::new(dir.path());
  let results = repository
    .results(&["aaa".to_string(), "bbb".to_string()], None)
    .unwrap();

  assert_eq!(results.len(), 2);
  assert_eq!(results[0].uuid, "aaa");
  assert_eq!(results[0].status, ValidationStatus::Passed);
  assert_eq!(results[1].validation, "check-cpu");
  assert_eq!(results[1].status, ValidationStatus::Failed);
  assert_eq!(
    results[1].status_by_host,
    "compute-0,FAILED, compute-1,UNREACHABLE"
  );
  assert_eq!(results[1].unreachable_hosts, "compute-1");
  assert_eq!(results[1].host_group, "compute-0");

  let serialized = serde_json::to_value(&results[1]).unwrap();
  assert_eq!(serialized["Status"], "FAILED");
  assert_eq!(serialized["Validations"], "check-cpu");
  assert_eq!(results[1].cells().len(), vigil_log::RunResult::columns().len());
}

#[test]
fn test_results_restricted_to_validation() {
  let dir = tempfile::tempdir().unwrap();
  write_passed(dir.path(), "aaa", "check-ram", "2021-01-01T10:00:00.000000Z");
  write_passed(dir.path(), "aaa", "check-cpu", "2021-01-01T10:00:00.000000Z");

  let repository = LogRepository::new(dir.path());
  let results = repository
    .results(&["aaa".to_string()], Some("check-cpu"))
    .unwrap();
  assert_eq!(results.len(), 1);
  assert_eq!(results[0].validation, "check-cpu");
}

#[test]
fn test_results_require_identifier() {
  let dir = tempfile::tempdir().unwrap();
  let repository = LogRepository::new(dir.path());

  assert!(matches!(
    repository.results(&[], None),
    Err(LogError::NoIdentifier)
  ));
  assert!(matches!(
    repository.results(&[String::new()], None),
    Err(LogError::NoIdentifier)
  ));
}

#[test]
fn test_history_one_row_per_play() {
  let dir = tempfile::tempdir().unwrap();
  write_log(
    dir.path(),
    "aaa",
    "check-ram",
    "2021-01-01T10:00:00.000000Z",
    json!({
      "plays": [
        play("aaa", "check-ram", "undercloud", "2021-01-01T10:00:00.000000Z"),
        play("aaa", "check-ram", "overcloud", "2021-01-01T10:00:03.000000Z")
      ],
      "stats": {"overcloud": {"failures": 2}}
    }),
  );
  std::fs::write(dir.path().join("ccc_other_x.json"), r#"{"unrelated": true}"#).unwrap();

  let repository = LogRepository::new(dir.path());
  let rows = repository.history(&[], "json", None).unwrap();

  assert_eq!(rows.len(), 2);
  assert!(rows.iter().all(|row| row.status == ValidationStatus::Failed));
  assert_eq!(rows[1].execution_at, "2021-01-01T10:00:03.000000Z");
  assert_eq!(
    rows[0].cells(),
    vec![
      "aaa",
      "check-ram",
      "FAILED",
      "2021-01-01T10:00:00.000000Z",
      "0:00:01.000"
    ]
  );
}

#[test]
fn test_history_limit_keeps_most_recent() {
  let dir = tempfile::tempdir().unwrap();
  let oldest = write_passed(dir.path(), "aaa", "check-ram", "2021-01-01T10:00:00.000000Z");
  let newest = write_passed(dir.path(), "bbb", "check-ram", "2021-01-02T10:00:00.000000Z");
  let middle = write_passed(dir.path(), "ccc", "check-cpu", "2021-01-03T10:00:00.000000Z");
  set_mtime(&oldest, 1_000);
  set_mtime(&middle, 2_000);
  set_mtime(&newest, 3_000);

  let repository = LogRepository::new(dir.path());
  let rows = repository.history(&[], "json", Some(2)).unwrap();

  let uuids: Vec<&str> = rows.iter().map(|row| row.uuid.as_str()).collect();
  assert_eq!(uuids, vec!["ccc", "bbb"]);
}

#[test]
fn test_history_zero_limit_reads_every_log() {
  let dir = tempfile::tempdir().unwrap();
  write_passed(dir.path(), "aaa", "check-ram", "2021-01-01T10:00:00.000000Z");
  write_passed(dir.path(), "bbb", "check-cpu", "2021-01-02T10:00:00.000000Z");

  let repository = LogRepository::new(dir.path());
  let rows = repository.history(&[], "json", Some(0)).unwrap();
  assert_eq!(rows.len(), 2);
}

#[test]
fn test_history_by_validation_id() {
  let dir = tempfile::tempdir().unwrap();
  write_passed(dir.path(), "aaa", "check-ram", "2021-01-01T10:00:00.000000Z");
  write_passed(dir.path(), "bbb", "check-cpu", "2021-01-01T10:00:00.000000Z");

  let repository = LogRepository::new(dir.path());
  let rows = repository
    .history(&["check-cpu".to_string()], "json", None)
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].validation, "check-cpu");
}

#[test]
fn test_stats_counts_failures_by_validation_output() {
  let dir = tempfile::tempdir().unwrap();
  write_passed(dir.path(), "aaa", "check-ram", "2021-01-01T10:00:00.000000Z");
  // Host stats report a failure, but there is no validation output.
  write_log(
    dir.path(),
    "bbb",
    "check-ram",
    "2021-01-03T08:30:00.000000Z",
    json!({
      "plays": [play("bbb", "check-ram", "undercloud", "2021-01-03T08:30:00.000000Z")],
      "stats": {"undercloud": {"failures": 1}},
      "validation_output": []
    }),
  );
  // Host stats pass, but a task reported output.
  write_log(
    dir.path(),
    "ccc",
    "check-ram",
    "2021-01-02T10:00:00.000000Z",
    json!({
      "plays": [play("ccc", "check-ram", "undercloud", "2021-01-02T10:00:00.000000Z")],
      "stats": {"undercloud": {"failures": 0}},
      "validation_output": [{"task": {"name": "t", "status": "FAILED", "hosts": {}}}]
    }),
  );

  let repository = LogRepository::new(dir.path());
  let logs = repository.contents_by_validation("check-ram").unwrap();
  let stats = LogRepository::stats(&logs);

  assert_eq!(stats.execution_summary, "Total: 3, Passed: 2, Failed: 1");
  assert_eq!(stats.last_execution_date.as_deref(), Some("2021-01-03 08:30:00"));

  let bbb = logs.iter().find(|log| log.uuid() == "bbb").unwrap();
  assert_eq!(bbb.host_level_status(), ValidationStatus::Failed);
  assert_eq!(bbb.output_presence_status(), ValidationStatus::Passed);

  let ccc = logs.iter().find(|log| log.uuid() == "ccc").unwrap();
  assert_eq!(ccc.host_level_status(), ValidationStatus::Passed);
  assert_eq!(ccc.output_presence_status(), ValidationStatus::Failed);
}

#[test]
fn test_stats_without_dated_plays() {
  let dir = tempfile::tempdir().unwrap();
  let path = write_log(
    dir.path(),
    "aaa",
    "check-ram",
    "t",
    json!({"stats": {}}),
  );

  let logs = vec![ValidationLog::from_path(path).unwrap()];
  let stats = LogRepository::stats(&logs);
  assert_eq!(stats.last_execution_date, None);
  assert_eq!(stats.execution_summary, "Total: 1, Passed: 1, Failed: 0");
}

#[test]
fn test_task_status_by_uuid_and_validation() {
  let dir = tempfile::tempdir().unwrap();
  write_log(
    dir.path(),
    "aaa",
    "check-ram",
    "2021-01-01T10:00:00.000000Z",
    json!({
      "plays": [play("aaa", "check-ram", "all", "2021-01-01T10:00:00.000000Z")],
      "validation_output": [
        {"task": {
          "name": "Verify RAM",
          "status": "FAILED",
          "hosts": {
            "compute-0": {"msg": "2 GB available"},
            "compute-1": {"msg": "1 GB available"}
          }
        }},
        {"task": {"name": "Warn swap", "status": "WARNING", "hosts": {"compute-0": {}}}}
      ]
    }),
  );

  let repository = LogRepository::new(dir.path());

  let failed = repository
    .task_status(&LogSelector::Uuid("aaa".to_string()), "FAILED")
    .unwrap();
  assert_eq!(failed.len(), 2);
  assert_eq!(failed[0].name, "Verify RAM");
  assert_eq!(failed[0].host, "compute-0");
  assert_eq!(failed[0].task_data["msg"], "2 GB available");

  let warnings = repository
    .task_status(&LogSelector::Validation("check-ram".to_string()), "WARNING")
    .unwrap();
  assert_eq!(warnings.len(), 1);
  assert_eq!(warnings[0].host, "compute-0");
}
