use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Base directory shipped validation content is installed under.
pub const DEFAULT_BASE_DIR: &str = "/usr/share/ansible";

/// Output callback used when the caller does not pick one.
pub const DEFAULT_OUTPUT_CALLBACK: &str = "validation_stdout";

/// Filesystem locations and execution defaults for vigil.
///
/// Every field has a default, so a settings file only needs to list the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Directory holding the validation playbooks.
  pub validation_dir: PathBuf,

  /// Group definition document.
  pub group_file: PathBuf,

  /// Directory execution logs and artifacts are written to.
  pub log_dir: PathBuf,

  /// Base directory passed to the execution adapter (roles, plugins, ...).
  pub ansible_base_dir: PathBuf,

  /// Optional ansible.cfg handed to the execution adapter.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ansible_config: Option<PathBuf>,

  /// Name of the ansible stdout callback.
  pub output_callback: String,

  /// Inventory path or host list.
  pub inventory: String,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub python_interpreter: Option<String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub ssh_user: Option<String>,
}

impl Default for Settings {
  fn default() -> Self {
    let base_dir = PathBuf::from(DEFAULT_BASE_DIR);
    let log_dir = dirs::home_dir()
      .map(|home| home.join("validations"))
      .unwrap_or_else(|| PathBuf::from("validations"));

    Self {
      validation_dir: base_dir.join("validation-playbooks"),
      group_file: base_dir.join("groups.yaml"),
      log_dir,
      ansible_base_dir: base_dir,
      ansible_config: None,
      output_callback: DEFAULT_OUTPUT_CALLBACK.to_string(),
      inventory: "localhost".to_string(),
      python_interpreter: None,
      ssh_user: None,
    }
  }
}

impl Settings {
  /// Load settings from a JSON or YAML file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    crate::load_document(path)
  }
}
