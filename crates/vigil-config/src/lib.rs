//! Vigil Config
//!
//! Serializable configuration types for vigil. These are the documents a
//! caller hands to the orchestration layer: the [`Settings`] describing where
//! validations, groups and logs live, and the [`SkipList`] suppressing or
//! host-restricting specific validations for a run.
//!
//! Both can be loaded from:
//! - JSON files (`.json`)
//! - YAML files (`.yaml` / `.yml`)

mod error;
mod settings;
mod skip_list;

use std::path::Path;

use serde::de::DeserializeOwned;

pub use error::ConfigError;
pub use settings::{DEFAULT_BASE_DIR, DEFAULT_OUTPUT_CALLBACK, Settings};
pub use skip_list::{HostSelector, SkipEntry, SkipList};

/// Read a JSON or YAML document, picking the parser from the file extension.
pub(crate) fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
  if !path.is_file() {
    return Err(ConfigError::NotFound {
      path: path.to_path_buf(),
    });
  }

  let content = std::fs::read_to_string(path)?;
  match path.extension().and_then(|e| e.to_str()) {
    Some("json") => Ok(serde_json::from_str(&content)?),
    Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
    _ => Err(ConfigError::UnsupportedFormat {
      path: path.to_path_buf(),
    }),
  }
}
