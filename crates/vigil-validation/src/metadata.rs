use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A play as far as metadata extraction is concerned. Everything but `vars`
/// (hosts, roles, tasks, ...) is left to the execution engine.
#[derive(Debug, Deserialize)]
struct PlayDefinition {
  #[serde(default)]
  vars: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
  #[serde(default)]
  name: Option<String>,
  #[serde(default)]
  description: Option<String>,
  #[serde(default)]
  groups: Option<Vec<String>>,
  #[serde(default)]
  categories: Option<Vec<String>>,
  #[serde(default)]
  products: Option<Vec<String>>,
}

/// Typed metadata of one validation definition.
///
/// The id is the definition's file stem. Values are fixed at load time;
/// every discovery scan builds fresh instances.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationMetadata {
  id: String,
  name: String,
  description: String,
  groups: Vec<String>,
  categories: Vec<String>,
  products: Vec<String>,
  parameters: BTreeMap<String, serde_json::Value>,
}

/// Display projection of [`ValidationMetadata`] with capitalized keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedMetadata {
  #[serde(rename = "ID")]
  pub id: String,
  #[serde(rename = "Name")]
  pub name: String,
  #[serde(rename = "Description")]
  pub description: String,
  #[serde(rename = "Groups")]
  pub groups: Vec<String>,
  #[serde(rename = "Categories")]
  pub categories: Vec<String>,
  #[serde(rename = "Products")]
  pub products: Vec<String>,
}

impl ValidationMetadata {
  /// Load the metadata of the validation definition at `path`.
  ///
  /// Fails with [`ValidationError::Schema`] when the document is not a list
  /// of plays or the first play has no `vars.metadata` mapping. Missing
  /// `groups`, `categories` or `products` default to empty.
  pub fn load(path: &Path) -> Result<Self, ValidationError> {
    let id = path
      .file_stem()
      .and_then(|s| s.to_str())
      .ok_or_else(|| ValidationError::schema(path, "file name is not valid utf-8"))?
      .to_string();

    let document = crate::read_yaml(path)?;
    let plays: Vec<PlayDefinition> = serde_yaml::from_value(document)
      .map_err(|e| ValidationError::schema(path, format!("expected a list of plays: {}", e)))?;

    let mut vars = plays
      .into_iter()
      .next()
      .ok_or_else(|| ValidationError::schema(path, "definition contains no play"))?
      .vars
      .ok_or_else(|| ValidationError::schema(path, format!("no metadata found in validation {}", id)))?;

    let metadata = vars
      .remove("metadata")
      .ok_or_else(|| ValidationError::schema(path, format!("no metadata found in validation {}", id)))?;
    let raw: RawMetadata = serde_json::from_value(metadata)
      .map_err(|e| ValidationError::schema(path, format!("invalid metadata: {}", e)))?;

    Ok(Self {
      id,
      name: raw.name.unwrap_or_default(),
      description: raw.description.unwrap_or_default(),
      groups: ordered_set(raw.groups),
      categories: ordered_set(raw.categories),
      products: ordered_set(raw.products),
      parameters: vars.into_iter().collect(),
    })
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn groups(&self) -> &[String] {
    &self.groups
  }

  pub fn categories(&self) -> &[String] {
    &self.categories
  }

  pub fn products(&self) -> &[String] {
    &self.products
  }

  /// The play variables other than `metadata`.
  pub fn parameters(&self) -> &BTreeMap<String, serde_json::Value> {
    &self.parameters
  }

  pub fn formatted(&self) -> FormattedMetadata {
    FormattedMetadata {
      id: self.id.clone(),
      name: self.name.clone(),
      description: self.description.clone(),
      groups: self.groups.clone(),
      categories: self.categories.clone(),
      products: self.products.clone(),
    }
  }
}

/// Drop repeated entries, keeping the first occurrence.
fn ordered_set(values: Option<Vec<String>>) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  for value in values.unwrap_or_default() {
    if !out.contains(&value) {
      out.push(value);
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
  }

  #[test]
  fn test_load_full_definition() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
      dir.path(),
      "check-ram.yaml",
      r#"
- hosts: all
  vars:
    metadata:
      name: Check RAM
      description: Verify the amount of memory
      groups: [prep, post, prep]
      categories: [hardware]
      products: [tripleo]
    minimal_ram_gb: 8
  roles:
    - check-ram
"#,
    );

    let metadata = ValidationMetadata::load(&path).unwrap();
    assert_eq!(metadata.id(), "check-ram");
    assert_eq!(metadata.name(), "Check RAM");
    assert_eq!(metadata.description(), "Verify the amount of memory");
    assert_eq!(metadata.groups(), ["prep", "post"]);
    assert_eq!(metadata.categories(), ["hardware"]);
    assert_eq!(metadata.products(), ["tripleo"]);
    assert_eq!(metadata.parameters().len(), 1);
    assert_eq!(metadata.parameters()["minimal_ram_gb"], serde_json::json!(8));
  }

  #[test]
  fn test_missing_axes_default_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
      dir.path(),
      "minimal.yaml",
      "- hosts: all\n  vars:\n    metadata:\n      name: Minimal\n",
    );

    let metadata = ValidationMetadata::load(&path).unwrap();
    assert!(metadata.groups().is_empty());
    assert!(metadata.categories().is_empty());
    assert!(metadata.products().is_empty());
    assert!(metadata.parameters().is_empty());
  }

  #[test]
  fn test_missing_metadata_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
      dir.path(),
      "no-meta.yaml",
      "- hosts: all\n  vars:\n    foo: bar\n",
    );

    let result = ValidationMetadata::load(&path);
    assert!(matches!(result, Err(ValidationError::Schema { .. })));
  }

  #[test]
  fn test_missing_vars_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "no-vars.yaml", "- hosts: all\n  roles: [foo]\n");

    let result = ValidationMetadata::load(&path);
    assert!(matches!(result, Err(ValidationError::Schema { .. })));
  }

  #[test]
  fn test_wrong_top_level_type_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "mapping.yaml", "hosts: all\n");

    let result = ValidationMetadata::load(&path);
    assert!(matches!(result, Err(ValidationError::Schema { .. })));
  }

  #[test]
  fn test_missing_file_is_not_found() {
    let result = ValidationMetadata::load(Path::new("/nonexistent/check.yaml"));
    assert!(matches!(result, Err(ValidationError::NotFound { .. })));
  }

  #[test]
  fn test_invalid_yaml_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "broken.yaml", "- hosts: [all\n");

    let result = ValidationMetadata::load(&path);
    assert!(matches!(result, Err(ValidationError::Parse { .. })));
  }

  #[test]
  fn test_formatted_uses_display_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
      dir.path(),
      "check-cpu.yaml",
      "- hosts: all\n  vars:\n    metadata:\n      name: Check CPU\n      groups: [prep]\n",
    );

    let formatted = ValidationMetadata::load(&path).unwrap().formatted();
    let json = serde_json::to_value(&formatted).unwrap();
    assert_eq!(json["ID"], "check-cpu");
    assert_eq!(json["Name"], "Check CPU");
    assert_eq!(json["Groups"], serde_json::json!(["prep"]));
    assert_eq!(json["Products"], serde_json::json!([]));
  }
}
