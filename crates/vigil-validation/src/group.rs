use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A named validation group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupDefinition {
  pub name: String,
  pub description: String,
}

/// One entry of the on-disk list kept under each group name.
#[derive(Debug, Deserialize)]
struct RawGroupEntry {
  #[serde(default)]
  description: Option<String>,
}

/// Group definitions keyed by name.
///
/// The on-disk document maps each group name to a one-element list:
/// ```yaml
/// prep:
///   - description: Validations run before deployment
/// post:
///   - description: Validations run after deployment
/// ```
/// Only the first list entry is read.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
  groups: BTreeMap<String, GroupDefinition>,
}

impl GroupRegistry {
  /// Load the group definition document at `path`.
  pub fn load(path: &Path) -> Result<Self, ValidationError> {
    let document = crate::read_yaml(path)?;
    if document.is_null() {
      return Ok(Self::default());
    }

    let raw: BTreeMap<String, Option<Vec<RawGroupEntry>>> = serde_yaml::from_value(document)
      .map_err(|e| ValidationError::schema(path, format!("expected a mapping of groups: {}", e)))?;

    let groups = raw
      .into_iter()
      .map(|(name, entries)| {
        let description = entries
          .and_then(|entries| entries.into_iter().next())
          .and_then(|entry| entry.description)
          .unwrap_or_default();
        let definition = GroupDefinition {
          name: name.clone(),
          description,
        };
        (name, definition)
      })
      .collect();

    Ok(Self { groups })
  }

  /// Group names in sorted order.
  pub fn names(&self) -> Vec<String> {
    self.groups.keys().cloned().collect()
  }

  /// `(name, description)` pairs in sorted name order.
  pub fn formatted(&self) -> Vec<(String, String)> {
    self
      .groups
      .values()
      .map(|g| (g.name.clone(), g.description.clone()))
      .collect()
  }

  pub fn get(&self, name: &str) -> Option<&GroupDefinition> {
    self.groups.get(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = &GroupDefinition> {
    self.groups.values()
  }

  pub fn len(&self) -> usize {
    self.groups.len()
  }

  pub fn is_empty(&self) -> bool {
    self.groups.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const GROUPS: &str = r#"
prep:
  - description: Validations which can be run before deployment
post:
  - description: Validations which can be run after deployment
no-description:
  - {}
"#;

  fn load(content: &str) -> GroupRegistry {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("groups.yaml");
    std::fs::write(&path, content).unwrap();
    GroupRegistry::load(&path).unwrap()
  }

  #[test]
  fn test_names_are_sorted() {
    let registry = load(GROUPS);
    assert_eq!(registry.names(), vec!["no-description", "post", "prep"]);
  }

  #[test]
  fn test_formatted_takes_first_description() {
    let registry = load(GROUPS);
    let formatted = registry.formatted();
    assert_eq!(formatted.len(), 3);
    assert_eq!(
      formatted[1],
      (
        "post".to_string(),
        "Validations which can be run after deployment".to_string()
      )
    );
    assert_eq!(formatted[0].1, "");
  }

  #[test]
  fn test_empty_document() {
    let registry = load("");
    assert!(registry.is_empty());
  }

  #[test]
  fn test_missing_file() {
    let result = GroupRegistry::load(Path::new("/nonexistent/groups.yaml"));
    assert!(matches!(result, Err(ValidationError::NotFound { .. })));
  }

  #[test]
  fn test_list_document_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("groups.yaml");
    std::fs::write(&path, "- prep\n- post\n").unwrap();

    let result = GroupRegistry::load(&path);
    assert!(matches!(result, Err(ValidationError::Schema { .. })));
  }
}
