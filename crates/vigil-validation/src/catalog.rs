use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ValidationError;
use crate::metadata::ValidationMetadata;

/// Extension of validation definition files.
const DEFINITION_EXTENSION: &str = "yaml";

/// Selection on the group, category and product axes.
///
/// An empty filter selects everything. Otherwise a validation is selected
/// when it shares at least one value with any of the requested axes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFilter {
  pub groups: Vec<String>,
  pub categories: Vec<String>,
  pub products: Vec<String>,
}

impl ValidationFilter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_groups<I, S>(mut self, groups: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.groups = groups.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_categories<I, S>(mut self, categories: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.categories = categories.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_products<I, S>(mut self, products: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.products = products.into_iter().map(Into::into).collect();
    self
  }

  pub fn is_empty(&self) -> bool {
    self.groups.is_empty() && self.categories.is_empty() && self.products.is_empty()
  }

  pub fn matches(&self, metadata: &ValidationMetadata) -> bool {
    if self.is_empty() {
      return true;
    }

    intersects(&self.groups, metadata.groups())
      || intersects(&self.categories, metadata.categories())
      || intersects(&self.products, metadata.products())
  }
}

fn intersects(requested: &[String], values: &[String]) -> bool {
  requested.iter().any(|r| values.contains(r))
}

/// A flat directory of validation definitions.
///
/// ```text
/// {root}/
/// ├── check-cpu.yaml
/// ├── check-ram.yaml
/// └── ...
/// ```
///
/// Sub-directories are not scanned. Results are ordered by file name.
#[derive(Debug, Clone)]
pub struct ValidationCatalog {
  root: PathBuf,
}

impl ValidationCatalog {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Path of the definition for validation `id`.
  pub fn definition_path(&self, id: &str) -> PathBuf {
    self.root.join(format!("{}.{}", id, DEFINITION_EXTENSION))
  }

  /// Load a single validation by id, `None` if no definition exists.
  pub fn get(&self, id: &str) -> Result<Option<ValidationMetadata>, ValidationError> {
    let path = self.definition_path(id);
    if !path.is_file() {
      return Ok(None);
    }
    ValidationMetadata::load(&path).map(Some)
  }

  /// Load every definition selected by `filter`.
  ///
  /// A malformed definition aborts the scan.
  pub fn scan(&self, filter: &ValidationFilter) -> Result<Vec<ValidationMetadata>, ValidationError> {
    let mut validations = Vec::new();
    for path in self.definition_files()? {
      let metadata = ValidationMetadata::load(&path)?;
      if filter.matches(&metadata) {
        validations.push(metadata);
      }
    }

    debug!(
      dir = %self.root.display(),
      found = validations.len(),
      "scanned validation catalog"
    );

    Ok(validations)
  }

  /// Resolve playbook paths by id, unioned with the validations selected by
  /// `filter`.
  ///
  /// Ids may be given with or without the `.yaml` extension. With an empty
  /// filter only id matches are returned.
  pub fn playbooks(
    &self,
    ids: &[String],
    filter: &ValidationFilter,
  ) -> Result<Vec<PathBuf>, ValidationError> {
    let mut playbooks = Vec::new();

    for path in self.definition_files()? {
      let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
      let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();

      if ids.iter().any(|id| id == stem || id == file_name) {
        playbooks.push(path);
        continue;
      }

      if !filter.is_empty() && filter.matches(&ValidationMetadata::load(&path)?) {
        playbooks.push(path);
      }
    }

    Ok(playbooks)
  }

  /// Definition files directly under the root, sorted by name.
  fn definition_files(&self) -> Result<Vec<PathBuf>, ValidationError> {
    if !self.root.is_dir() {
      return Err(ValidationError::NotFound {
        path: self.root.clone(),
      });
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&self.root)? {
      let path = entry?.path();
      if path.is_file() && path.extension().is_some_and(|e| e == DEFINITION_EXTENSION) {
        files.push(path);
      }
    }
    files.sort();

    Ok(files)
  }
}
