use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Hosts a skip-list entry applies to.
///
/// Serialized as a plain string: `"ALL"` (any case) or a comma-separated
/// host list. A string naming no host at all is read as `ALL`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HostSelector {
  /// Skip the validation entirely.
  #[default]
  All,
  /// Skip the validation on these hosts only.
  Subset(Vec<String>),
}

impl HostSelector {
  pub fn parse(value: &str) -> Self {
    let value = value.trim();
    if value.eq_ignore_ascii_case("all") {
      return HostSelector::All;
    }

    let hosts: Vec<String> = value
      .split(',')
      .map(str::trim)
      .filter(|h| !h.is_empty())
      .map(String::from)
      .collect();

    // An empty host list behaves like a missing `hosts` key.
    if hosts.is_empty() {
      HostSelector::All
    } else {
      HostSelector::Subset(hosts)
    }
  }
}

impl From<String> for HostSelector {
  fn from(value: String) -> Self {
    HostSelector::parse(&value)
  }
}

impl From<HostSelector> for String {
  fn from(value: HostSelector) -> Self {
    value.to_string()
  }
}

impl fmt::Display for HostSelector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HostSelector::All => f.write_str("ALL"),
      HostSelector::Subset(hosts) => f.write_str(&hosts.join(",")),
    }
  }
}

/// Why and where a validation is skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkipEntry {
  /// An entry without `hosts` skips the validation everywhere.
  #[serde(default)]
  pub hosts: HostSelector,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reason: Option<String>,

  /// Bug tracker reference.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub lp: Option<String>,
}

/// Caller-supplied mapping of validation name to [`SkipEntry`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkipList(BTreeMap<String, SkipEntry>);

impl SkipList {
  pub fn new() -> Self {
    Self::default()
  }

  /// Load a skip list from a JSON or YAML file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    crate::load_document(path)
  }

  pub fn get(&self, validation: &str) -> Option<&SkipEntry> {
    self.0.get(validation)
  }

  pub fn insert(&mut self, validation: impl Into<String>, entry: SkipEntry) {
    self.0.insert(validation.into(), entry);
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &SkipEntry)> {
    self.0.iter()
  }
}

impl FromIterator<(String, SkipEntry)> for SkipList {
  fn from_iter<I: IntoIterator<Item = (String, SkipEntry)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}
