use std::collections::BTreeMap;

use serde::Serialize;
use vigil_log::{Row, ValidationStats};
use vigil_validation::{FormattedMetadata, ValidationMetadata};

/// One validation in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationRow {
  #[serde(rename = "ID")]
  pub id: String,
  #[serde(rename = "Name")]
  pub name: String,
  #[serde(rename = "Groups")]
  pub groups: Vec<String>,
  #[serde(rename = "Categories")]
  pub categories: Vec<String>,
  #[serde(rename = "Products")]
  pub products: Vec<String>,
}

impl From<&ValidationMetadata> for ValidationRow {
  fn from(metadata: &ValidationMetadata) -> Self {
    Self {
      id: metadata.id().to_string(),
      name: metadata.name().to_string(),
      groups: metadata.groups().to_vec(),
      categories: metadata.categories().to_vec(),
      products: metadata.products().to_vec(),
    }
  }
}

impl Row for ValidationRow {
  fn columns() -> &'static [&'static str] {
    &["ID", "Name", "Groups", "Categories", "Products"]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.id.clone(),
      self.name.clone(),
      self.groups.join(", "),
      self.categories.join(", "),
      self.products.join(", "),
    ]
  }
}

/// One group with the number of validations belonging to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupInfoRow {
  #[serde(rename = "Groups")]
  pub group: String,
  #[serde(rename = "Description")]
  pub description: String,
  #[serde(rename = "Number of Validations")]
  pub validation_count: usize,
}

impl Row for GroupInfoRow {
  fn columns() -> &'static [&'static str] {
    &["Groups", "Description", "Number of Validations"]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.group.clone(),
      self.description.clone(),
      self.validation_count.to_string(),
    ]
  }
}

/// Metadata, parameters and execution statistics of one validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationDetails {
  #[serde(flatten)]
  pub metadata: FormattedMetadata,
  #[serde(rename = "Parameters")]
  pub parameters: BTreeMap<String, serde_json::Value>,
  #[serde(flatten)]
  pub stats: ValidationStats,
}

/// Parameters of one validation, as exported by the parameter query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationParameters {
  pub parameters: BTreeMap<String, serde_json::Value>,
}
