//! Vigil Validation
//!
//! On-disk validation definitions and how to find them.
//!
//! A validation is an Ansible playbook whose first play carries a
//! `vars.metadata` block:
//!
//! ```yaml
//! - hosts: all
//!   vars:
//!     metadata:
//!       name: Check available memory
//!       description: Verify the host has enough RAM
//!       groups: [prep, pre-deployment]
//!       categories: [hardware]
//!       products: [tripleo]
//!     minimal_ram_gb: 8
//!   roles:
//!     - check-ram
//! ```
//!
//! - [`ValidationMetadata`] parses one definition.
//! - [`GroupRegistry`] parses the group definition document.
//! - [`ValidationCatalog`] scans a flat directory of definitions and filters
//!   them by group, category or product.

mod catalog;
mod error;
mod group;
mod metadata;

use std::path::Path;

pub use catalog::{ValidationCatalog, ValidationFilter};
pub use error::ValidationError;
pub use group::{GroupDefinition, GroupRegistry};
pub use metadata::{FormattedMetadata, ValidationMetadata};

/// Read and parse a YAML document.
pub(crate) fn read_yaml(path: &Path) -> Result<serde_yaml::Value, ValidationError> {
  let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
    std::io::ErrorKind::NotFound => ValidationError::NotFound {
      path: path.to_path_buf(),
    },
    _ => ValidationError::Io(e),
  })?;

  serde_yaml::from_str(&content).map_err(|source| ValidationError::Parse {
    path: path.to_path_buf(),
    source,
  })
}
