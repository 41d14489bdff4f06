//! Container settings and file loading for configuration and definitions.

use crate::definition::DefinitionSpec;
use crate::error::{ContainerError, Result};
use serde::de::DeserializeOwned;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn default_max_resolution_depth() -> usize {
  64
}

/// Tunables for a [`Container`](crate::Container).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
  /// How deep reference resolution may nest before a build is abandoned.
  #[serde(default = "default_max_resolution_depth")]
  pub max_resolution_depth: usize,
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      max_resolution_depth: default_max_resolution_depth(),
    }
  }
}

impl ContainerConfig {
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    let config: Self = read_file(path.as_ref())?;
    if config.max_resolution_depth == 0 {
      return Err(ContainerError::ConfigParse(
        "max_resolution_depth must be at least 1".to_string(),
      ));
    }
    Ok(config)
  }
}

/// Reads a bean definition file: a map of bean name → [`DefinitionSpec`], in
/// file order.
pub fn read_definitions(path: impl AsRef<Path>) -> Result<IndexMap<String, DefinitionSpec>> {
  read_file(path.as_ref())
}

/// Deserializes a `.json` file with `serde_json`, anything else as YAML.
pub(crate) fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
  tracing::debug!(path = %path.display(), "loading configuration file");
  let reader = BufReader::new(File::open(path)?);
  let is_json = path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
  if is_json {
    serde_json::from_reader(reader).map_err(|e| ContainerError::ConfigParse(e.to_string()))
  } else {
    serde_yaml::from_reader(reader).map_err(|e| ContainerError::ConfigParse(e.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn config_defaults_and_overrides() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "max_resolution_depth: 8").unwrap();
    let config = ContainerConfig::from_file(file.path()).unwrap();
    assert_eq!(config.max_resolution_depth, 8);
    assert_eq!(ContainerConfig::default().max_resolution_depth, 64);
  }

  #[test]
  fn unknown_keys_fail_to_parse() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"depth": 3}}"#).unwrap();
    assert!(matches!(
      ContainerConfig::from_file(file.path()),
      Err(ContainerError::ConfigParse(_))
    ));
  }

  #[test]
  fn definitions_keep_file_order() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "zeta:\n  class: Svc\nalpha:\n  class: Svc\nmid:\n  class: Svc").unwrap();
    let definitions = read_definitions(file.path()).unwrap();
    assert_eq!(
      definitions.keys().map(String::as_str).collect::<Vec<_>>(),
      vec!["zeta", "alpha", "mid"]
    );
  }

  #[test]
  fn missing_file_is_a_read_error() {
    assert!(matches!(
      read_definitions("/definitely/not/here.yaml"),
      Err(ContainerError::ConfigRead(_))
    ));
  }
}
