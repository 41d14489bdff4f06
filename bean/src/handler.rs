//! The optional collaborator consulted while beans are built.

use crate::definition::ObjectDefinition;
use crate::error::{ContainerError, Result};
use crate::parser::ClassAnnotations;
use crate::value::Value;
use std::path::Path;

/// Hooks into bean construction. Every method has a pass-through default.
pub trait Handler: Send + Sync {
  /// Substitutes the class actually instantiated for `class_name`. The
  /// returned class must be registered and accept the same injections.
  fn class_proxy(&self, class_name: &str) -> String {
    class_name.to_string()
  }

  /// Called before a bean's constructor arguments are resolved.
  fn before_init(
    &self,
    _bean: &str,
    _class_name: &str,
    _definition: &ObjectDefinition,
    _metadata: Option<&ClassAnnotations>,
  ) {
  }

  /// Resolves an external reference such as `config.db.url`.
  fn reference_value(&self, reference: &str) -> Result<Value> {
    Ok(Value::Str(reference.to_string()))
  }
}

/// Resolves `config.`-prefixed references against a configuration tree.
///
/// `${config.db.url}` walks `db` then `url`. Missing keys resolve to
/// [`Value::Null`]; references with another prefix are returned unchanged.
#[derive(Debug, Clone, Default)]
pub struct ConfigHandler {
  root: serde_json::Value,
}

impl ConfigHandler {
  const PREFIX: &'static str = "config.";

  pub fn new(root: serde_json::Value) -> Self {
    Self { root }
  }

  /// Loads the tree from a `.json`, `.yaml` or `.yml` file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    crate::config::read_file(path.as_ref()).map(Self::new)
  }

  pub fn lookup(&self, path: &str) -> Option<&serde_json::Value> {
    path
      .split('.')
      .try_fold(&self.root, |node, key| match node {
        serde_json::Value::Object(entries) => entries.get(key),
        serde_json::Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
      })
  }
}

impl Handler for ConfigHandler {
  fn reference_value(&self, reference: &str) -> Result<Value> {
    let Some(path) = reference.strip_prefix(Self::PREFIX) else {
      return Ok(Value::Str(reference.to_string()));
    };
    if path.is_empty() {
      return Err(ContainerError::InvalidValue {
        target: reference.to_string(),
        message: "empty configuration path".to_string(),
      });
    }
    Ok(self.lookup(path).cloned().map(Value::from_json).unwrap_or_default())
  }
}
