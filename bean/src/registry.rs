//! The definition registry: raw inputs waiting for `parse`, the compiled
//! definitions split by scope, the alias table and the class-name index.

use crate::definition::{DefinitionSpec, ObjectDefinition, Scope};
use crate::error::Result;
use crate::parser::{self, AnnotationParser, AnnotationSources, ClassAnnotations, Parsers};
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct DefinitionRegistry {
  raw_definitions: RwLock<IndexMap<String, DefinitionSpec>>,
  annotations: RwLock<AnnotationSources>,
  parsers: RwLock<Parsers>,

  definitions: DashMap<String, Arc<ObjectDefinition>>,
  request_definitions: DashMap<String, Arc<ObjectDefinition>>,
  session_definitions: DashMap<String, Arc<ObjectDefinition>>,
  aliases: DashMap<String, String>,
  class_names: RwLock<HashMap<String, Vec<String>>>,
}

impl Default for DefinitionRegistry {
  fn default() -> Self {
    Self {
      raw_definitions: RwLock::default(),
      annotations: RwLock::default(),
      parsers: RwLock::new(parser::default_parsers()),
      definitions: DashMap::new(),
      request_definitions: DashMap::new(),
      session_definitions: DashMap::new(),
      aliases: DashMap::new(),
      class_names: RwLock::default(),
    }
  }
}

impl DefinitionRegistry {
  // --- Accumulation ---

  pub(crate) fn add_definitions(&self, definitions: impl IntoIterator<Item = (String, DefinitionSpec)>) {
    self.raw_definitions.write().extend(definitions);
  }

  pub(crate) fn add_annotation_sources(&self, sources: AnnotationSources) {
    let mut annotations = self.annotations.write();
    for (namespace, classes) in sources {
      annotations.entry(namespace).or_default().extend(classes);
    }
  }

  pub(crate) fn add_annotation_parsers(
    &self,
    parsers: impl IntoIterator<Item = (String, Arc<dyn AnnotationParser>)>,
  ) {
    self.parsers.write().extend(parsers);
  }

  // --- Compilation ---

  /// Compiles the accumulated input. Returns the singleton and prototype
  /// definitions, in registration order, for the eager pass; request and
  /// session definitions go to their holding sets.
  pub(crate) fn parse(&self) -> Result<Vec<Arc<ObjectDefinition>>> {
    let compiled = {
      let annotations = self.annotations.read();
      let parsers = self.parsers.read();
      let raw_definitions = self.raw_definitions.read();
      parser::compile(&annotations, &parsers, &raw_definitions)?
    };

    {
      let mut class_names = self.class_names.write();
      for (class_name, bean) in compiled.class_names {
        let beans = class_names.entry(class_name).or_default();
        if !beans.contains(&bean) {
          beans.push(bean);
        }
      }
    }

    let mut eager = Vec::with_capacity(compiled.definitions.len());
    for definition in compiled.definitions.into_values() {
      let definition = Arc::new(definition);
      if let Some(target) = self.holding_set(definition.scope()) {
        tracing::trace!(bean = definition.name(), scope = %definition.scope(), "deferred contextual bean");
        target.insert(definition.name().to_string(), definition);
        continue;
      }
      self.definitions.insert(definition.name().to_string(), definition.clone());
      eager.push(definition);
    }
    Ok(eager)
  }

  fn holding_set(&self, scope: Scope) -> Option<&DashMap<String, Arc<ObjectDefinition>>> {
    match scope {
      Scope::Request => Some(&self.request_definitions),
      Scope::Session => Some(&self.session_definitions),
      Scope::Singleton | Scope::Prototype => None,
    }
  }

  /// Registers a runtime definition. Returns `false`, leaving the registry
  /// untouched, when the name is already defined.
  pub(crate) fn insert_new(&self, definition: ObjectDefinition) -> bool {
    let name = definition.name().to_string();
    if self.definition(&name).is_some() {
      return false;
    }
    let class_name = definition.class_name().to_string();
    let set = self.holding_set(definition.scope()).unwrap_or(&self.definitions);
    match set.entry(name.clone()) {
      dashmap::mapref::entry::Entry::Occupied(_) => return false,
      dashmap::mapref::entry::Entry::Vacant(slot) => {
        slot.insert(Arc::new(definition));
      }
    }
    let mut class_names = self.class_names.write();
    let beans = class_names.entry(class_name).or_default();
    if !beans.contains(&name) {
      beans.push(name);
    }
    true
  }

  // --- Lookup ---

  /// A definition by exact bean name, from any set.
  pub(crate) fn definition(&self, name: &str) -> Option<Arc<ObjectDefinition>> {
    self
      .definitions
      .get(name)
      .or_else(|| self.request_definitions.get(name))
      .or_else(|| self.session_definitions.get(name))
      .map(|entry| entry.value().clone())
  }

  /// A definition by bean name, falling back to the last bean registered for
  /// a class of that name.
  pub(crate) fn find(&self, name: &str) -> Option<Arc<ObjectDefinition>> {
    self.definition(name).or_else(|| {
      let last = self.last_of_class(name)?;
      self.definition(&last)
    })
  }

  pub(crate) fn request_definition(&self, name: &str) -> Option<Arc<ObjectDefinition>> {
    self.request_definitions.get(name).map(|entry| entry.value().clone())
  }

  pub(crate) fn session_definition(&self, name: &str) -> Option<Arc<ObjectDefinition>> {
    self.session_definitions.get(name).map(|entry| entry.value().clone())
  }

  pub(crate) fn alias(&self, alias: &str) -> Option<String> {
    self.aliases.get(alias).map(|entry| entry.value().clone())
  }

  pub(crate) fn set_alias(&self, alias: &str, bean: &str) {
    if let Some(previous) = self.aliases.insert(alias.to_string(), bean.to_string()) {
      if previous != bean {
        tracing::debug!(alias, previous = %previous, bean, "alias redefined");
      }
    }
  }

  pub(crate) fn last_of_class(&self, class_name: &str) -> Option<String> {
    self
      .class_names
      .read()
      .get(class_name)
      .and_then(|beans| beans.last().cloned())
  }

  pub(crate) fn is_class(&self, class_name: &str) -> bool {
    self
      .class_names
      .read()
      .get(class_name)
      .is_some_and(|beans| !beans.is_empty())
  }

  /// Annotation data recorded for a class; the last namespace wins.
  pub(crate) fn metadata(&self, class_name: &str) -> Option<ClassAnnotations> {
    self
      .annotations
      .read()
      .values()
      .filter_map(|classes| classes.get(class_name))
      .last()
      .cloned()
  }

  // --- Introspection ---

  pub(crate) fn definition_count(&self) -> usize {
    self.definitions.len() + self.request_definitions.len() + self.session_definitions.len()
  }

  pub(crate) fn definition_names(&self) -> Vec<String> {
    let mut names: Vec<String> = self
      .definitions
      .iter()
      .chain(self.request_definitions.iter())
      .chain(self.session_definitions.iter())
      .map(|entry| entry.key().clone())
      .collect();
    names.sort();
    names
  }
}
