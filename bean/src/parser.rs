//! The definition compiler: turns accumulated annotation data and raw config
//! definitions into [`ObjectDefinition`]s plus the class-name index.

use crate::definition::{
  ArgsInjection, DefinitionSpec, MethodInjection, ObjectDefinition, PropertyInjection, Scope, CONSTRUCTOR,
};
use crate::error::{ContainerError, Result};
use crate::value::Value;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// One annotation attached to a class or a property.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Annotation {
  pub kind: String,
  #[serde(default)]
  pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Annotation {
  pub fn new(kind: impl Into<String>) -> Self {
    Self {
      kind: kind.into(),
      attributes: BTreeMap::new(),
    }
  }

  pub fn attr(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
    self.attributes.insert(key.into(), value.into());
    self
  }

  pub fn str_attr(&self, key: &str) -> Option<&str> {
    self.attributes.get(key).and_then(|v| v.as_str())
  }
}

/// Everything recorded for one class.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassAnnotations {
  #[serde(default)]
  pub annotations: Vec<Annotation>,
  #[serde(default)]
  pub properties: BTreeMap<String, Vec<Annotation>>,
}

impl ClassAnnotations {
  pub fn annotate(mut self, annotation: Annotation) -> Self {
    self.annotations.push(annotation);
    self
  }

  pub fn annotate_property(mut self, property: impl Into<String>, annotation: Annotation) -> Self {
    self.properties.entry(property.into()).or_default().push(annotation);
    self
  }
}

/// Namespace → class name → annotations, in registration order.
pub type AnnotationSources = IndexMap<String, IndexMap<String, ClassAnnotations>>;

/// A definition being assembled from a class's annotations. The class only
/// becomes a bean once a parser sets `name`.
#[derive(Debug)]
pub struct DefinitionDraft {
  class_name: String,
  pub name: Option<String>,
  pub scope: Option<Scope>,
  pub alias: Option<String>,
  pub constructor: Option<MethodInjection>,
  pub properties: Vec<PropertyInjection>,
}

impl DefinitionDraft {
  fn new(class_name: &str) -> Self {
    Self {
      class_name: class_name.to_string(),
      name: None,
      scope: None,
      alias: None,
      constructor: None,
      properties: Vec::new(),
    }
  }

  pub fn class_name(&self) -> &str {
    &self.class_name
  }

  fn into_definition(self) -> Option<ObjectDefinition> {
    let name = self.name?;
    let mut definition = ObjectDefinition::new(name, self.class_name).with_scope(self.scope.unwrap_or_default());
    definition.set_alias(self.alias);
    definition.set_constructor(self.constructor);
    for property in self.properties {
      definition.set_property(property);
    }
    Some(definition)
  }
}

/// Interprets annotations of one `kind`.
pub trait AnnotationParser: Send + Sync {
  fn parse_class(&self, _annotation: &Annotation, _draft: &mut DefinitionDraft) -> Result<()> {
    Ok(())
  }

  fn parse_property(&self, _property: &str, _annotation: &Annotation, _draft: &mut DefinitionDraft) -> Result<()> {
    Ok(())
  }
}

/// `Bean { name?, scope?, alias? }` on a class.
pub struct BeanParser;

impl AnnotationParser for BeanParser {
  fn parse_class(&self, annotation: &Annotation, draft: &mut DefinitionDraft) -> Result<()> {
    let name = annotation.str_attr("name").unwrap_or(&draft.class_name).to_string();
    draft.name = Some(name);
    if let Some(scope) = annotation.str_attr("scope") {
      draft.scope = Some(scope.parse()?);
    }
    if let Some(alias) = annotation.str_attr("alias") {
      draft.alias = Some(alias.to_string());
    }
    Ok(())
  }
}

/// `Inject { name? }` on a property: injects the referenced bean (or
/// external value), defaulting to the property's own name.
pub struct InjectParser;

impl AnnotationParser for InjectParser {
  fn parse_property(&self, property: &str, annotation: &Annotation, draft: &mut DefinitionDraft) -> Result<()> {
    let reference = annotation.str_attr("name").unwrap_or(property);
    if reference.is_empty() {
      return Err(ContainerError::Metadata(format!(
        "empty Inject reference on {}::{}",
        draft.class_name, property
      )));
    }
    draft
      .properties
      .push(PropertyInjection::new(property, Value::Str(reference.to_string()), true));
    Ok(())
  }
}

pub(crate) type Parsers = HashMap<String, Arc<dyn AnnotationParser>>;

pub(crate) fn default_parsers() -> Parsers {
  let mut parsers: Parsers = HashMap::new();
  parsers.insert("Bean".to_string(), Arc::new(BeanParser));
  parsers.insert("Inject".to_string(), Arc::new(InjectParser));
  parsers
}

/// The compiler's output, in registration order. `class_names` holds
/// `(class, bean)` pairs.
#[derive(Debug, Default)]
pub(crate) struct Compiled {
  pub(crate) definitions: IndexMap<String, ObjectDefinition>,
  pub(crate) class_names: IndexSet<(String, String)>,
}

impl Compiled {
  /// Adds or replaces a definition. A replacement keeps its position; if it
  /// changes the class, the bean leaves the old class's index entry.
  fn upsert(&mut self, definition: ObjectDefinition) {
    let name = definition.name().to_string();
    if let Some(previous) = self.definitions.get(&name) {
      if previous.class_name() != definition.class_name() {
        self
          .class_names
          .shift_remove(&(previous.class_name().to_string(), name.clone()));
      }
    }
    self.class_names.insert((definition.class_name().to_string(), name.clone()));
    self.definitions.insert(name, definition);
  }
}

pub(crate) fn compile(
  annotations: &AnnotationSources,
  parsers: &Parsers,
  definitions: &IndexMap<String, DefinitionSpec>,
) -> Result<Compiled> {
  let mut compiled = Compiled::default();

  for (namespace, classes) in annotations {
    for (class_name, class_annotations) in classes {
      let mut draft = DefinitionDraft::new(class_name);
      for annotation in &class_annotations.annotations {
        if let Some(parser) = parsers.get(&annotation.kind) {
          parser.parse_class(annotation, &mut draft)?;
        }
      }
      for (property, property_annotations) in &class_annotations.properties {
        for annotation in property_annotations {
          if let Some(parser) = parsers.get(&annotation.kind) {
            parser.parse_property(property, annotation, &mut draft)?;
          }
        }
      }
      if let Some(definition) = draft.into_definition() {
        tracing::trace!(namespace = %namespace, bean = definition.name(), "compiled annotated bean");
        compiled.upsert(definition);
      }
    }
  }

  for (name, spec) in definitions {
    let base = compiled.definitions.get(name).cloned();
    compiled.upsert(compile_spec(name, spec, base)?);
  }

  Ok(compiled)
}

/// Compiles one raw definition, overriding `base` when it is given.
pub(crate) fn compile_spec(name: &str, spec: &DefinitionSpec, base: Option<ObjectDefinition>) -> Result<ObjectDefinition> {
  let mut definition = match (base, &spec.class) {
    (Some(mut base), Some(class)) => {
      base.set_class_name(class.clone());
      base
    }
    (Some(base), None) => base,
    (None, Some(class)) => ObjectDefinition::new(name, class.clone()),
    (None, None) => {
      return Err(ContainerError::Metadata(format!(
        "definition {name} does not name a class"
      )))
    }
  };

  if let Some(scope) = spec.options.scope {
    definition.set_scope(scope);
  }
  if let Some(alias) = &spec.options.alias {
    definition.set_alias(Some(alias.clone()));
  }

  if spec.args.is_some() || spec.constructor.is_some() {
    let method = spec.constructor.as_deref().unwrap_or(CONSTRUCTOR);
    let args = spec
      .args
      .iter()
      .flatten()
      .map(|raw| {
        let (value, is_ref) = injection_value(raw);
        ArgsInjection::new(value, is_ref)
      })
      .collect();
    definition.set_constructor(Some(MethodInjection::new(method, args)));
  }

  for (property, raw) in &spec.properties {
    let (value, is_ref) = injection_value(raw);
    definition.set_property(PropertyInjection::new(property, value, is_ref));
  }

  Ok(definition)
}

/// `${name}` → `name`.
pub(crate) fn reference_marker(s: &str) -> Option<&str> {
  s.strip_prefix("${")
    .and_then(|rest| rest.strip_suffix('}'))
    .filter(|inner| !inner.is_empty())
}

fn injection_value(raw: &serde_json::Value) -> (Value, bool) {
  match raw {
    serde_json::Value::String(s) => match reference_marker(s) {
      Some(reference) => (Value::Str(reference.to_string()), true),
      None => (Value::Str(s.clone()), false),
    },
    other => (nested_value(other), false),
  }
}

fn nested_value(raw: &serde_json::Value) -> Value {
  match raw {
    serde_json::Value::String(s) => match reference_marker(s) {
      Some(reference) => Value::Ref(reference.to_string()),
      None => Value::Str(s.clone()),
    },
    serde_json::Value::Array(items) => Value::List(items.iter().map(nested_value).collect()),
    serde_json::Value::Object(entries) => {
      Value::Map(entries.iter().map(|(k, v)| (k.clone(), nested_value(v))).collect())
    }
    other => Value::from_json(other.clone()),
  }
}
