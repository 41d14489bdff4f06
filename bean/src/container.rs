//! The main `Container` struct and its public API.

use crate::class::{BeanClass, ClassRegistry};
use crate::config::{self, ContainerConfig};
use crate::context::ContextId;
use crate::definition::{DefinitionSpec, Scope};
use crate::error::{ContainerError, Result};
use crate::handler::Handler;
use crate::parser::{self, AnnotationParser, AnnotationSources};
use crate::pool::ScopePools;
use crate::registry::DefinitionRegistry;
use crate::value::Bean;
use parking_lot::RwLock;
use std::any::{type_name, Any};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Pool sizes and definition count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerStats {
  pub singleton_count: usize,
  pub prototype_count: usize,
  pub definition_count: usize,
}

/// Names currently known to the container. `request` and `session` list
/// context ids with a live bucket; the rest list bean names. All sorted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BeanNames {
  pub session: Vec<String>,
  pub request: Vec<String>,
  pub singleton: Vec<String>,
  pub prototype: Vec<String>,
  pub definition: Vec<String>,
}

/// The bean container.
///
/// Feed it classes and definitions, call [`Container::init`] once, then look
/// beans up. It is `Send + Sync`; share it as an `Arc<Container>`.
#[derive(Default)]
pub struct Container {
  pub(crate) config: ContainerConfig,
  pub(crate) registry: DefinitionRegistry,
  pub(crate) classes: ClassRegistry,
  pub(crate) pools: ScopePools,
  handler: RwLock<Option<Arc<dyn Handler>>>,
  initialized: AtomicBool,
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_config(config: ContainerConfig) -> Self {
    Self {
      config,
      ..Self::default()
    }
  }

  pub fn config(&self) -> &ContainerConfig {
    &self.config
  }

  // --- Registration ---

  pub fn add_class(&self, class: BeanClass) {
    self.classes.register(class);
  }

  pub fn add_classes(&self, classes: impl IntoIterator<Item = BeanClass>) {
    for class in classes {
      self.classes.register(class);
    }
  }

  /// Accumulates raw definitions for `init`; a name given twice keeps the
  /// later definition.
  pub fn add_definitions(&self, definitions: impl IntoIterator<Item = (String, DefinitionSpec)>) {
    self.registry.add_definitions(definitions);
  }

  /// Accumulates a YAML or JSON definition file.
  pub fn load_definitions(&self, path: impl AsRef<Path>) -> Result<()> {
    let definitions = config::read_definitions(path)?;
    tracing::debug!(count = definitions.len(), "loaded bean definitions");
    self.registry.add_definitions(definitions);
    Ok(())
  }

  /// Accumulates annotation data, merged per namespace and class.
  pub fn add_annotation_sources(&self, sources: AnnotationSources) {
    self.registry.add_annotation_sources(sources);
  }

  /// Registers annotation parsers by annotation kind, replacing earlier ones
  /// (including the built-in `Bean` and `Inject` parsers).
  pub fn add_annotation_parsers(&self, parsers: impl IntoIterator<Item = (String, Arc<dyn AnnotationParser>)>) {
    self.registry.add_annotation_parsers(parsers);
  }

  pub fn set_handler(&self, handler: Arc<dyn Handler>) {
    *self.handler.write() = Some(handler);
  }

  pub(crate) fn handler(&self) -> Option<Arc<dyn Handler>> {
    self.handler.read().clone()
  }

  // --- Lifecycle ---

  /// Compiles everything accumulated so far and eagerly builds every
  /// singleton and prototype bean.
  ///
  /// Runs once; call it before sharing the container with other threads. A
  /// failure leaves the beans built so far in place.
  pub fn init(&self) -> Result<()> {
    if self.initialized.swap(true, Ordering::SeqCst) {
      return Err(ContainerError::AlreadyInitialized);
    }

    let eager = self.registry.parse()?;
    tracing::debug!(
      eager = eager.len(),
      definitions = self.registry.definition_count(),
      "container definitions parsed"
    );

    for definition in &eager {
      self.obtain(definition.name(), None)?;
    }

    let stats = self.stats();
    tracing::debug!(
      singletons = stats.singleton_count,
      prototypes = stats.prototype_count,
      "container initialized"
    );
    Ok(())
  }

  pub fn is_initialized(&self) -> bool {
    self.initialized.load(Ordering::SeqCst)
  }

  // --- Resolution ---

  /// Finds a bean by name, alias or class name.
  ///
  /// Precedence: built singleton, built prototype (copied), alias, last bean
  /// of a class, then on-demand construction from a definition.
  pub fn get(&self, id: &str) -> Result<Bean> {
    self.lookup(id, None)
  }

  /// [`Container::get`], downcast to `T`.
  pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
    let bean = self.get(id)?;
    bean.downcast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
      target: id.to_string(),
      expected: type_name::<T>().to_string(),
      found: bean.class_name().to_string(),
    })
  }

  fn quick_target(&self, name: &str) -> Option<String> {
    self.registry.alias(name).or_else(|| self.registry.last_of_class(name))
  }

  /// An already built singleton, by name, alias or class name. Never builds.
  pub fn get_singleton(&self, name: &str) -> Result<Bean> {
    self
      .pools
      .singleton(name)
      .or_else(|| self.quick_target(name).and_then(|target| self.pools.singleton(&target)))
      .ok_or_else(|| ContainerError::UndefinedBean(name.to_string()))
  }

  /// A copy of an already built prototype, by name, alias or class name.
  /// Never builds a template.
  pub fn get_prototype(&self, name: &str) -> Result<Bean> {
    self
      .pools
      .prototype(name)
      .or_else(|| self.quick_target(name).and_then(|target| self.pools.prototype(&target)))
      .unwrap_or_else(|| Err(ContainerError::UndefinedBean(name.to_string())))
  }

  /// Whether `id` names a pooled bean, an alias, a class or a definition.
  pub fn has(&self, id: &str) -> bool {
    self.pools.singleton(id).is_some()
      || self.pools.has_prototype(id)
      || self.registry.alias(id).is_some()
      || self.registry.is_class(id)
      || self.registry.definition(id).is_some()
  }

  /// Whether `name` (or the bean it aliases) is a built singleton.
  pub fn is_singleton(&self, name: &str) -> bool {
    let name = self.registry.alias(name).unwrap_or_else(|| name.to_string());
    self.pools.singleton(&name).is_some()
  }

  /// The request bean `name` for `context`, built on first use.
  pub fn get_request_bean(&self, name: &str, context: impl Into<ContextId>) -> Result<Bean> {
    let context = context.into();
    if let Some(bean) = self.pools.contextual(Scope::Request, &context, name) {
      return Ok(bean);
    }
    if self.registry.request_definition(name).is_none() {
      return Err(ContainerError::UndefinedRequestBean(name.to_string()));
    }
    self.obtain(name, Some(&context))
  }

  /// The session bean `name` for `context`, built on first use.
  pub fn get_session_bean(&self, name: &str, context: impl Into<ContextId>) -> Result<Bean> {
    let context = context.into();
    if let Some(bean) = self.pools.contextual(Scope::Session, &context, name) {
      return Ok(bean);
    }
    if self.registry.session_definition(name).is_none() {
      return Err(ContainerError::UndefinedSessionBean(name.to_string()));
    }
    self.obtain(name, Some(&context))
  }

  /// Drops every request bean built for `context`.
  pub fn destroy_request(&self, context: impl Into<ContextId>) {
    let context = context.into();
    if self.pools.destroy(Scope::Request, &context) {
      tracing::debug!(context = %context, "destroyed request beans");
    }
  }

  /// Drops every session bean built for `context`.
  pub fn destroy_session(&self, context: impl Into<ContextId>) {
    let context = context.into();
    if self.pools.destroy(Scope::Session, &context) {
      tracing::debug!(context = %context, "destroyed session beans");
    }
  }

  /// Registers a one-off definition and builds it immediately.
  ///
  /// A spec without a class uses `name` as the class. Names that are already
  /// resolvable are rejected; so are request- and session-scoped specs, which
  /// cannot be built without a context.
  pub fn create(&self, name: &str, spec: DefinitionSpec) -> Result<Bean> {
    if self.has(name) {
      return Err(ContainerError::DuplicateDefinition(name.to_string()));
    }

    let mut spec = spec;
    if spec.class.is_none() {
      spec.class = Some(name.to_string());
    }
    let definition = parser::compile_spec(name, &spec, None)?;
    let scope = definition.scope();
    if scope.is_contextual() {
      return Err(ContainerError::MissingContext {
        bean: name.to_string(),
        scope: scope.to_string(),
      });
    }

    if !self.registry.insert_new(definition) {
      return Err(ContainerError::DuplicateDefinition(name.to_string()));
    }
    tracing::debug!(bean = name, scope = %scope, "created definition at runtime");
    self.obtain(name, None)
  }

  // --- Introspection ---

  pub fn stats(&self) -> ContainerStats {
    ContainerStats {
      singleton_count: self.pools.singleton_names().len(),
      prototype_count: self.pools.prototype_names().len(),
      definition_count: self.registry.definition_count(),
    }
  }

  pub fn names(&self) -> BeanNames {
    BeanNames {
      session: self.pools.context_ids(Scope::Session),
      request: self.pools.context_ids(Scope::Request),
      singleton: self.pools.singleton_names(),
      prototype: self.pools.prototype_names(),
      definition: self.registry.definition_names(),
    }
  }
}
