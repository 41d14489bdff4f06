//! Bean construction: the scope-aware get-or-build path behind every lookup.

use crate::class::{BeanClass, Instance, PropertyAccess};
use crate::container::Container;
use crate::context::ContextId;
use crate::core::ResolutionGuard;
use crate::definition::{MethodInjection, ObjectDefinition, PropertyInjection, Scope, CONSTRUCTOR};
use crate::error::{ContainerError, Result};
use crate::pool::Prototype;
use crate::value::{Bean, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

impl Container {
  /// Returns the bean for a definition name (or class name), building it
  /// into its scope's pool first if needed.
  ///
  /// Singletons and prototype templates are built at most once, even under
  /// concurrent callers. Request and session beans need `context`.
  pub(crate) fn obtain(&self, name: &str, context: Option<&ContextId>) -> Result<Bean> {
    let definition = self
      .registry
      .find(name)
      .ok_or_else(|| ContainerError::UndefinedBean(name.to_string()))?;
    let name = definition.name();
    let max_depth = self.config.max_resolution_depth;

    match definition.scope() {
      Scope::Singleton => {
        if let Some(bean) = self.pools.singleton(name) {
          return Ok(bean);
        }
        let _guard = ResolutionGuard::enter(name, max_depth)?;
        let slot = self.pools.singleton_slot(name);
        let bean = slot.get_or_try_init(|| {
          let (instance, class) = self.construct(&definition, context)?;
          Ok::<_, ContainerError>(Bean::new(Arc::from(instance), class.shared_name()))
        })?;
        Ok(bean.clone())
      }
      Scope::Prototype => {
        if let Some(copy) = self.pools.prototype(name) {
          return copy;
        }
        let _guard = ResolutionGuard::enter(name, max_depth)?;
        let slot = self.pools.prototype_slot(name);
        let prototype = slot.get_or_try_init(|| {
          let (instance, class) = self.construct(&definition, context)?;
          if !class.is_cloneable() {
            return Err(ContainerError::NotCloneable {
              bean: name.to_string(),
              class: class.name().to_string(),
            });
          }
          let template = Bean::new(Arc::from(instance), class.shared_name());
          Ok(Prototype::new(template, class))
        })?;
        prototype.instance()
      }
      scope @ (Scope::Request | Scope::Session) => {
        let Some(context) = context else {
          return Err(ContainerError::MissingContext {
            bean: name.to_string(),
            scope: scope.to_string(),
          });
        };
        if let Some(bean) = self.pools.contextual(scope, context, name) {
          return Ok(bean);
        }
        let _guard = ResolutionGuard::enter(name, max_depth)?;
        let (instance, class) = self.construct(&definition, Some(context))?;
        let bean = Bean::new(Arc::from(instance), class.shared_name());
        Ok(self.pools.publish_contextual(scope, context, name, bean))
      }
    }
  }

  /// Instantiates, injects and initializes one bean without publishing it.
  fn construct(
    &self,
    definition: &ObjectDefinition,
    context: Option<&ContextId>,
  ) -> Result<(Instance, Arc<BeanClass>)> {
    let name = definition.name();
    let handler = self.handler();

    if let Some(handler) = &handler {
      let metadata = self.registry.metadata(definition.class_name());
      handler.before_init(name, definition.class_name(), definition, metadata.as_ref());
    }

    let args = match definition.constructor() {
      Some(injection) => self.constructor_args(name, injection, context)?,
      None => Vec::new(),
    };

    let class_name = match &handler {
      Some(handler) => handler.class_proxy(definition.class_name()),
      None => definition.class_name().to_string(),
    };
    let class = self.classes.get(&class_name)?;
    tracing::debug!(bean = name, class = %class_name, scope = %definition.scope(), "building bean");

    let mut instance = class.instantiate(args)?;
    self.inject_properties(definition, &class, &mut instance, context)?;
    class.run_init(&mut instance)?;

    // Only a fully built bean is reachable through its alias.
    if let Some(alias) = definition.alias() {
      self.registry.set_alias(alias, name);
    }
    Ok((instance, class))
  }

  fn constructor_args(
    &self,
    bean: &str,
    injection: &MethodInjection,
    context: Option<&ContextId>,
  ) -> Result<Vec<Value>> {
    if injection.method() != CONSTRUCTOR {
      return Err(ContainerError::InvalidConstructorInjection {
        bean: bean.to_string(),
        method: injection.method().to_string(),
      });
    }

    injection
      .args()
      .iter()
      .map(|arg| {
        let value = arg.value();
        self.injected_value(value, arg.is_ref() && !value.is_empty(), context)
      })
      .collect()
  }

  /// Injects properties level by level, most base type first. A value is
  /// resolved once even when several levels declare the property.
  fn inject_properties(
    &self,
    definition: &ObjectDefinition,
    class: &BeanClass,
    instance: &mut Instance,
    context: Option<&ContextId>,
  ) -> Result<()> {
    let mut resolved: HashMap<&str, Value> = HashMap::new();
    let mut injected: HashSet<&str> = HashSet::new();

    for level in class.levels() {
      for property in definition.properties() {
        let Some(slot) = level.slot(property.name()) else {
          continue;
        };
        let inject = match &slot.access {
          PropertyAccess::Setter(inject) | PropertyAccess::Field(inject) => inject,
          PropertyAccess::Static => {
            return Err(ContainerError::StaticPropertyInjection {
              class: level.class_name.to_string(),
              property: property.name().to_string(),
            })
          }
        };

        let value = match resolved.get(property.name()) {
          Some(value) => value.clone(),
          None => {
            let value = self.property_value(property, context)?;
            resolved.insert(property.name(), value.clone());
            value
          }
        };
        tracing::trace!(bean = definition.name(), class = %level.class_name, property = property.name(), "injecting property");
        inject(instance.as_mut(), value)?;
        injected.insert(property.name());
      }
    }

    for property in definition.properties() {
      if !injected.contains(property.name()) {
        tracing::warn!(
          bean = definition.name(),
          class = class.name(),
          property = property.name(),
          "class declares no such property; skipping injection"
        );
      }
    }
    Ok(())
  }

  fn property_value(&self, property: &PropertyInjection, context: Option<&ContextId>) -> Result<Value> {
    self.injected_value(property.value(), property.is_ref(), context)
  }

  /// References nested in a list or map are resolved first; a top-level
  /// reference is resolved after that.
  fn injected_value(&self, value: &Value, is_ref: bool, context: Option<&ContextId>) -> Result<Value> {
    let value = if value.is_container() {
      self.resolve_nested(value, context)?
    } else {
      value.clone()
    };
    if is_ref {
      self.resolve_reference(&value, context)
    } else {
      Ok(value)
    }
  }
}
