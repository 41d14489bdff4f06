//! Reference resolution for injected values and the id lookup chain.

use crate::container::Container;
use crate::context::ContextId;
use crate::error::{ContainerError, Result};
use crate::value::{Bean, Value};
use std::collections::BTreeMap;

impl Container {
  /// Follows `id` through the pools, aliases and the class index to a bean,
  /// building from a definition as a last resort.
  pub(crate) fn lookup(&self, id: &str, context: Option<&ContextId>) -> Result<Bean> {
    let max_hops = self.config.max_resolution_depth;
    let mut current = id.to_string();

    for _ in 0..max_hops {
      if let Some(bean) = self.pools.singleton(&current) {
        return Ok(bean);
      }
      if let Some(copy) = self.pools.prototype(&current) {
        return copy;
      }
      if let Some(target) = self.registry.alias(&current) {
        tracing::trace!(alias = %current, bean = %target, "resolved alias");
        current = target;
        continue;
      }
      match self.registry.last_of_class(&current) {
        Some(last) if last != current => {
          tracing::trace!(class = %current, bean = %last, "resolved class name");
          current = last;
          continue;
        }
        _ => {}
      }
      if self.registry.definition(&current).is_some() {
        return self.obtain(&current, context);
      }
      return Err(ContainerError::UndefinedBean(current));
    }

    Err(ContainerError::ResolutionDepthExceeded {
      bean: id.to_string(),
      depth: max_hops,
    })
  }

  /// Resolves a top-level reference value. Non-string values pass through.
  pub(crate) fn resolve_reference(&self, value: &Value, context: Option<&ContextId>) -> Result<Value> {
    match value {
      Value::Str(reference) | Value::Ref(reference) => self.reference(reference, context),
      other => Ok(other.clone()),
    }
  }

  /// Resolves every reference nested in a list or map.
  pub(crate) fn resolve_nested(&self, value: &Value, context: Option<&ContextId>) -> Result<Value> {
    match value {
      Value::Ref(reference) => self.reference(reference, context),
      Value::List(items) => items
        .iter()
        .map(|item| self.resolve_nested(item, context))
        .collect::<Result<Vec<_>>>()
        .map(Value::List),
      Value::Map(entries) => entries
        .iter()
        .map(|(key, item)| Ok((key.clone(), self.resolve_nested(item, context)?)))
        .collect::<Result<BTreeMap<_, _>>>()
        .map(Value::Map),
      other => Ok(other.clone()),
    }
  }

  /// `name` is a bean. A dotted reference is external and goes to the
  /// handler, unless the registry knows it as a bean, alias or class name.
  fn reference(&self, reference: &str, context: Option<&ContextId>) -> Result<Value> {
    if reference.contains('.') && !self.is_bean_name(reference) {
      return match self.handler() {
        Some(handler) => handler.reference_value(reference),
        None => {
          tracing::debug!(reference, "no handler for external reference; injecting it verbatim");
          Ok(Value::Str(reference.to_string()))
        }
      };
    }
    self.lookup(reference, context).map(Value::Bean)
  }

  fn is_bean_name(&self, name: &str) -> bool {
    self.registry.definition(name).is_some()
      || self.registry.alias(name).is_some()
      || self.registry.is_class(name)
  }
}
