//! The four scope pools.

use crate::class::BeanClass;
use crate::context::ContextId;
use crate::definition::Scope;
use crate::error::{ContainerError, Result};
use crate::value::Bean;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

/// A build-once cell. Concurrent builders of one name wait for the first.
pub(crate) type Slot<T> = Arc<OnceCell<T>>;

/// A retained prototype template and the class that knows how to copy it.
pub(crate) struct Prototype {
  template: Bean,
  class: Arc<BeanClass>,
}

impl Prototype {
  pub(crate) fn new(template: Bean, class: Arc<BeanClass>) -> Self {
    Self { template, class }
  }

  /// A fresh copy of the template.
  pub(crate) fn instance(&self) -> Result<Bean> {
    let copy = self
      .class
      .duplicate(self.template.as_any())
      .ok_or_else(|| ContainerError::NotCloneable {
        bean: self.template.class_name().to_string(),
        class: self.class.name().to_string(),
      })?;
    Ok(Bean::new(Arc::from(copy), self.class.shared_name()))
  }
}

type ContextPool = DashMap<ContextId, HashMap<String, Bean>>;

#[derive(Default)]
pub(crate) struct ScopePools {
  singletons: DashMap<String, Slot<Bean>>,
  prototypes: DashMap<String, Slot<Prototype>>,
  requests: ContextPool,
  sessions: ContextPool,
}

impl ScopePools {
  // --- Singleton ---

  /// A built singleton. Slots still being (or never successfully) built do
  /// not count.
  pub(crate) fn singleton(&self, name: &str) -> Option<Bean> {
    self.singletons.get(name).and_then(|slot| slot.value().get().cloned())
  }

  pub(crate) fn singleton_slot(&self, name: &str) -> Slot<Bean> {
    // Clone the Arc out so the shard lock is released before building.
    self.singletons.entry(name.to_string()).or_default().value().clone()
  }

  // --- Prototype ---

  pub(crate) fn has_prototype(&self, name: &str) -> bool {
    self
      .prototypes
      .get(name)
      .is_some_and(|slot| slot.value().get().is_some())
  }

  /// A copy of a built prototype template.
  pub(crate) fn prototype(&self, name: &str) -> Option<Result<Bean>> {
    let slot = self.prototypes.get(name)?.value().clone();
    slot.get().map(Prototype::instance)
  }

  pub(crate) fn prototype_slot(&self, name: &str) -> Slot<Prototype> {
    self.prototypes.entry(name.to_string()).or_default().value().clone()
  }

  // --- Request / Session ---

  fn context_pool(&self, scope: Scope) -> &ContextPool {
    match scope {
      Scope::Session => &self.sessions,
      _ => &self.requests,
    }
  }

  pub(crate) fn contextual(&self, scope: Scope, context: &ContextId, name: &str) -> Option<Bean> {
    self
      .context_pool(scope)
      .get(context)
      .and_then(|bucket| bucket.get(name).cloned())
  }

  /// Publishes a context-scoped bean. If another builder published the same
  /// `(context, name)` first, that bean is kept and returned.
  pub(crate) fn publish_contextual(&self, scope: Scope, context: &ContextId, name: &str, bean: Bean) -> Bean {
    self
      .context_pool(scope)
      .entry(context.clone())
      .or_default()
      .entry(name.to_string())
      .or_insert(bean)
      .clone()
  }

  pub(crate) fn destroy(&self, scope: Scope, context: &ContextId) -> bool {
    self.context_pool(scope).remove(context).is_some()
  }

  // --- Introspection ---

  pub(crate) fn singleton_names(&self) -> Vec<String> {
    built_names(&self.singletons)
  }

  pub(crate) fn prototype_names(&self) -> Vec<String> {
    built_names(&self.prototypes)
  }

  pub(crate) fn context_ids(&self, scope: Scope) -> Vec<String> {
    let mut ids: Vec<String> = self
      .context_pool(scope)
      .iter()
      .map(|entry| entry.key().to_string())
      .collect();
    ids.sort();
    ids
  }
}

fn built_names<T>(pool: &DashMap<String, Slot<T>>) -> Vec<String> {
  let mut names: Vec<String> = pool
    .iter()
    .filter(|entry| entry.value().get().is_some())
    .map(|entry| entry.key().clone())
    .collect();
  names.sort();
  names
}

#[cfg(test)]
mod tests {
  use super::*;

  fn bean(n: u32) -> Bean {
    Bean::new(Arc::new(n), Arc::from("u32"))
  }

  #[test]
  fn unbuilt_slots_are_invisible() {
    let pools = ScopePools::default();
    let _slot = pools.singleton_slot("a");
    assert!(pools.singleton("a").is_none());
    assert!(pools.singleton_names().is_empty());

    pools.singleton_slot("a").set(bean(1)).unwrap();
    assert!(pools.singleton("a").is_some());
    assert_eq!(pools.singleton_names(), vec!["a"]);
  }

  #[test]
  fn first_contextual_publication_wins() {
    let pools = ScopePools::default();
    let r1 = ContextId::from(1_u64);
    let first = pools.publish_contextual(Scope::Request, &r1, "x", bean(1));
    let second = pools.publish_contextual(Scope::Request, &r1, "x", bean(2));
    assert!(Bean::ptr_eq(&first, &second));
    assert!(pools.contextual(Scope::Session, &r1, "x").is_none());

    assert!(pools.destroy(Scope::Request, &r1));
    assert!(pools.contextual(Scope::Request, &r1, "x").is_none());
    assert!(!pools.destroy(Scope::Request, &r1));
  }
}
