//! Core, non-public data structures for the bean container.

use crate::error::{ContainerError, Result};
use std::cell::RefCell;

thread_local! {
  // Names of the beans currently being built on this thread, outermost first.
  static BUILDING: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// An RAII guard bounding recursive bean construction.
///
/// Entering a name that is already being built on this thread means the
/// definitions reference each other in a cycle; building it again would never
/// terminate (or would block on its own singleton slot), so it fails instead.
/// The depth limit catches everything else. Dropping the guard pops the name.
pub(crate) struct ResolutionGuard {
  _private: (),
}

impl ResolutionGuard {
  pub(crate) fn enter(bean: &str, max_depth: usize) -> Result<Self> {
    BUILDING.with(|stack| {
      let mut stack = stack.borrow_mut();
      if stack.iter().any(|name| name == bean) {
        let mut chain = stack.join(" -> ");
        chain.push_str(" -> ");
        chain.push_str(bean);
        return Err(ContainerError::CircularReference(chain));
      }
      if stack.len() >= max_depth {
        return Err(ContainerError::ResolutionDepthExceeded {
          bean: bean.to_string(),
          depth: max_depth,
        });
      }
      stack.push(bean.to_string());
      Ok(Self { _private: () })
    })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    BUILDING.with(|stack| {
      stack.borrow_mut().pop();
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reentry_reports_the_chain() {
    let _a = ResolutionGuard::enter("a", 8).unwrap();
    let _b = ResolutionGuard::enter("b", 8).unwrap();
    match ResolutionGuard::enter("a", 8) {
      Err(ContainerError::CircularReference(chain)) => assert_eq!(chain, "a -> b -> a"),
      other => panic!("unexpected: {:?}", other.err()),
    }
  }

  #[test]
  fn guard_pops_on_drop() {
    {
      let _a = ResolutionGuard::enter("x", 8).unwrap();
    }
    assert!(ResolutionGuard::enter("x", 8).is_ok());
  }

  #[test]
  fn depth_is_bounded() {
    let _a = ResolutionGuard::enter("a", 1).unwrap();
    assert!(matches!(
      ResolutionGuard::enter("b", 1),
      Err(ContainerError::ResolutionDepthExceeded { depth: 1, .. })
    ));
  }
}
