use std::fmt;
use std::sync::Arc;

/// Identifies a request or a session.
///
/// The container never interprets it: numeric request ids and string session
/// ids both convert into the same opaque key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(Arc<str>);

impl ContextId {
  pub fn new(id: impl AsRef<str>) -> Self {
    Self(Arc::from(id.as_ref()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for ContextId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ContextId({})", self.0)
  }
}

impl fmt::Display for ContextId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for ContextId {
  fn from(id: &str) -> Self {
    Self::new(id)
  }
}

impl From<String> for ContextId {
  fn from(id: String) -> Self {
    Self(Arc::from(id))
  }
}

impl From<&String> for ContextId {
  fn from(id: &String) -> Self {
    Self::new(id)
  }
}

impl From<&ContextId> for ContextId {
  fn from(id: &ContextId) -> Self {
    id.clone()
  }
}

macro_rules! impl_from_integer {
  ($($t:ty),*) => {
    $(
      impl From<$t> for ContextId {
        fn from(id: $t) -> Self {
          Self::new(id.to_string())
        }
      }
    )*
  };
}

impl_from_integer!(i32, i64, u32, u64, usize);
