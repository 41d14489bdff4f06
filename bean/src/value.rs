//! Dynamic values flowing through definitions and injections.

use crate::error::{ContainerError, Result};
use std::any::{type_name, Any};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// A handle to an instance owned by the container.
///
/// Cloning a `Bean` clones the handle, not the instance; two handles are the
/// same bean when [`Bean::ptr_eq`] holds.
#[derive(Clone)]
pub struct Bean {
  instance: Arc<dyn Any + Send + Sync>,
  class: Arc<str>,
}

impl Bean {
  pub(crate) fn new(instance: Arc<dyn Any + Send + Sync>, class: Arc<str>) -> Self {
    Self { instance, class }
  }

  /// The class the bean was built from.
  pub fn class_name(&self) -> &str {
    &self.class
  }

  /// Returns the instance as `Arc<T>` when the bean is a `T`.
  pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.instance.clone().downcast::<T>().ok()
  }

  pub fn is<T: Any + Send + Sync>(&self) -> bool {
    self.instance.is::<T>()
  }

  pub fn as_any(&self) -> &(dyn Any + Send + Sync) {
    &*self.instance
  }

  /// Returns `true` when both handles point at the same instance.
  pub fn ptr_eq(a: &Bean, b: &Bean) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(&a.instance), Arc::as_ptr(&b.instance))
  }
}

impl fmt::Debug for Bean {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Bean({} @ {:p})", self.class, Arc::as_ptr(&self.instance))
  }
}

/// A definition value: a literal, a nested structure, a reference marker or
/// an already resolved bean.
#[derive(Clone, Debug, Default)]
pub enum Value {
  #[default]
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  List(Vec<Value>),
  Map(BTreeMap<String, Value>),
  /// A reference nested inside a list or map, resolved during injection.
  Ref(String),
  Bean(Bean),
}

impl Value {
  /// Mirrors the "empty" test applied to constructor arguments: null, false,
  /// zero, the empty string and empty containers.
  pub fn is_empty(&self) -> bool {
    match self {
      Value::Null => true,
      Value::Bool(b) => !*b,
      Value::Int(i) => *i == 0,
      Value::Float(f) => *f == 0.0,
      Value::Str(s) => s.is_empty(),
      Value::List(items) => items.is_empty(),
      Value::Map(entries) => entries.is_empty(),
      Value::Ref(_) | Value::Bean(_) => false,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Value::Null => "null",
      Value::Bool(_) => "bool",
      Value::Int(_) => "int",
      Value::Float(_) => "float",
      Value::Str(_) => "string",
      Value::List(_) => "list",
      Value::Map(_) => "map",
      Value::Ref(_) => "reference",
      Value::Bean(_) => "bean",
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Str(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_bean(&self) -> Option<&Bean> {
    match self {
      Value::Bean(bean) => Some(bean),
      _ => None,
    }
  }

  pub fn is_container(&self) -> bool {
    matches!(self, Value::List(_) | Value::Map(_))
  }

  /// Converts the value into a typed Rust value.
  pub fn into_typed<T: FromValue>(self) -> Result<T> {
    T::from_value(self)
  }

  /// Converts plain JSON data. Strings stay strings; reference markers are
  /// recognised by the definition compiler, not here.
  pub fn from_json(json: serde_json::Value) -> Value {
    match json {
      serde_json::Value::Null => Value::Null,
      serde_json::Value::Bool(b) => Value::Bool(b),
      serde_json::Value::Number(n) => match n.as_i64() {
        Some(i) => Value::Int(i),
        None => Value::Float(n.as_f64().unwrap_or_default()),
      },
      serde_json::Value::String(s) => Value::Str(s),
      serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
      serde_json::Value::Object(entries) => Value::Map(
        entries
          .into_iter()
          .map(|(k, v)| (k, Value::from_json(v)))
          .collect(),
      ),
    }
  }

  fn mismatch<T>(self, expected: &str) -> ContainerError {
    ContainerError::TypeMismatch {
      target: type_name::<T>().to_string(),
      expected: expected.to_string(),
      found: self.kind().to_string(),
    }
  }
}

impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Null, Value::Null) => true,
      (Value::Bool(a), Value::Bool(b)) => a == b,
      (Value::Int(a), Value::Int(b)) => a == b,
      (Value::Float(a), Value::Float(b)) => a == b,
      (Value::Str(a), Value::Str(b)) => a == b,
      (Value::List(a), Value::List(b)) => a == b,
      (Value::Map(a), Value::Map(b)) => a == b,
      (Value::Ref(a), Value::Ref(b)) => a == b,
      (Value::Bean(a), Value::Bean(b)) => Bean::ptr_eq(a, b),
      _ => false,
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::Str(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::Str(s)
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self {
    Value::Int(i)
  }
}

impl From<i32> for Value {
  fn from(i: i32) -> Self {
    Value::Int(i64::from(i))
  }
}

impl From<f64> for Value {
  fn from(f: f64) -> Self {
    Value::Float(f)
  }
}

impl From<Vec<Value>> for Value {
  fn from(items: Vec<Value>) -> Self {
    Value::List(items)
  }
}

impl From<Bean> for Value {
  fn from(bean: Bean) -> Self {
    Value::Bean(bean)
  }
}

/// Conversion from an injected [`Value`] into the type a constructor,
/// setter or field expects.
pub trait FromValue: Sized {
  fn from_value(value: Value) -> Result<Self>;
}

impl FromValue for Value {
  fn from_value(value: Value) -> Result<Self> {
    Ok(value)
  }
}

impl FromValue for String {
  fn from_value(value: Value) -> Result<Self> {
    match value {
      Value::Str(s) => Ok(s),
      other => Err(other.mismatch::<Self>("string")),
    }
  }
}

impl FromValue for bool {
  fn from_value(value: Value) -> Result<Self> {
    match value {
      Value::Bool(b) => Ok(b),
      other => Err(other.mismatch::<Self>("bool")),
    }
  }
}

macro_rules! impl_from_value_int {
  ($($t:ty),*) => {
    $(
      impl FromValue for $t {
        fn from_value(value: Value) -> Result<Self> {
          match value {
            Value::Int(i) => <$t>::try_from(i).map_err(|e| ContainerError::InvalidValue {
              target: type_name::<$t>().to_string(),
              message: e.to_string(),
            }),
            other => Err(other.mismatch::<Self>("int")),
          }
        }
      }
    )*
  };
}

impl_from_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
  fn from_value(value: Value) -> Result<Self> {
    match value {
      Value::Float(f) => Ok(f),
      Value::Int(i) => Ok(i as f64),
      other => Err(other.mismatch::<Self>("float")),
    }
  }
}

impl FromValue for f32 {
  fn from_value(value: Value) -> Result<Self> {
    f64::from_value(value).map(|f| f as f32)
  }
}

impl<T: FromValue> FromValue for Option<T> {
  fn from_value(value: Value) -> Result<Self> {
    match value {
      Value::Null => Ok(None),
      other => T::from_value(other).map(Some),
    }
  }
}

impl<T: FromValue> FromValue for Vec<T> {
  fn from_value(value: Value) -> Result<Self> {
    match value {
      Value::List(items) => items.into_iter().map(T::from_value).collect(),
      other => Err(other.mismatch::<Self>("list")),
    }
  }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
  fn from_value(value: Value) -> Result<Self> {
    match value {
      Value::Map(entries) => entries
        .into_iter()
        .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
        .collect(),
      other => Err(other.mismatch::<Self>("map")),
    }
  }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
  fn from_value(value: Value) -> Result<Self> {
    BTreeMap::<String, T>::from_value(value).map(|entries| entries.into_iter().collect())
  }
}

impl FromValue for Bean {
  fn from_value(value: Value) -> Result<Self> {
    match value {
      Value::Bean(bean) => Ok(bean),
      other => Err(other.mismatch::<Self>("bean")),
    }
  }
}

impl<T: Any + Send + Sync> FromValue for Arc<T> {
  fn from_value(value: Value) -> Result<Self> {
    match value {
      Value::Bean(bean) => bean.downcast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
        target: type_name::<Self>().to_string(),
        expected: type_name::<T>().to_string(),
        found: bean.class_name().to_string(),
      }),
      other => Err(other.mismatch::<Self>("bean")),
    }
  }
}

/// Resolved constructor arguments, consumed in declaration order.
#[derive(Debug, Default)]
pub struct Args {
  values: std::vec::IntoIter<Value>,
  position: usize,
}

impl Args {
  pub fn new(values: Vec<Value>) -> Self {
    Self {
      values: values.into_iter(),
      position: 0,
    }
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.len() == 0
  }

  /// Takes the next argument as a `T`. Missing arguments are an error.
  pub fn next<T: FromValue>(&mut self) -> Result<T> {
    self.position += 1;
    match self.values.next() {
      Some(value) => T::from_value(value),
      None => Err(ContainerError::InvalidValue {
        target: format!("constructor argument #{}", self.position),
        message: "missing".to_string(),
      }),
    }
  }

  /// Takes the next argument, falling back to `default` when absent.
  pub fn next_or<T: FromValue>(&mut self, default: T) -> Result<T> {
    if self.is_empty() {
      self.position += 1;
      return Ok(default);
    }
    self.next()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_values_follow_the_loose_rule() {
    assert!(Value::Null.is_empty());
    assert!(Value::Bool(false).is_empty());
    assert!(Value::Int(0).is_empty());
    assert!(Value::from("").is_empty());
    assert!(Value::List(vec![]).is_empty());
    assert!(!Value::from("db").is_empty());
    assert!(!Value::Ref("db".into()).is_empty());
  }

  #[test]
  fn integers_convert_with_range_checks() {
    assert_eq!(u16::from_value(Value::Int(8080)).unwrap(), 8080);
    assert!(matches!(
      u8::from_value(Value::Int(300)),
      Err(ContainerError::InvalidValue { .. })
    ));
    assert!(matches!(
      u8::from_value(Value::from("x")),
      Err(ContainerError::TypeMismatch { .. })
    ));
  }

  #[test]
  fn nested_containers_convert() {
    let value = Value::from_json(serde_json::json!({"a": [1, 2], "b": []}));
    let map: BTreeMap<String, Vec<i32>> = value.into_typed().unwrap();
    assert_eq!(map["a"], vec![1, 2]);
    assert!(map["b"].is_empty());
  }

  #[test]
  fn beans_downcast_through_arc() {
    let bean = Bean::new(Arc::new(7_u32), Arc::from("u32"));
    let typed: Arc<u32> = Value::Bean(bean.clone()).into_typed().unwrap();
    assert_eq!(*typed, 7);
    assert!(Arc::<String>::from_value(Value::Bean(bean)).is_err());
  }

  #[test]
  fn args_are_taken_in_order() {
    let mut args = Args::new(vec![Value::from("x"), Value::Int(3)]);
    assert_eq!(args.len(), 2);
    assert_eq!(args.next::<String>().unwrap(), "x");
    assert_eq!(args.next::<i32>().unwrap(), 3);
    assert_eq!(args.next_or::<i32>(9).unwrap(), 9);
    assert!(args.next::<i32>().is_err());
  }
}
