//! Normalized bean definitions and the raw configuration form they are
//! compiled from.

use crate::error::{ContainerError, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The name of the canonical constructor targeted by constructor injection.
pub const CONSTRUCTOR: &str = "new";

/// Lifetime and sharing policy of a bean.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
  #[default]
  Singleton,
  Prototype,
  Request,
  Session,
}

impl Scope {
  pub fn as_str(&self) -> &'static str {
    match self {
      Scope::Singleton => "singleton",
      Scope::Prototype => "prototype",
      Scope::Request => "request",
      Scope::Session => "session",
    }
  }

  /// Request and session beans live in per-context pools.
  pub fn is_contextual(&self) -> bool {
    matches!(self, Scope::Request | Scope::Session)
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Scope {
  type Err = ContainerError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "singleton" => Ok(Scope::Singleton),
      "prototype" => Ok(Scope::Prototype),
      "request" => Ok(Scope::Request),
      "session" => Ok(Scope::Session),
      other => Err(ContainerError::Metadata(format!("unknown scope `{other}`"))),
    }
  }
}

/// A constructor argument.
#[derive(Clone, Debug, PartialEq)]
pub struct ArgsInjection {
  value: Value,
  is_ref: bool,
}

impl ArgsInjection {
  pub fn new(value: Value, is_ref: bool) -> Self {
    Self { value, is_ref }
  }

  pub fn value(&self) -> &Value {
    &self.value
  }

  pub fn is_ref(&self) -> bool {
    self.is_ref
  }
}

/// Constructor injection: the targeted method and its ordered arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodInjection {
  method: String,
  args: Vec<ArgsInjection>,
}

impl MethodInjection {
  pub fn new(method: impl Into<String>, args: Vec<ArgsInjection>) -> Self {
    Self {
      method: method.into(),
      args,
    }
  }

  pub fn constructor(args: Vec<ArgsInjection>) -> Self {
    Self::new(CONSTRUCTOR, args)
  }

  pub fn method(&self) -> &str {
    &self.method
  }

  pub fn args(&self) -> &[ArgsInjection] {
    &self.args
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyInjection {
  name: String,
  value: Value,
  is_ref: bool,
}

impl PropertyInjection {
  pub fn new(name: impl Into<String>, value: Value, is_ref: bool) -> Self {
    Self {
      name: name.into(),
      value,
      is_ref,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn value(&self) -> &Value {
    &self.value
  }

  pub fn is_ref(&self) -> bool {
    self.is_ref
  }
}

/// The recipe for one bean.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectDefinition {
  name: String,
  class_name: String,
  scope: Scope,
  alias: Option<String>,
  constructor: Option<MethodInjection>,
  properties: Vec<PropertyInjection>,
}

impl ObjectDefinition {
  pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      class_name: class_name.into(),
      scope: Scope::default(),
      alias: None,
      constructor: None,
      properties: Vec::new(),
    }
  }

  pub fn with_scope(mut self, scope: Scope) -> Self {
    self.scope = scope;
    self
  }

  pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
    self.alias = Some(alias.into());
    self
  }

  pub fn with_constructor(mut self, constructor: MethodInjection) -> Self {
    self.constructor = Some(constructor);
    self
  }

  /// Adds a property injection, replacing an earlier one of the same name.
  pub fn with_property(mut self, property: PropertyInjection) -> Self {
    self.set_property(property);
    self
  }

  pub(crate) fn set_property(&mut self, property: PropertyInjection) {
    match self.properties.iter_mut().find(|p| p.name == property.name) {
      Some(existing) => *existing = property,
      None => self.properties.push(property),
    }
  }

  pub(crate) fn set_class_name(&mut self, class_name: String) {
    self.class_name = class_name;
  }

  pub(crate) fn set_scope(&mut self, scope: Scope) {
    self.scope = scope;
  }

  pub(crate) fn set_alias(&mut self, alias: Option<String>) {
    self.alias = alias;
  }

  pub(crate) fn set_constructor(&mut self, constructor: Option<MethodInjection>) {
    self.constructor = constructor;
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn class_name(&self) -> &str {
    &self.class_name
  }

  pub fn scope(&self) -> Scope {
    self.scope
  }

  pub fn alias(&self) -> Option<&str> {
    self.alias.as_deref()
  }

  pub fn constructor(&self) -> Option<&MethodInjection> {
    self.constructor.as_ref()
  }

  pub fn properties(&self) -> &[PropertyInjection] {
    &self.properties
  }
}

/// The `options` block of a raw definition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionOptions {
  #[serde(default)]
  pub scope: Option<Scope>,
  #[serde(default)]
  pub alias: Option<String>,
}

/// A raw definition as written in configuration files or passed to
/// [`Container::create`](crate::Container::create).
///
/// String values of the form `${name}` are references: `${db}` names the
/// bean `db`, `${config.db.url}` is an external reference.
///
/// ```yaml
/// mailer:
///   class: app.Mailer
///   args: ["${config.mail.host}", 25]
///   properties:
///     templates: "${templateStore}"
///   options:
///     scope: prototype
///     alias: mail
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionSpec {
  #[serde(default)]
  pub class: Option<String>,
  /// The constructor injection target; only `new` is valid.
  #[serde(default)]
  pub constructor: Option<String>,
  #[serde(default)]
  pub args: Option<Vec<serde_json::Value>>,
  #[serde(default)]
  pub properties: BTreeMap<String, serde_json::Value>,
  #[serde(default)]
  pub options: DefinitionOptions,
}

impl DefinitionSpec {
  pub fn new(class: impl Into<String>) -> Self {
    Self {
      class: Some(class.into()),
      ..Self::default()
    }
  }

  pub fn arg(mut self, value: impl Into<serde_json::Value>) -> Self {
    self.args.get_or_insert_with(Vec::new).push(value.into());
    self
  }

  pub fn property(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
    self.properties.insert(name.into(), value.into());
    self
  }

  pub fn scope(mut self, scope: Scope) -> Self {
    self.options.scope = Some(scope);
    self
  }

  pub fn alias(mut self, alias: impl Into<String>) -> Self {
    self.options.alias = Some(alias.into());
    self
  }
}
