//! Class descriptors: how a concrete Rust type is constructed, injected,
//! initialized and copied.
//!
//! A [`BeanClass`] is built once with a [`ClassBuilder`] and registered on the
//! container. Definitions refer to classes by name.

use crate::error::{ContainerError, Result};
use crate::value::{Args, FromValue, Value};
use dashmap::DashMap;
use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// An instance under construction, before it is published to a pool.
pub(crate) type Instance = Box<dyn Any + Send + Sync>;

type ConstructFn = Arc<dyn Fn(Args) -> Result<Instance> + Send + Sync>;
type DefaultFn = Arc<dyn Fn() -> Result<Instance> + Send + Sync>;
type InjectFn = Arc<dyn Fn(&mut (dyn Any + Send + Sync), Value) -> Result<()> + Send + Sync>;
type HookFn = Arc<dyn Fn(&mut (dyn Any + Send + Sync)) -> Result<()> + Send + Sync>;
type CopyFn = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Option<Instance> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
  Public,
  Private,
}

#[derive(Clone)]
struct Constructor {
  visibility: Visibility,
  construct: ConstructFn,
}

/// How a declared property receives its value.
#[derive(Clone)]
pub(crate) enum PropertyAccess {
  Setter(InjectFn),
  Field(InjectFn),
  Static,
}

#[derive(Clone)]
pub(crate) struct PropertySlot {
  pub(crate) name: String,
  pub(crate) access: PropertyAccess,
}

/// The properties one type in a hierarchy declares.
#[derive(Clone)]
pub(crate) struct ClassLevel {
  pub(crate) class_name: Arc<str>,
  slots: Vec<PropertySlot>,
}

impl ClassLevel {
  fn new(class_name: Arc<str>) -> Self {
    Self {
      class_name,
      slots: Vec::new(),
    }
  }

  /// The slot for `name`. A setter wins over a field of the same name.
  pub(crate) fn slot(&self, name: &str) -> Option<&PropertySlot> {
    let mut found = None;
    for slot in self.slots.iter().filter(|s| s.name == name) {
      match slot.access {
        PropertyAccess::Setter(_) => return Some(slot),
        _ => found = found.or(Some(slot)),
      }
    }
    found
  }
}

/// The registered description of a bean type.
#[derive(Clone)]
pub struct BeanClass {
  name: Arc<str>,
  rust_type: &'static str,
  constructor: Option<Constructor>,
  default: Option<DefaultFn>,
  levels: Vec<ClassLevel>,
  init: Option<HookFn>,
  copy: Option<CopyFn>,
}

impl BeanClass {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub(crate) fn shared_name(&self) -> Arc<str> {
    self.name.clone()
  }

  pub fn is_cloneable(&self) -> bool {
    self.copy.is_some()
  }

  /// Class names of the flattened hierarchy, most base first.
  pub fn hierarchy(&self) -> Vec<&str> {
    self.levels.iter().map(|l| &*l.class_name).collect()
  }

  pub(crate) fn levels(&self) -> &[ClassLevel] {
    &self.levels
  }

  pub(crate) fn instantiate(&self, args: Vec<Value>) -> Result<Instance> {
    if args.is_empty() {
      if let Some(default) = &self.default {
        return default();
      }
      return match &self.constructor {
        Some(c) if c.visibility == Visibility::Public => (c.construct)(Args::default()),
        Some(_) => Err(ContainerError::NonPublicConstructor(self.name.to_string())),
        None => Err(self.no_constructor()),
      };
    }

    match &self.constructor {
      Some(c) if c.visibility == Visibility::Public => (c.construct)(Args::new(args)),
      Some(_) => Err(ContainerError::NonPublicConstructor(self.name.to_string())),
      None => {
        tracing::warn!(
          class = %self.name,
          args = args.len(),
          "class has no constructor; ignoring constructor arguments"
        );
        match &self.default {
          Some(default) => default(),
          None => Err(self.no_constructor()),
        }
      }
    }
  }

  pub(crate) fn run_init(&self, instance: &mut Instance) -> Result<()> {
    match &self.init {
      Some(init) => init(instance.as_mut()),
      None => Ok(()),
    }
  }

  pub(crate) fn duplicate(&self, instance: &(dyn Any + Send + Sync)) -> Option<Instance> {
    self.copy.as_ref().and_then(|copy| copy(instance))
  }

  fn no_constructor(&self) -> ContainerError {
    ContainerError::InvalidValue {
      target: self.name.to_string(),
      message: "class registers no constructor".to_string(),
    }
  }
}

impl fmt::Debug for BeanClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BeanClass")
      .field("name", &self.name)
      .field("rust_type", &self.rust_type)
      .field("hierarchy", &self.hierarchy())
      .field("cloneable", &self.is_cloneable())
      .finish()
  }
}

fn mismatch<T>(class: &str) -> ContainerError {
  ContainerError::TypeMismatch {
    target: class.to_string(),
    expected: type_name::<T>().to_string(),
    found: "a different instance type".to_string(),
  }
}

/// Builds a [`BeanClass`] for the concrete type `T`.
///
/// ```
/// use fibre_bean::{ClassBuilder, Value};
///
/// #[derive(Clone, Default)]
/// struct Mailer {
///   host: String,
///   port: u16,
/// }
///
/// let class = ClassBuilder::<Mailer>::with_default("app.Mailer")
///   .constructor(|args| Ok(Mailer { host: args.next()?, port: args.next_or(25)? }))
///   .field("port", |m: &mut Mailer, port: u16| m.port = port)
///   .cloneable()
///   .build();
///
/// assert_eq!(class.name(), "app.Mailer");
/// ```
pub struct ClassBuilder<T> {
  name: Arc<str>,
  constructor: Option<Constructor>,
  default: Option<DefaultFn>,
  parent_levels: Vec<ClassLevel>,
  own: ClassLevel,
  init: Option<HookFn>,
  parent_init: Option<HookFn>,
  copy: Option<CopyFn>,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
  pub fn new(name: impl Into<String>) -> Self {
    let name: Arc<str> = Arc::from(name.into());
    Self {
      own: ClassLevel::new(name.clone()),
      name,
      constructor: None,
      default: None,
      parent_levels: Vec::new(),
      init: None,
      parent_init: None,
      copy: None,
      _marker: PhantomData,
    }
  }

  fn with_constructor<F>(mut self, visibility: Visibility, f: F) -> Self
  where
    F: Fn(&mut Args) -> Result<T> + Send + Sync + 'static,
  {
    let construct: ConstructFn = Arc::new(move |mut args: Args| {
      let instance = f(&mut args)?;
      Ok(Box::new(instance) as Instance)
    });
    self.constructor = Some(Constructor {
      visibility,
      construct,
    });
    self
  }

  /// The canonical, public constructor used for constructor injection.
  pub fn constructor<F>(self, f: F) -> Self
  where
    F: Fn(&mut Args) -> Result<T> + Send + Sync + 'static,
  {
    self.with_constructor(Visibility::Public, f)
  }

  /// A canonical constructor that may not be invoked with injected arguments.
  pub fn private_constructor<F>(self, f: F) -> Self
  where
    F: Fn(&mut Args) -> Result<T> + Send + Sync + 'static,
  {
    self.with_constructor(Visibility::Private, f)
  }

  /// The zero-argument constructor, used whenever no arguments are injected.
  pub fn default_constructor<F>(mut self, f: F) -> Self
  where
    F: Fn() -> T + Send + Sync + 'static,
  {
    self.default = Some(Arc::new(move || Ok(Box::new(f()) as Instance)));
    self
  }

  /// Flattens `parent`'s property levels (and its `init` hook, unless this
  /// class declares one) ahead of this class's own properties. `project`
  /// maps an instance to its embedded parent part.
  pub fn extends<P: Any + Send + Sync>(mut self, parent: &BeanClass, project: fn(&mut T) -> &mut P) -> Self {
    let child: Arc<str> = self.name.clone();
    let lift = |inject: &InjectFn| -> InjectFn {
      let inject = inject.clone();
      let child = child.clone();
      Arc::new(move |instance: &mut (dyn Any + Send + Sync), value: Value| {
        let this = instance.downcast_mut::<T>().ok_or_else(|| mismatch::<T>(&child))?;
        inject(project(this), value)
      })
    };

    self.parent_levels = parent
      .levels
      .iter()
      .map(|level| ClassLevel {
        class_name: level.class_name.clone(),
        slots: level
          .slots
          .iter()
          .map(|slot| PropertySlot {
            name: slot.name.clone(),
            access: match &slot.access {
              PropertyAccess::Setter(f) => PropertyAccess::Setter(lift(f)),
              PropertyAccess::Field(f) => PropertyAccess::Field(lift(f)),
              PropertyAccess::Static => PropertyAccess::Static,
            },
          })
          .collect(),
      })
      .collect();

    self.parent_init = parent.init.as_ref().map(|init| {
      let init = init.clone();
      let child = child.clone();
      Arc::new(move |instance: &mut (dyn Any + Send + Sync)| {
        let this = instance.downcast_mut::<T>().ok_or_else(|| mismatch::<T>(&child))?;
        init(project(this))
      }) as HookFn
    });
    self
  }

  fn typed_inject<V, F>(&self, f: F) -> InjectFn
  where
    V: FromValue,
    F: Fn(&mut T, V) -> Result<()> + Send + Sync + 'static,
  {
    let class = self.name.clone();
    Arc::new(move |instance: &mut (dyn Any + Send + Sync), value: Value| {
      let this = instance.downcast_mut::<T>().ok_or_else(|| mismatch::<T>(&class))?;
      f(this, V::from_value(value)?)
    })
  }

  /// A property assigned directly.
  pub fn field<V, F>(mut self, name: impl Into<String>, f: F) -> Self
  where
    V: FromValue,
    F: Fn(&mut T, V) + Send + Sync + 'static,
  {
    let inject = self.typed_inject(move |this: &mut T, value: V| {
      f(this, value);
      Ok(())
    });
    self.own.slots.push(PropertySlot {
      name: name.into(),
      access: PropertyAccess::Field(inject),
    });
    self
  }

  /// A property assigned through a setter. Preferred over a field of the same
  /// name.
  pub fn setter<V, F>(mut self, name: impl Into<String>, f: F) -> Self
  where
    V: FromValue,
    F: Fn(&mut T, V) -> Result<()> + Send + Sync + 'static,
  {
    let inject = self.typed_inject(f);
    self.own.slots.push(PropertySlot {
      name: name.into(),
      access: PropertyAccess::Setter(inject),
    });
    self
  }

  /// A shared property. Injecting into it is a configuration error.
  pub fn static_field(mut self, name: impl Into<String>) -> Self {
    self.own.slots.push(PropertySlot {
      name: name.into(),
      access: PropertyAccess::Static,
    });
    self
  }

  /// The `init` hook, run after injection and before publication.
  pub fn init<F>(mut self, f: F) -> Self
  where
    F: Fn(&mut T) -> Result<()> + Send + Sync + 'static,
  {
    let class = self.name.clone();
    self.init = Some(Arc::new(move |instance: &mut (dyn Any + Send + Sync)| {
      let this = instance.downcast_mut::<T>().ok_or_else(|| mismatch::<T>(&class))?;
      f(this)
    }));
    self
  }

  pub fn build(self) -> BeanClass {
    let mut levels = self.parent_levels;
    levels.push(self.own);
    BeanClass {
      name: self.name,
      rust_type: type_name::<T>(),
      constructor: self.constructor,
      default: self.default,
      levels,
      init: self.init.or(self.parent_init),
      copy: self.copy,
    }
  }
}

impl<T: Any + Send + Sync + Default> ClassBuilder<T> {
  /// A builder whose zero-argument constructor is `T::default`.
  pub fn with_default(name: impl Into<String>) -> Self {
    Self::new(name).default_constructor(T::default)
  }
}

impl<T: Any + Send + Sync + Clone> ClassBuilder<T> {
  /// Makes the class prototype-eligible, copying instances with `Clone`.
  pub fn cloneable(mut self) -> Self {
    self.copy = Some(Arc::new(|instance: &(dyn Any + Send + Sync)| {
      instance
        .downcast_ref::<T>()
        .map(|this| Box::new(this.clone()) as Instance)
    }));
    self
  }
}

/// Class name → descriptor.
#[derive(Default)]
pub(crate) struct ClassRegistry {
  classes: DashMap<String, Arc<BeanClass>>,
}

impl ClassRegistry {
  pub(crate) fn register(&self, class: BeanClass) {
    tracing::debug!(class = %class.name, rust_type = class.rust_type, "registered bean class");
    self.classes.insert(class.name.to_string(), Arc::new(class));
  }

  pub(crate) fn get(&self, name: &str) -> Result<Arc<BeanClass>> {
    self
      .classes
      .get(name)
      .map(|entry| entry.value().clone())
      .ok_or_else(|| ContainerError::UndefinedClass(name.to_string()))
  }
}
