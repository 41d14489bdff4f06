use thiserror::Error;

/// The main error type for the `fibre_bean` library.
#[derive(Debug, Error)]
pub enum ContainerError {
  #[error("The bean of {0} is not defined")]
  UndefinedBean(String),

  #[error("Request bean({0}) is not defined")]
  UndefinedRequestBean(String),

  #[error("Session bean({0}) is not defined")]
  UndefinedSessionBean(String),

  #[error("Create {0} bean by definition is exist!")]
  DuplicateDefinition(String),

  #[error("Class {0} is not registered")]
  UndefinedClass(String),

  #[error("Construct function for bean class {0} must be public")]
  NonPublicConstructor(String),

  #[error("Constructor injection for bean {bean} must target `new`, found `{method}`")]
  InvalidConstructorInjection { bean: String, method: String },

  #[error("Property {property} for bean class {class} can not be static")]
  StaticPropertyInjection { class: String, property: String },

  #[error("Prototype bean {bean} needs a copy operation on class {class}")]
  NotCloneable { bean: String, class: String },

  #[error("Bean {bean} is {scope}-scoped and needs a context id")]
  MissingContext { bean: String, scope: String },

  #[error("Expected {expected} for {target}, found {found}")]
  TypeMismatch {
    target: String,
    expected: String,
    found: String,
  },

  #[error("Invalid value for {target}: {message}")]
  InvalidValue { target: String, message: String },

  #[error("Circular reference while building bean {0}")]
  CircularReference(String),

  #[error("Resolution depth of {depth} exceeded while building bean {bean}")]
  ResolutionDepthExceeded { bean: String, depth: usize },

  #[error("Container is already initialized")]
  AlreadyInitialized,

  #[error("Metadata error: {0}")]
  Metadata(String),

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),
}

/// A specialized `Result` type for `fibre_bean` operations.
pub type Result<T, E = ContainerError> = std::result::Result<T, E>;
