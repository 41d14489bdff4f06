//! # Fibre Bean
//!
//! A thread-safe bean container for Rust, driven by definitions rather than
//! factories.
//!
//! Types are registered once as [`BeanClass`]es, describing how they are
//! constructed, which properties can be injected and how they are copied.
//! Beans are then declared by name, either in code, in YAML/JSON definition
//! files or through annotation data, and the container wires them together.
//!
//! ## Core Concepts
//!
//! - **Container**: Holds classes, definitions and the scope pools. There is
//!   no global instance; create one and share it as an `Arc<Container>`.
//! - **Scopes**: `singleton` beans are built once, `prototype` beans are
//!   copied from a retained template on every lookup, and `request` /
//!   `session` beans live in pools keyed by a [`ContextId`].
//! - **References**: `${name}` in a definition injects another bean;
//!   `${config.db.url}` is an external reference resolved by a [`Handler`].
//! - **Lookup**: [`Container::get`] accepts a bean name, an alias or a class
//!   name. The [`bean!`] macro panics if resolution fails.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_bean::{bean, ClassBuilder, Container, DefinitionSpec, Scope};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Database {
//!   url: String,
//! }
//!
//! #[derive(Clone, Default)]
//! struct Repository {
//!   db: Option<Arc<Database>>,
//!   table: String,
//! }
//!
//! let container = Container::new();
//! container.add_classes([
//!   ClassBuilder::<Database>::with_default("Database")
//!     .field("url", |d: &mut Database, url: String| d.url = url)
//!     .build(),
//!   ClassBuilder::<Repository>::with_default("Repository")
//!     .field("db", |r: &mut Repository, db: Arc<Database>| r.db = Some(db))
//!     .field("table", |r: &mut Repository, table: String| r.table = table)
//!     .cloneable()
//!     .build(),
//! ]);
//!
//! container.add_definitions([
//!   ("db".to_string(), DefinitionSpec::new("Database").property("url", "pg://localhost")),
//!   (
//!     "users".to_string(),
//!     DefinitionSpec::new("Repository")
//!       .property("db", "${db}")
//!       .property("table", "users")
//!       .scope(Scope::Prototype),
//!   ),
//! ]);
//! container.init().unwrap();
//!
//! let users = bean!(container, Repository, "users");
//! assert_eq!(users.table, "users");
//! assert_eq!(users.db.as_ref().unwrap().url, "pg://localhost");
//!
//! // Prototypes are copies; the singleton they reference is shared.
//! let other = bean!(container, Repository, "users");
//! assert!(!Arc::ptr_eq(&users, &other));
//! assert!(Arc::ptr_eq(users.db.as_ref().unwrap(), other.db.as_ref().unwrap()));
//! ```

mod builder;
mod class;
mod config;
mod container;
mod context;
mod core;
mod definition;
mod error;
mod handler;
mod macros;
mod parser;
mod pool;
mod registry;
mod resolver;
mod value;

pub use class::{BeanClass, ClassBuilder, Visibility};
pub use config::{read_definitions, ContainerConfig};
pub use container::{BeanNames, Container, ContainerStats};
pub use context::ContextId;
pub use definition::{
  ArgsInjection, DefinitionOptions, DefinitionSpec, MethodInjection, ObjectDefinition, PropertyInjection, Scope,
  CONSTRUCTOR,
};
pub use error::{ContainerError, Result};
pub use handler::{ConfigHandler, Handler};
pub use parser::{Annotation, AnnotationParser, AnnotationSources, BeanParser, ClassAnnotations, DefinitionDraft, InjectParser};
pub use value::{Args, Bean, FromValue, Value};
