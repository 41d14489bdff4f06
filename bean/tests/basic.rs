use fibre_bean::{BeanClass, ClassBuilder, Container, ContainerError, ContainerStats, DefinitionSpec, Scope};
use std::sync::Arc;

// --- Test Fixtures ---

#[derive(Debug, Clone, Default, PartialEq)]
struct Counter {
  label: String,
  hits: u32,
}

fn counter_class() -> BeanClass {
  ClassBuilder::<Counter>::with_default("Counter")
    .field("label", |c: &mut Counter, label: String| c.label = label)
    .field("hits", |c: &mut Counter, hits: u32| c.hits = hits)
    .cloneable()
    .build()
}

fn counter(label: &str) -> DefinitionSpec {
  DefinitionSpec::new("Counter").property("label", label)
}

fn container_with(definitions: Vec<(&str, DefinitionSpec)>) -> Container {
  let container = Container::new();
  container.add_class(counter_class());
  container.add_definitions(definitions.into_iter().map(|(name, spec)| (name.to_string(), spec)));
  container.init().unwrap();
  container
}

// --- Basic Tests ---

#[test]
fn test_singleton_lookups_share_one_instance() {
  // Arrange
  let container = container_with(vec![("main", counter("x"))]);

  // Act
  let first = container.get("main").unwrap();
  let second = container.get("main").unwrap();

  // Assert
  assert!(fibre_bean::Bean::ptr_eq(&first, &second));
  assert_eq!(container.get_as::<Counter>("main").unwrap().label, "x");
  assert!(container.is_singleton("main"));
}

#[test]
fn test_prototype_lookups_are_independent_copies() {
  // Arrange
  let container = container_with(vec![("proto", counter("p").property("hits", 3).scope(Scope::Prototype))]);

  // Act
  let a = container.get_as::<Counter>("proto").unwrap();
  let b = container.get_as::<Counter>("proto").unwrap();

  // Assert
  assert!(!Arc::ptr_eq(&a, &b));
  assert_eq!(*a, *b);
  assert_eq!(a.hits, 3);
  assert!(!container.is_singleton("proto"));
}

#[test]
fn test_alias_resolves_to_the_canonical_bean() {
  let container = container_with(vec![("main", counter("x").alias("primary"))]);

  let by_alias = container.get("primary").unwrap();
  let by_name = container.get("main").unwrap();

  assert!(fibre_bean::Bean::ptr_eq(&by_alias, &by_name));
  assert!(container.has("primary"));
  assert!(container.is_singleton("primary"));
  assert!(fibre_bean::Bean::ptr_eq(&container.get_singleton("primary").unwrap(), &by_name));
}

#[test]
fn test_class_name_lookup_picks_the_last_registered_bean() {
  // Arrange
  let container = container_with(vec![("one", counter("first")), ("two", counter("second"))]);

  // Act & Assert
  assert_eq!(container.get_as::<Counter>("Counter").unwrap().label, "second");
  assert!(container.has("Counter"));

  // A bean created later becomes the one returned for the class.
  container.create("three", counter("third")).unwrap();
  assert_eq!(container.get_as::<Counter>("Counter").unwrap().label, "third");
}

#[test]
fn test_class_name_lookup_follows_registration_not_name_order() {
  // Arrange
  let container = Container::new();
  container.add_class(counter_class());
  container.add_definitions([("zeta".to_string(), counter("registered-first"))]);
  container.add_definitions([("alpha".to_string(), counter("registered-last"))]);

  // Act
  container.init().unwrap();

  // Assert
  assert_eq!(container.get_as::<Counter>("Counter").unwrap().label, "registered-last");
}

#[test]
fn test_unknown_ids_are_undefined() {
  let container = container_with(vec![]);

  assert!(!container.has("nope"));
  match container.get("nope") {
    Err(ContainerError::UndefinedBean(name)) => assert_eq!(name, "nope"),
    other => panic!("unexpected result: {other:?}"),
  }
}

#[test]
fn test_get_singleton_and_get_prototype_never_build() {
  // Arrange
  let container = Container::new();
  container.add_class(counter_class());
  container.add_definitions([
    ("main".to_string(), counter("x")),
    ("proto".to_string(), counter("p").scope(Scope::Prototype)),
  ]);

  // Nothing is built before init.
  assert!(matches!(container.get_singleton("main"), Err(ContainerError::UndefinedBean(_))));
  assert!(matches!(container.get_prototype("proto"), Err(ContainerError::UndefinedBean(_))));

  container.init().unwrap();

  // Act & Assert
  assert!(container.get_singleton("main").is_ok());
  assert!(container.get_prototype("proto").is_ok());
  assert!(matches!(container.get_prototype("main"), Err(ContainerError::UndefinedBean(_))));
  assert!(matches!(container.get_singleton("proto"), Err(ContainerError::UndefinedBean(_))));
}

#[test]
fn test_create_builds_immediately_and_rejects_duplicates() {
  // Arrange
  let container = container_with(vec![("main", counter("x"))]);

  // Act
  let fresh = container.create("fresh", counter("f")).unwrap();

  // Assert
  assert_eq!(fresh.downcast::<Counter>().unwrap().label, "f");
  assert!(container.is_singleton("fresh"));
  assert!(matches!(
    container.create("fresh", counter("again")),
    Err(ContainerError::DuplicateDefinition(_))
  ));
  // Class names and aliases count as taken too.
  assert!(matches!(
    container.create("Counter", counter("c")),
    Err(ContainerError::DuplicateDefinition(_))
  ));
}

#[test]
fn test_create_defaults_the_class_to_the_name() {
  let container = container_with(vec![]);

  let bean = container.create("Counter", DefinitionSpec::default()).unwrap();

  assert_eq!(bean.class_name(), "Counter");
  assert!(bean.is::<Counter>());
}

#[test]
fn test_create_rejects_context_scoped_specs() {
  let container = container_with(vec![]);

  let result = container.create("cart", counter("c").scope(Scope::Request));

  assert!(matches!(result, Err(ContainerError::MissingContext { .. })));
  assert!(!container.has("cart"));
}

#[test]
fn test_init_runs_once() {
  let container = container_with(vec![("main", counter("x"))]);

  assert!(container.is_initialized());
  assert!(matches!(container.init(), Err(ContainerError::AlreadyInitialized)));
}

#[test]
fn test_stats_and_names() {
  // Arrange
  let container = container_with(vec![
    ("main", counter("x")),
    ("proto", counter("p").scope(Scope::Prototype)),
    ("cart", counter("c").scope(Scope::Request)),
  ]);

  // Act
  container.get_request_bean("cart", 7_u64).unwrap();
  let stats = container.stats();
  let names = container.names();

  // Assert
  assert_eq!(
    stats,
    ContainerStats {
      singleton_count: 1,
      prototype_count: 1,
      definition_count: 3,
    }
  );
  assert_eq!(names.definition, vec!["cart", "main", "proto"]);
  assert_eq!(names.singleton, vec!["main"]);
  assert_eq!(names.prototype, vec!["proto"]);
  assert_eq!(names.request, vec!["7"]);
  assert!(names.session.is_empty());
}

#[test]
fn test_get_as_reports_type_mismatch() {
  let container = container_with(vec![("main", counter("x"))]);

  match container.get_as::<String>("main") {
    Err(ContainerError::TypeMismatch { target, found, .. }) => {
      assert_eq!(target, "main");
      assert_eq!(found, "Counter");
    }
    other => panic!("unexpected result: {other:?}"),
  }
}
