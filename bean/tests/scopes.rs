use fibre_bean::{Bean, ClassBuilder, Container, ContainerError, DefinitionSpec, Scope};
use std::sync::Arc;

// --- Test Fixtures ---

#[derive(Default)]
struct User {
  name: String,
}

#[derive(Default)]
struct Cart {
  owner: Option<Arc<User>>,
}

fn container() -> Container {
  let container = Container::new();
  container.add_classes([
    ClassBuilder::<User>::with_default("User")
      .field("name", |u: &mut User, name: String| u.name = name)
      .build(),
    ClassBuilder::<Cart>::with_default("Cart")
      .field("owner", |c: &mut Cart, owner: Arc<User>| c.owner = Some(owner))
      .build(),
  ]);
  container.add_definitions([
    (
      "user".to_string(),
      DefinitionSpec::new("User").property("name", "guest").scope(Scope::Request),
    ),
    (
      "cart".to_string(),
      DefinitionSpec::new("Cart").property("owner", "${user}").scope(Scope::Request),
    ),
    ("profile".to_string(), DefinitionSpec::new("User").scope(Scope::Session)),
    ("admin".to_string(), DefinitionSpec::new("User").property("name", "root")),
  ]);
  container.init().unwrap();
  container
}

// --- Request Scope ---

#[test]
fn test_request_beans_are_isolated_per_context() {
  // Arrange
  let container = container();

  // Act
  let r1 = container.get_request_bean("cart", 1_u64).unwrap();
  let r1_again = container.get_request_bean("cart", 1_u64).unwrap();
  let r2 = container.get_request_bean("cart", 2_u64).unwrap();

  // Assert
  assert!(Bean::ptr_eq(&r1, &r1_again));
  assert!(!Bean::ptr_eq(&r1, &r2));
}

#[test]
fn test_request_references_stay_inside_the_context() {
  let container = container();

  let cart = container.get_request_bean("cart", 1_u64).unwrap().downcast::<Cart>().unwrap();
  let user = container.get_request_bean("user", 1_u64).unwrap().downcast::<User>().unwrap();
  let other_user = container.get_request_bean("user", 2_u64).unwrap().downcast::<User>().unwrap();

  let owner = cart.owner.as_ref().unwrap();
  assert!(Arc::ptr_eq(owner, &user));
  assert!(!Arc::ptr_eq(owner, &other_user));
  assert_eq!(owner.name, "guest");
}

#[test]
fn test_destroy_request_drops_only_that_context() {
  // Arrange
  let container = container();
  let before = container.get_request_bean("cart", 1_u64).unwrap();
  let kept = container.get_request_bean("cart", 2_u64).unwrap();

  // Act
  container.destroy_request(1_u64);

  // Assert
  let after = container.get_request_bean("cart", 1_u64).unwrap();
  assert!(!Bean::ptr_eq(&before, &after));
  assert!(Bean::ptr_eq(&kept, &container.get_request_bean("cart", 2_u64).unwrap()));

  // Destroying an unknown context is a no-op.
  container.destroy_request(99_u64);
}

// --- Session Scope ---

#[test]
fn test_session_beans_are_isolated_per_context() {
  let container = container();

  let a = container.get_session_bean("profile", "s-1").unwrap();
  let b = container.get_session_bean("profile", "s-2").unwrap();
  assert!(Bean::ptr_eq(&a, &container.get_session_bean("profile", "s-1").unwrap()));
  assert!(!Bean::ptr_eq(&a, &b));

  container.destroy_session("s-1");
  assert!(!Bean::ptr_eq(&a, &container.get_session_bean("profile", "s-1").unwrap()));
  assert_eq!(container.names().session, vec!["s-1", "s-2"]);
}

#[test]
fn test_request_and_session_pools_are_separate() {
  let container = container();

  container.get_request_bean("cart", "same-id").unwrap();
  container.destroy_session("same-id");

  assert_eq!(container.names().request, vec!["same-id"]);
}

// --- Failure Modes ---

#[test]
fn test_undefined_contextual_names() {
  let container = container();

  assert!(matches!(
    container.get_request_bean("missing", 1_u64),
    Err(ContainerError::UndefinedRequestBean(_))
  ));
  // A singleton is not a request bean.
  assert!(matches!(
    container.get_request_bean("admin", 1_u64),
    Err(ContainerError::UndefinedRequestBean(_))
  ));
  // A request bean is not a session bean.
  assert!(matches!(
    container.get_session_bean("cart", "s-1"),
    Err(ContainerError::UndefinedSessionBean(_))
  ));
}

#[test]
fn test_plain_get_needs_a_context_for_contextual_beans() {
  let container = container();

  assert!(container.has("cart"));
  assert!(matches!(
    container.get("cart"),
    Err(ContainerError::MissingContext { .. })
  ));
  // Contextual beans are not built eagerly.
  assert!(container.names().request.is_empty());
}
