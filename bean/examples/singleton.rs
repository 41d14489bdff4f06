use fibre_bean::{bean, ClassBuilder, Container, DefinitionSpec, Scope};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A simple bean that gets a unique ID upon creation.
#[derive(Clone)]
struct RequestTracker {
  id: usize,
}

// A global, thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn main() {
  let container = Container::new();

  // --- Class Registration ---
  // The zero-argument constructor runs once per build. Prototype lookups copy
  // the retained template instead, so they keep its ID.
  container.add_class(
    ClassBuilder::<RequestTracker>::new("RequestTracker")
      .default_constructor(|| {
        println!("Constructing RequestTracker...");
        RequestTracker {
          id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
        }
      })
      .cloneable()
      .build(),
  );

  container.add_definitions([
    ("singleton_tracker".to_string(), DefinitionSpec::new("RequestTracker")),
    (
      "prototype_tracker".to_string(),
      DefinitionSpec::new("RequestTracker").scope(Scope::Prototype),
    ),
  ]);
  container.init().expect("container should initialize");

  println!("--- Resolving Singletons ---");
  let s1 = bean!(container, RequestTracker, "singleton_tracker");
  let s2 = bean!(container, RequestTracker, "singleton_tracker");
  println!("Singleton 1 ID: {}, Singleton 2 ID: {}", s1.id, s2.id);
  assert!(Arc::ptr_eq(&s1, &s2), "Singleton instances should be identical");
  println!("Singleton instances are the same pointer, as expected.\n");

  println!("--- Resolving Prototypes ---");
  let p1 = bean!(container, RequestTracker, "prototype_tracker");
  let p2 = bean!(container, RequestTracker, "prototype_tracker");
  println!("Prototype 1 ID: {}, Prototype 2 ID: {}", p1.id, p2.id);
  assert_eq!(p1.id, p2.id);
  assert!(!Arc::ptr_eq(&p1, &p2), "Prototype instances should be different");
  println!("Prototype instances are separate copies of one template, as expected.");

  let stats = container.stats();
  println!(
    "\n{} singleton(s), {} prototype(s), {} definition(s)",
    stats.singleton_count, stats.prototype_count, stats.definition_count
  );
}
