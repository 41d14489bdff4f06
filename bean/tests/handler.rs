use fibre_bean::{
  Annotation, AnnotationSources, ClassAnnotations, ClassBuilder, ConfigHandler, Container, DefinitionSpec, Handler,
  ObjectDefinition,
};
use indexmap::IndexMap;
use serde_json::json;
use std::io::Write;
use std::sync::{Arc, Mutex};

// --- Test Fixtures ---

trait Mailer: Send + Sync {
  fn send(&self) -> String;
}

#[derive(Default)]
struct SmtpMailer {
  host: String,
}

#[derive(Default)]
struct MockMailer {
  host: String,
}

#[derive(Default)]
struct Database {
  url: String,
  pool: u32,
}

impl Mailer for SmtpMailer {
  fn send(&self) -> String {
    format!("smtp via {}", self.host)
  }
}

impl Mailer for MockMailer {
  fn send(&self) -> String {
    format!("mock for {}", self.host)
  }
}

/// Swaps every class for its `Mock` counterpart and records `before_init`.
#[derive(Default)]
struct RecordingHandler {
  calls: Mutex<Vec<String>>,
}

impl Handler for RecordingHandler {
  fn class_proxy(&self, class_name: &str) -> String {
    match class_name {
      "SmtpMailer" => "MockMailer".to_string(),
      other => other.to_string(),
    }
  }

  fn before_init(
    &self,
    bean: &str,
    class_name: &str,
    definition: &ObjectDefinition,
    metadata: Option<&ClassAnnotations>,
  ) {
    self.calls.lock().unwrap().push(format!(
      "{bean}:{class_name}:{}:{}",
      definition.scope(),
      metadata.is_some()
    ));
  }
}

fn container() -> Container {
  let container = Container::new();
  container.add_classes([
    ClassBuilder::<SmtpMailer>::with_default("SmtpMailer")
      .field("host", |m: &mut SmtpMailer, host: String| m.host = host)
      .build(),
    ClassBuilder::<MockMailer>::with_default("MockMailer")
      .field("host", |m: &mut MockMailer, host: String| m.host = host)
      .build(),
    ClassBuilder::<Database>::with_default("Database")
      .constructor(|args| {
        Ok(Database {
          url: args.next()?,
          pool: args.next()?,
        })
      })
      .build(),
  ]);
  container
}

// --- Handler Hooks ---

#[test]
fn test_class_proxy_and_before_init() {
  // Arrange
  let handler = Arc::new(RecordingHandler::default());
  let container = container();
  container.set_handler(handler.clone());

  let mut classes = IndexMap::new();
  classes.insert(
    "SmtpMailer".to_string(),
    ClassAnnotations::default().annotate(Annotation::new("Bean").attr("name", "mailer")),
  );
  let mut sources = AnnotationSources::new();
  sources.insert("mail".to_string(), classes);
  container.add_annotation_sources(sources);
  container.add_definitions([("mailer".to_string(), DefinitionSpec::default().property("host", "mx.local"))]);

  // Act
  container.init().unwrap();
  let bean = container.get("mailer").unwrap();

  // Assert
  assert_eq!(bean.class_name(), "MockMailer");
  let mailer = bean.downcast::<MockMailer>().unwrap();
  assert_eq!(mailer.send(), "mock for mx.local");
  // before_init sees the declared class, not the proxy.
  assert_eq!(*handler.calls.lock().unwrap(), vec!["mailer:SmtpMailer:singleton:true"]);
}

#[test]
fn test_beans_resolve_behind_a_trait() {
  let container = container();
  container.add_definitions([("mailer".to_string(), DefinitionSpec::new("SmtpMailer").property("host", "mx.real"))]);
  container.init().unwrap();

  let mailer: Arc<dyn Mailer> = container.get_as::<SmtpMailer>("mailer").unwrap();
  assert_eq!(mailer.send(), "smtp via mx.real");
}

// --- Config References ---

#[test]
fn test_config_handler_resolves_external_references() {
  // Arrange
  let container = container();
  container.set_handler(Arc::new(ConfigHandler::new(json!({
    "db": {"url": "pg://from-config", "pool": 3},
    "mail": {"host": "mx.config"}
  }))));
  container.add_definitions([
    (
      "db".to_string(),
      DefinitionSpec::new("Database").arg("${config.db.url}").arg("${config.db.pool}"),
    ),
    ("mailer".to_string(), DefinitionSpec::new("SmtpMailer").property("host", "${config.mail.host}")),
  ]);

  // Act
  container.init().unwrap();

  // Assert
  let db = container.get_as::<Database>("db").unwrap();
  assert_eq!(db.url, "pg://from-config");
  assert_eq!(db.pool, 3);
  assert_eq!(container.get_as::<SmtpMailer>("mailer").unwrap().host, "mx.config");
}

#[test]
fn test_config_handler_from_yaml_file() {
  let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
  write!(file, "db:\n  url: pg://yaml\n  pool: 9\n").unwrap();

  let container = container();
  container.set_handler(Arc::new(ConfigHandler::from_file(file.path()).unwrap()));
  container.add_definitions([(
    "db".to_string(),
    DefinitionSpec::new("Database").arg("${config.db.url}").arg("${config.db.pool}"),
  )]);
  container.init().unwrap();

  let db = container.get_as::<Database>("db").unwrap();
  assert_eq!(db.url, "pg://yaml");
  assert_eq!(db.pool, 9);
}
