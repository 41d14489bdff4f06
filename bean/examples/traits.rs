use fibre_bean::{bean, ClassBuilder, Container, DefinitionSpec, Handler};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define concrete implementations
#[derive(Default)]
struct ConsoleLogger {
  prefix: String,
}

impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[{}]: {}", self.prefix, message);
  }
}

#[derive(Default)]
struct QuietLogger {
  prefix: String,
}

impl Logger for QuietLogger {
  fn log(&self, message: &str) {
    println!("[{} (quiet)]: {} chars", self.prefix, message.len());
  }
}

// 3. Define a bean that depends on the abstraction
#[derive(Default)]
struct ReportService {
  logger: Option<Arc<dyn Logger>>,
}

impl ReportService {
  fn generate_report(&self) {
    if let Some(logger) = &self.logger {
      logger.log("Starting report generation.");
      logger.log("Finished report generation.");
    }
  }
}

// 4. A handler that swaps the logger implementation without touching definitions.
struct QuietMode;

impl Handler for QuietMode {
  fn class_proxy(&self, class_name: &str) -> String {
    match class_name {
      "ConsoleLogger" => "QuietLogger".to_string(),
      other => other.to_string(),
    }
  }
}

fn build(quiet: bool) -> Container {
  let container = Container::new();
  container.add_classes([
    ClassBuilder::<ConsoleLogger>::with_default("ConsoleLogger")
      .field("prefix", |l: &mut ConsoleLogger, prefix: String| l.prefix = prefix)
      .build(),
    ClassBuilder::<QuietLogger>::with_default("QuietLogger")
      .field("prefix", |l: &mut QuietLogger, prefix: String| l.prefix = prefix)
      .build(),
    // The injected bean is served as `Arc<dyn Logger>` by trying each
    // implementation in turn.
    ClassBuilder::<ReportService>::with_default("ReportService")
      .setter("logger", |s: &mut ReportService, logger: fibre_bean::Bean| {
        let logger: Arc<dyn Logger> = match logger.downcast::<ConsoleLogger>() {
          Some(console) => console,
          None => logger.downcast::<QuietLogger>().ok_or_else(|| fibre_bean::ContainerError::TypeMismatch {
            target: "ReportService.logger".to_string(),
            expected: "a Logger".to_string(),
            found: logger.class_name().to_string(),
          })?,
        };
        s.logger = Some(logger);
        Ok(())
      })
      .build(),
  ]);
  if quiet {
    container.set_handler(Arc::new(QuietMode));
  }
  container.add_definitions([
    ("logger".to_string(), DefinitionSpec::new("ConsoleLogger").property("prefix", "CONSOLE LOG")),
    ("reports".to_string(), DefinitionSpec::new("ReportService").property("logger", "${logger}")),
  ]);
  container.init().expect("container should initialize");
  container
}

fn main() {
  println!("--- Default wiring ---");
  let container = build(false);
  bean!(container, ReportService, "reports").generate_report();

  println!("\n--- With a class proxy ---");
  let container = build(true);
  bean!(container, ReportService, "reports").generate_report();
}
