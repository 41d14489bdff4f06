use fibre_bean::{Bean, ClassBuilder, Container, ContainerConfig};
use std::io::Write;
use std::sync::Arc;
use std::thread;

// A per-request unit of work that shares the application-wide database.
#[derive(Default)]
struct UnitOfWork {
  db: Option<Arc<Database>>,
  label: String,
}

#[derive(Default)]
struct Database {
  url: String,
}

const DEFINITIONS: &str = r#"
db:
  class: Database
  properties:
    url: "${config.db.url}"
work:
  class: UnitOfWork
  properties:
    db: "${db}"
    label: per-request
  options:
    scope: request
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
  // Definitions usually live next to the application's config; a temp file
  // stands in for it here.
  let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
  file.write_all(DEFINITIONS.as_bytes())?;

  let container = Arc::new(Container::with_config(ContainerConfig::default()));
  container.add_classes([
    ClassBuilder::<Database>::with_default("Database")
      .field("url", |d: &mut Database, url: String| d.url = url)
      .build(),
    ClassBuilder::<UnitOfWork>::with_default("UnitOfWork")
      .field("db", |w: &mut UnitOfWork, db: Arc<Database>| w.db = Some(db))
      .field("label", |w: &mut UnitOfWork, label: String| w.label = label)
      .build(),
  ]);
  container.set_handler(Arc::new(fibre_bean::ConfigHandler::new(serde_json::json!({
    "db": { "url": "postgres://localhost/app" }
  }))));
  container.load_definitions(file.path())?;
  container.init()?;

  // Each worker thread plays one request, identified by its number.
  let handles: Vec<_> = (0..3_u64)
    .map(|request_id| {
      let container = container.clone();
      thread::spawn(move || -> fibre_bean::Result<(Bean, Bean)> {
        let first = container.get_request_bean("work", request_id)?;
        let second = container.get_request_bean("work", request_id)?;
        Ok((first, second))
      })
    })
    .collect();

  for (request_id, handle) in handles.into_iter().enumerate() {
    let (first, second) = handle.join().expect("worker thread panicked")?;
    let work = first.downcast::<UnitOfWork>().expect("work is a UnitOfWork");
    println!(
      "request {request_id}: same bean within the request = {}, label = {}, db = {}",
      Bean::ptr_eq(&first, &second),
      work.label,
      work.db.as_ref().map(|db| db.url.as_str()).unwrap_or("<none>")
    );
  }

  println!("live request contexts: {:?}", container.names().request);
  for request_id in 0..3_u64 {
    container.destroy_request(request_id);
  }
  println!("after destroy: {:?}", container.names().request);
  Ok(())
}
