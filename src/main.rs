use clap::Parser;
use miette::{IntoDiagnostic, Result};
use ordersvc::application::engine::OrderEngine;
use ordersvc::config::{Config, StorageBackend};
use ordersvc::domain::ports::{CatalogBox, DatabaseBox};
use ordersvc::infrastructure::catalog::InMemoryCatalog;
use ordersvc::infrastructure::in_memory::InMemoryDatabase;
use ordersvc::interfaces::json::handlers::OrderHandlers;
use ordersvc::interfaces::json::request_reader::RequestReader;
use ordersvc::interfaces::json::response_writer::ResponseWriter;
use ordersvc::interfaces::json::script::ScriptRunner;
use ordersvc::telemetry;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    telemetry::init(&config.log_filter);

    let (database, catalog) = match config.storage_backend() {
        StorageBackend::InMemory { catalog } => in_memory(catalog.as_deref())?,
        #[cfg(feature = "storage-postgres")]
        StorageBackend::Postgres(pg) => {
            use ordersvc::infrastructure::postgres::{PgCatalog, PgDatabase};

            if config.catalog.is_some() {
                tracing::warn!("--catalog is ignored when using the Postgres store");
            }
            let database = PgDatabase::connect(&pg.url, pg.max_connections, pg.acquire_timeout)
                .await
                .into_diagnostic()?;
            database.ensure_schema().await.into_diagnostic()?;
            let catalog: CatalogBox = Box::new(PgCatalog::new(database.pool().clone()));
            let database: DatabaseBox = Box::new(database);
            (database, catalog)
        }
        #[cfg(not(feature = "storage-postgres"))]
        StorageBackend::Postgres(_) => {
            tracing::warn!(
                "built without the storage-postgres feature, falling back to in-memory storage"
            );
            in_memory(config.catalog.as_deref())?
        }
    };

    let engine = Arc::new(OrderEngine::new(database, catalog));

    // Replay requests
    let file = File::open(&config.input).into_diagnostic()?;
    let reader = RequestReader::new(BufReader::new(file));
    let stdout = io::stdout();
    let mut writer = ResponseWriter::new(stdout.lock());
    let mut runner = ScriptRunner::new(OrderHandlers::new(Arc::clone(&engine)));
    let summary = runner.run(reader, &mut writer).await.into_diagnostic()?;
    tracing::info!(
        handled = summary.handled,
        skipped = summary.skipped,
        "request script finished"
    );

    drop(runner);
    if let Ok(engine) = Arc::try_unwrap(engine) {
        engine.shutdown().await;
    }

    Ok(())
}

fn in_memory(catalog: Option<&Path>) -> Result<(DatabaseBox, CatalogBox)> {
    let catalog = match catalog {
        Some(path) => {
            let file = File::open(path).into_diagnostic()?;
            InMemoryCatalog::from_reader(BufReader::new(file)).into_diagnostic()?
        }
        None => InMemoryCatalog::new(),
    };
    Ok((Box::new(InMemoryDatabase::new()), Box::new(catalog)))
}
