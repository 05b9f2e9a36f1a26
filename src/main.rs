use clap::Parser;
use joda_payments::application::engine::PaymentEngine;
use joda_payments::application::sync::SyncHandle;
use joda_payments::config::{Cli, Output, Settings, Storage};
use joda_payments::domain::clock::SystemClock;
use joda_payments::infrastructure::in_memory::InMemoryPaymentStore;
use joda_payments::interfaces::csv::operation_reader::OperationReader;
use joda_payments::interfaces::csv::payment_writer::PaymentWriter;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

async fn build_engine(
    settings: &Settings,
) -> joda_payments::error::Result<(PaymentEngine, Option<SyncHandle>)> {
    match &settings.storage {
        Storage::InMemory => Ok((
            PaymentEngine::new(Box::new(InMemoryPaymentStore::new())),
            None,
        )),
        #[cfg(feature = "storage-rocksdb")]
        Storage::RocksDb(path) => {
            use joda_payments::application::sync::spawn_periodic_sync;
            use joda_payments::infrastructure::cached::CachedPaymentStore;
            use joda_payments::infrastructure::rocksdb::RocksDBStore;
            use std::sync::Arc;

            // Local cache in front of the database, pushed back periodically.
            let store = CachedPaymentStore::new(Arc::new(RocksDBStore::open(path)?));
            let loaded = store.preload().await?;
            tracing::info!(path = %path.display(), payments = loaded, "opened payment database");

            let sync = spawn_periodic_sync(store.clone(), settings.sync_interval);
            Ok((PaymentEngine::new(Box::new(store)), Some(sync)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let settings = Settings::resolve(Cli::parse(), &SystemClock).into_diagnostic()?;
    let file = File::open(&settings.input).into_diagnostic()?;
    let (engine, sync) = build_engine(&settings).await.into_diagnostic()?;

    // Process operations
    let reader = OperationReader::new(file);
    for (row, op_result) in reader.operations().enumerate() {
        let row = row + 1;
        match op_result {
            Ok(op) => {
                if let Err(e) = engine.process_operation(op).await {
                    tracing::error!(row, error = %e, "Error processing operation");
                }
            }
            Err(e) => {
                tracing::error!(row, error = %e, "Error reading operation");
            }
        }
    }

    // Output state as of the requested date, then flush before surfacing any error
    let written = write_output(&engine, &settings).await;
    if let Some(sync) = sync {
        sync.shutdown().await;
    }

    written.into_diagnostic()
}

async fn write_output(
    engine: &PaymentEngine,
    settings: &Settings,
) -> joda_payments::error::Result<()> {
    let stdout = io::stdout();
    match settings.output {
        Output::Payments => {
            let payments = engine.results(settings.as_of).await?;
            PaymentWriter::new(stdout.lock()).write_payments(payments)?;
        }
        Output::Summary => {
            let summary = engine.summary(settings.as_of).await?;
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, &summary)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
