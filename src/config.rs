use crate::domain::clock::Clock;
use crate::error::{PaymentError, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Staff operations CSV file
    pub input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "JODA_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Date statuses and penalties are derived for (YYYY-MM-DD). Defaults to today.
    #[arg(long, env = "JODA_AS_OF")]
    pub as_of: Option<NaiveDate>,

    /// Seconds between background pushes of cached records to the database.
    #[arg(long, env = "JODA_SYNC_INTERVAL_SECS", default_value_t = DEFAULT_SYNC_INTERVAL_SECS)]
    pub sync_interval_secs: u64,

    /// Print the aggregated summary as JSON instead of the payment rows.
    #[arg(long)]
    pub summary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    InMemory,
    #[cfg(feature = "storage-rocksdb")]
    RocksDb(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Payments,
    Summary,
}

/// Validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: PathBuf,
    pub storage: Storage,
    pub as_of: NaiveDate,
    pub sync_interval: Duration,
    pub output: Output,
}

impl Settings {
    pub fn resolve(cli: Cli, clock: &dyn Clock) -> Result<Self> {
        if cli.sync_interval_secs == 0 {
            return Err(PaymentError::ValidationError(
                "sync interval must be at least one second".to_string(),
            ));
        }

        Ok(Self {
            input: cli.input,
            storage: storage_for(cli.db_path),
            as_of: cli.as_of.unwrap_or_else(|| clock.today()),
            sync_interval: Duration::from_secs(cli.sync_interval_secs),
            output: if cli.summary {
                Output::Summary
            } else {
                Output::Payments
            },
        })
    }
}

#[cfg(feature = "storage-rocksdb")]
fn storage_for(db_path: Option<PathBuf>) -> Storage {
    db_path.map_or(Storage::InMemory, Storage::RocksDb)
}

#[cfg(not(feature = "storage-rocksdb"))]
fn storage_for(db_path: Option<PathBuf>) -> Storage {
    if db_path.is_some() {
        tracing::warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Storage::InMemory
}
