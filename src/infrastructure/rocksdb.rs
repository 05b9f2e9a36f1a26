use crate::domain::payment::{PaymentField, PaymentId, PaymentPatch, PaymentRecord};
use crate::domain::ports::{PaymentStore, apply_patch};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing payment records.
pub const CF_PAYMENTS: &str = "payments";

/// A persistent store implementation using RocksDB.
///
/// Records are stored as JSON under their 16-byte id in the `payments`
/// Column Family. Queries other than by id scan the whole family.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
/// Read-modify-write cycles are serialized through a shared lock so revision
/// checks stay meaningful within one process.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self) -> Result<&ColumnFamily> {
        self.db.cf_handle(CF_PAYMENTS).ok_or_else(|| {
            PaymentError::IoError(std::io::Error::other("payments column family not found"))
        })
    }

    fn read(&self, id: PaymentId) -> Result<Option<PaymentRecord>> {
        let cf = self.cf()?;
        match self.db.get_pinned_cf(cf, id.as_bytes())? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn write(&self, record: &PaymentRecord) -> Result<()> {
        let cf = self.cf()?;
        let value = serde_json::to_vec(record)?;
        self.db.put_cf(cf, record.id.as_bytes(), value)?;
        Ok(())
    }

    fn scan(&self, field: Option<&PaymentField>) -> Result<Vec<PaymentRecord>> {
        let cf = self.cf()?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            let record = decode(&value)?;
            if field.is_none_or(|f| f.matches(&record)) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

fn decode(bytes: &[u8]) -> Result<PaymentRecord> {
    serde_json::from_slice(bytes)
        .map_err(|e| PaymentError::DataIntegrityError(format!("malformed payment record: {e}")))
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn create(&self, mut record: PaymentRecord) -> Result<PaymentId> {
        let _guard = self.write_lock.lock().await;
        if let Some(existing) = self.read(record.id)? {
            return Err(PaymentError::ConflictError {
                id: record.id,
                expected: 0,
                actual: existing.revision,
            });
        }
        record.revision = 1;
        self.write(&record)?;
        Ok(record.id)
    }

    async fn update(
        &self,
        id: PaymentId,
        patch: PaymentPatch,
        expected_revision: Option<u64>,
    ) -> Result<PaymentRecord> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.read(id)?.ok_or_else(|| PaymentError::not_found(id))?;
        apply_patch(&mut record, &patch, expected_revision)?;
        self.write(&record)?;
        Ok(record)
    }

    async fn get(&self, id: PaymentId) -> Result<Option<PaymentRecord>> {
        self.read(id)
    }

    async fn query_by_field(&self, field: PaymentField) -> Result<Vec<PaymentRecord>> {
        self.scan(Some(&field))
    }

    async fn all(&self) -> Result<Vec<PaymentRecord>> {
        self.scan(None)
    }

    async fn upsert(&self, record: PaymentRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(&record)
    }
}
