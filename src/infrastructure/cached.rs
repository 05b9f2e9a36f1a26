use super::in_memory::InMemoryPaymentStore;
use crate::domain::payment::{PaymentField, PaymentId, PaymentPatch, PaymentRecord};
use crate::domain::ports::PaymentStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outcome of pushing dirty records to the remote store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub pushed: usize,
    pub failed: usize,
}

/// A local in-memory copy in front of a remote store.
///
/// Reads prefer the local copy and fall back to the remote one when the
/// local answer is empty. Writes land locally first and are then pushed;
/// a failed push marks the record dirty for the next `sync` instead of
/// failing the caller. Nothing invalidates the local copy: it may go stale
/// with respect to writes made by other processes.
#[derive(Clone)]
pub struct CachedPaymentStore {
    local: InMemoryPaymentStore,
    remote: Arc<dyn PaymentStore>,
    dirty: Arc<RwLock<HashSet<PaymentId>>>,
}

impl CachedPaymentStore {
    pub fn new(remote: Arc<dyn PaymentStore>) -> Self {
        Self {
            local: InMemoryPaymentStore::new(),
            remote,
            dirty: Arc::default(),
        }
    }

    pub async fn dirty_count(&self) -> usize {
        self.dirty.read().await.len()
    }

    async fn push(&self, record: PaymentRecord) {
        let id = record.id;
        match self.remote.upsert(record).await {
            Ok(()) => {
                self.dirty.write().await.remove(&id);
            }
            Err(e) => {
                tracing::warn!(
                    payment_id = %id,
                    error = %e,
                    "remote write failed, kept in local cache"
                );
                self.dirty.write().await.insert(id);
            }
        }
    }

    async fn warm(&self, records: &[PaymentRecord]) -> Result<()> {
        for record in records {
            if self.local.get(record.id).await?.is_none() {
                self.local.upsert(record.clone()).await?;
            }
        }
        Ok(())
    }

    /// Copies every remote record into the local cache.
    pub async fn preload(&self) -> Result<usize> {
        let fetched = self.remote.all().await?;
        self.warm(&fetched).await?;
        Ok(fetched.len())
    }

    /// Re-pushes every record whose last remote write failed.
    pub async fn sync(&self) -> Result<SyncReport> {
        let pending: Vec<PaymentId> = self.dirty.read().await.iter().copied().collect();
        let mut report = SyncReport::default();

        for id in pending {
            let Some(record) = self.local.get(id).await? else {
                self.dirty.write().await.remove(&id);
                continue;
            };
            match self.remote.upsert(record).await {
                Ok(()) => {
                    self.dirty.write().await.remove(&id);
                    report.pushed += 1;
                }
                Err(e) => {
                    tracing::warn!(payment_id = %id, error = %e, "sync push failed");
                    report.failed += 1;
                }
            }
        }

        if report.pushed + report.failed > 0 {
            tracing::debug!(pushed = report.pushed, failed = report.failed, "cache sync finished");
        }
        Ok(report)
    }
}

#[async_trait]
impl PaymentStore for CachedPaymentStore {
    async fn create(&self, record: PaymentRecord) -> Result<PaymentId> {
        let id = self.local.create(record).await?;
        if let Some(stored) = self.local.get(id).await? {
            self.push(stored).await;
        }
        Ok(id)
    }

    async fn update(
        &self,
        id: PaymentId,
        patch: PaymentPatch,
        expected_revision: Option<u64>,
    ) -> Result<PaymentRecord> {
        if self.local.get(id).await?.is_none()
            && let Some(remote) = self.remote.get(id).await?
        {
            self.local.upsert(remote).await?;
        }
        let updated = self.local.update(id, patch, expected_revision).await?;
        self.push(updated.clone()).await;
        Ok(updated)
    }

    async fn get(&self, id: PaymentId) -> Result<Option<PaymentRecord>> {
        if let Some(record) = self.local.get(id).await? {
            return Ok(Some(record));
        }
        let fetched = self.remote.get(id).await?;
        if let Some(record) = &fetched {
            self.local.upsert(record.clone()).await?;
        }
        Ok(fetched)
    }

    async fn query_by_field(&self, field: PaymentField) -> Result<Vec<PaymentRecord>> {
        let cached = self.local.query_by_field(field.clone()).await?;
        if !cached.is_empty() {
            return Ok(cached);
        }
        let fetched = self.remote.query_by_field(field).await?;
        self.warm(&fetched).await?;
        Ok(fetched)
    }

    async fn all(&self) -> Result<Vec<PaymentRecord>> {
        let cached = self.local.all().await?;
        if !cached.is_empty() {
            return Ok(cached);
        }
        let fetched = self.remote.all().await?;
        self.warm(&fetched).await?;
        Ok(fetched)
    }

    async fn upsert(&self, record: PaymentRecord) -> Result<()> {
        self.local.upsert(record.clone()).await?;
        self.push(record).await;
        Ok(())
    }
}
