use crate::domain::payment::{PaymentField, PaymentId, PaymentPatch, PaymentRecord};
use crate::domain::ports::{PaymentStore, apply_patch};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for payment records.
///
/// Uses `Arc<RwLock<HashMap<PaymentId, PaymentRecord>>>` so clones share the
/// same data. Serves as the local cache layer and as the default backend.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<PaymentId, PaymentRecord>>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.payments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.payments.read().await.is_empty()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn create(&self, mut record: PaymentRecord) -> Result<PaymentId> {
        let mut payments = self.payments.write().await;
        if let Some(existing) = payments.get(&record.id) {
            return Err(PaymentError::ConflictError {
                id: record.id,
                expected: 0,
                actual: existing.revision,
            });
        }
        record.revision = 1;
        let id = record.id;
        payments.insert(id, record);
        Ok(id)
    }

    async fn update(
        &self,
        id: PaymentId,
        patch: PaymentPatch,
        expected_revision: Option<u64>,
    ) -> Result<PaymentRecord> {
        let mut payments = self.payments.write().await;
        let record = payments
            .get_mut(&id)
            .ok_or_else(|| PaymentError::not_found(id))?;
        apply_patch(record, &patch, expected_revision)?;
        Ok(record.clone())
    }

    async fn get(&self, id: PaymentId) -> Result<Option<PaymentRecord>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).cloned())
    }

    async fn query_by_field(&self, field: PaymentField) -> Result<Vec<PaymentRecord>> {
        let payments = self.payments.read().await;
        Ok(payments
            .values()
            .filter(|record| field.matches(record))
            .cloned()
            .collect())
    }

    async fn all(&self) -> Result<Vec<PaymentRecord>> {
        let payments = self.payments.read().await;
        Ok(payments.values().cloned().collect())
    }

    async fn upsert(&self, record: PaymentRecord) -> Result<()> {
        let mut payments = self.payments.write().await;
        payments.insert(record.id, record);
        Ok(())
    }
}
