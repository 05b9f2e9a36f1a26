//! Store double for exercising failure paths in unit tests.

use super::in_memory::InMemoryPaymentStore;
use crate::domain::payment::{PaymentField, PaymentId, PaymentPatch, PaymentRecord};
use crate::domain::ports::PaymentStore;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory store that can be switched offline, or made to refuse creating
/// one installment index.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: InMemoryPaymentStore,
    offline: Arc<AtomicBool>,
    fail_on_index: Option<u8>,
}

impl FlakyStore {
    pub fn failing_on(index: u8) -> Self {
        Self {
            fail_on_index: Some(index),
            ..Default::default()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PaymentError::IoError(std::io::Error::other("remote offline")));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for FlakyStore {
    async fn create(&self, record: PaymentRecord) -> Result<PaymentId> {
        self.check()?;
        if self.fail_on_index == Some(record.installment_index) {
            return Err(PaymentError::IoError(std::io::Error::other("write refused")));
        }
        self.inner.create(record).await
    }

    async fn update(
        &self,
        id: PaymentId,
        patch: PaymentPatch,
        expected_revision: Option<u64>,
    ) -> Result<PaymentRecord> {
        self.check()?;
        self.inner.update(id, patch, expected_revision).await
    }

    async fn get(&self, id: PaymentId) -> Result<Option<PaymentRecord>> {
        self.check()?;
        self.inner.get(id).await
    }

    async fn query_by_field(&self, field: PaymentField) -> Result<Vec<PaymentRecord>> {
        self.check()?;
        self.inner.query_by_field(field).await
    }

    async fn all(&self) -> Result<Vec<PaymentRecord>> {
        self.check()?;
        self.inner.all().await
    }

    async fn upsert(&self, record: PaymentRecord) -> Result<()> {
        self.check()?;
        self.inner.upsert(record).await
    }
}
