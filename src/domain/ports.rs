use super::payment::{PaymentField, PaymentId, PaymentPatch, PaymentRecord};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;

/// Persistence boundary for the `payments` collection.
///
/// Implementations bump `revision` on every `create` and `update`. Passing
/// `expected_revision = None` to `update` keeps last-write-wins semantics.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persists a new record. Fails with `ConflictError` if the id is taken.
    async fn create(&self, record: PaymentRecord) -> Result<PaymentId>;

    /// Applies `patch` and returns the updated record.
    async fn update(
        &self,
        id: PaymentId,
        patch: PaymentPatch,
        expected_revision: Option<u64>,
    ) -> Result<PaymentRecord>;

    async fn get(&self, id: PaymentId) -> Result<Option<PaymentRecord>>;

    async fn query_by_field(&self, field: PaymentField) -> Result<Vec<PaymentRecord>>;

    async fn all(&self) -> Result<Vec<PaymentRecord>>;

    /// Writes the record as-is, without revision checks.
    async fn upsert(&self, record: PaymentRecord) -> Result<()>;
}

pub type PaymentStoreBox = Box<dyn PaymentStore>;

/// Revision check and patch application shared by store implementations.
pub fn apply_patch(
    record: &mut PaymentRecord,
    patch: &PaymentPatch,
    expected_revision: Option<u64>,
) -> Result<()> {
    if let Some(expected) = expected_revision
        && expected != record.revision
    {
        return Err(PaymentError::ConflictError {
            id: record.id,
            expected,
            actual: record.revision,
        });
    }
    patch.apply(record);
    record.revision += 1;
    Ok(())
}
