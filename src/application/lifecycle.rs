use crate::domain::amount::Amount;
use crate::domain::payment::{PaymentField, PaymentId, PaymentPatch, PaymentRecord, PaymentStatus};
use crate::domain::penalty::{self, PenaltyAssessment};
use crate::domain::ports::{PaymentStore, PaymentStoreBox};
use crate::domain::product::ProductType;
use crate::error::{PaymentError, Result};
use chrono::NaiveDate;

/// Mediates payment status transitions.
///
/// ```text
/// pending ──(penalty > 0, on read)──> overdue
/// overdue ──reject──> pending | overdue
/// pending | overdue ──validate──> paid (terminal)
/// ```
///
/// The overdue flip is derived: it is evaluated whenever a record is read
/// through `refresh`, never by a background job. A read never demotes a
/// record or lowers its penalty; only `reject` recomputes both from scratch. Every write passes the
/// revision it was computed from, so a concurrent modification surfaces as
/// `ConflictError` instead of being silently overwritten.
pub struct PaymentLifecycle {
    store: PaymentStoreBox,
}

impl PaymentLifecycle {
    pub fn new(store: PaymentStoreBox) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn PaymentStore {
        self.store.as_ref()
    }

    async fn load(&self, id: PaymentId) -> Result<PaymentRecord> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| PaymentError::not_found(id))
    }

    async fn write(&self, record: &PaymentRecord, patch: PaymentPatch) -> Result<PaymentRecord> {
        self.store
            .update(record.id, patch, Some(record.revision))
            .await
    }

    /// Re-evaluates status and penalty as of `today`, persisting any change.
    pub async fn refresh(&self, id: PaymentId, today: NaiveDate) -> Result<PaymentRecord> {
        let record = self.load(id).await?;
        self.refresh_record(record, today).await
    }

    async fn refresh_record(
        &self,
        record: PaymentRecord,
        today: NaiveDate,
    ) -> Result<PaymentRecord> {
        let assessment = penalty::reassess(&record, today)?;
        let patch = derived_patch(&record, &assessment);
        if patch.is_empty() {
            return Ok(record);
        }
        if record.status != assessment.status {
            tracing::debug!(
                payment_id = %record.id,
                from = %record.status,
                to = %assessment.status,
                penalty = %assessment.penalty,
                "payment status derived"
            );
        }
        self.write(&record, patch).await
    }

    /// Attaches a proof of payment, putting the record up for staff review.
    pub async fn submit_proof(
        &self,
        id: PaymentId,
        proof_url: &str,
        today: NaiveDate,
    ) -> Result<PaymentRecord> {
        let record = self.load(id).await?;
        ensure_open(&record, "attach a proof to")?;

        let proof_url = proof_url.trim();
        if proof_url.is_empty() {
            return Err(PaymentError::ValidationError(
                "proof reference must not be empty".to_string(),
            ));
        }

        let assessment = penalty::reassess(&record, today)?;
        let patch = PaymentPatch {
            proof_url: Some(Some(proof_url.to_string())),
            rejection_reason: Some(None),
            ..derived_patch(&record, &assessment)
        };
        self.write(&record, patch).await
    }

    /// Staff confirmation of a payment. Requires a proof to be attached.
    pub async fn validate(
        &self,
        id: PaymentId,
        validated_by: &str,
        today: NaiveDate,
    ) -> Result<PaymentRecord> {
        let record = self.load(id).await?;
        ensure_open(&record, "validate")?;

        if record.proof().is_none() {
            return Err(PaymentError::ValidationError(format!(
                "payment {id} has no proof of payment attached"
            )));
        }
        let validated_by = validated_by.trim();
        if validated_by.is_empty() {
            return Err(PaymentError::ValidationError(
                "validating staff member must be named".to_string(),
            ));
        }
        record.check_integrity()?;

        let patch = PaymentPatch {
            status: Some(PaymentStatus::Paid),
            paid_date: Some(Some(today)),
            penalty_accrued: Some(Amount::ZERO),
            validated_by: Some(Some(validated_by.to_string())),
            rejection_reason: Some(None),
            ..Default::default()
        };
        let paid = self.write(&record, patch).await?;
        tracing::info!(
            payment_id = %id,
            student = %paid.student_id,
            product = %paid.product_type,
            installment = paid.installment_index,
            amount = %paid.amount,
            validated_by,
            "payment validated"
        );
        Ok(paid)
    }

    /// Refuses the attached proof.
    ///
    /// There is no rejected status: the proof is cleared and the record falls
    /// back to whatever `pending`/`overdue` status the calculator derives.
    pub async fn reject(
        &self,
        id: PaymentId,
        reason: Option<&str>,
        today: NaiveDate,
    ) -> Result<PaymentRecord> {
        let record = self.load(id).await?;
        ensure_open(&record, "reject")?;

        if record.proof().is_none() {
            return Err(PaymentError::ValidationError(format!(
                "payment {id} has no proof awaiting review"
            )));
        }

        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        let assessment = penalty::assess(&record, today)?;
        let patch = PaymentPatch {
            status: Some(assessment.status),
            penalty_accrued: Some(assessment.penalty),
            proof_url: Some(None),
            rejection_reason: Some(reason.map(str::to_string)),
            ..Default::default()
        };
        let rejected = self.write(&record, patch).await?;
        tracing::info!(
            payment_id = %id,
            status = %rejected.status,
            reason = reason.unwrap_or_default(),
            "payment proof rejected"
        );
        Ok(rejected)
    }

    /// Every installment of a student, refreshed and ordered by product and index.
    pub async fn payments_for_student(
        &self,
        student_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<PaymentRecord>> {
        let records = self
            .store
            .query_by_field(PaymentField::StudentId(student_id.to_string()))
            .await?;
        let mut refreshed = self.refresh_each(records, today).await?;
        refreshed.sort_by_key(|r| (r.product_type, r.installment_index));
        Ok(refreshed)
    }

    /// Every stored installment, refreshed and ordered by student, product and index.
    pub async fn refresh_all(&self, today: NaiveDate) -> Result<Vec<PaymentRecord>> {
        let records = self.store.all().await?;
        let mut refreshed = self.refresh_each(records, today).await?;
        refreshed.sort_by(|a, b| {
            (&a.student_id, a.product_type, a.installment_index)
                .cmp(&(&b.student_id, b.product_type, b.installment_index))
        });
        Ok(refreshed)
    }

    async fn refresh_each(
        &self,
        records: Vec<PaymentRecord>,
        today: NaiveDate,
    ) -> Result<Vec<PaymentRecord>> {
        let mut refreshed = Vec::with_capacity(records.len());
        for record in records {
            refreshed.push(self.refresh_record(record, today).await?);
        }
        Ok(refreshed)
    }

    /// Locates one installment by its business key.
    pub async fn find_installment(
        &self,
        student_id: &str,
        product: ProductType,
        installment_index: u8,
    ) -> Result<PaymentRecord> {
        self.store
            .query_by_field(PaymentField::StudentId(student_id.to_string()))
            .await?
            .into_iter()
            .find(|r| r.product_type == product && r.installment_index == installment_index)
            .ok_or_else(|| {
                PaymentError::NotFoundError(format!(
                    "{product} installment {installment_index} for student {student_id}"
                ))
            })
    }
}

fn ensure_open(record: &PaymentRecord, action: &'static str) -> Result<()> {
    if record.is_paid() {
        return Err(PaymentError::InvalidTransitionError {
            from: record.status,
            action,
        });
    }
    Ok(())
}

fn derived_patch(record: &PaymentRecord, assessment: &PenaltyAssessment) -> PaymentPatch {
    PaymentPatch {
        status: (record.status != assessment.status).then_some(assessment.status),
        penalty_accrued: (record.penalty_accrued != assessment.penalty)
            .then_some(assessment.penalty),
        ..Default::default()
    }
}
