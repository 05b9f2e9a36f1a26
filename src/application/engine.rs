use super::enrollment::{self, EnrollmentOutcome};
use super::lifecycle::PaymentLifecycle;
use crate::domain::operation::{Operation, OperationType};
use crate::domain::payment::{PaymentField, PaymentRecord};
use crate::domain::ports::PaymentStoreBox;
use crate::domain::report::PaymentSummary;
use crate::error::{PaymentError, Result};
use chrono::{Days, NaiveDate};

/// The main entry point for processing staff operations.
///
/// `PaymentEngine` owns the store and applies operations one at a time,
/// awaiting each write before the next operation is looked at.
pub struct PaymentEngine {
    lifecycle: PaymentLifecycle,
}

impl PaymentEngine {
    /// Creates a new `PaymentEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `store` - The store for payment records.
    pub fn new(store: PaymentStoreBox) -> Self {
        Self {
            lifecycle: PaymentLifecycle::new(store),
        }
    }

    pub fn lifecycle(&self) -> &PaymentLifecycle {
        &self.lifecycle
    }

    /// Applies one operation.
    ///
    /// Installments are addressed by `(student, product, installment)`. An
    /// enrollment is refused when the student already has installments for
    /// that product, since the generator itself does not deduplicate. An
    /// `enroll` row that names an installment instead recreates that single
    /// installment after a partially failed enrollment.
    pub async fn process_operation(&self, op: Operation) -> Result<()> {
        match op.r#type {
            OperationType::Enroll => {
                let outcome = match op.installment {
                    Some(index) => self.enroll_missing(&op, index).await?,
                    None => self.enroll(&op).await?,
                };
                if !outcome.is_complete() {
                    return Err(PaymentError::ValidationError(format!(
                        "enrollment of {} in {} left installments {:?} unwritten",
                        op.student,
                        op.product,
                        outcome.failed_indices()
                    )));
                }
            }
            OperationType::Proof => {
                let record = self.target(&op).await?;
                let proof = op.reference.as_deref().unwrap_or_default();
                self.lifecycle.submit_proof(record.id, proof, op.date).await?;
            }
            OperationType::Validate => {
                let record = self.target(&op).await?;
                let staff = op.reference.as_deref().unwrap_or_default();
                self.lifecycle.validate(record.id, staff, op.date).await?;
            }
            OperationType::Reject => {
                let record = self.target(&op).await?;
                self.lifecycle
                    .reject(record.id, op.reference.as_deref(), op.date)
                    .await?;
            }
        }
        Ok(())
    }

    async fn enroll(&self, op: &Operation) -> Result<EnrollmentOutcome> {
        let existing = self
            .lifecycle
            .store()
            .query_by_field(PaymentField::StudentId(op.student.clone()))
            .await?;
        if existing.iter().any(|r| r.product_type == op.product) {
            return Err(PaymentError::ValidationError(format!(
                "student {} is already enrolled in {}",
                op.student, op.product
            )));
        }
        enrollment::enroll(self.lifecycle.store(), &op.student, op.product, op.date).await
    }

    async fn enroll_missing(&self, op: &Operation, index: u8) -> Result<EnrollmentOutcome> {
        let existing: Vec<PaymentRecord> = self
            .lifecycle
            .store()
            .query_by_field(PaymentField::StudentId(op.student.clone()))
            .await?
            .into_iter()
            .filter(|r| r.product_type == op.product)
            .collect();

        if existing.iter().any(|r| r.installment_index == index) {
            return Err(PaymentError::ValidationError(format!(
                "student {} already has {} installment {index}",
                op.student, op.product
            )));
        }
        let Some(anchor) = existing.first() else {
            return Err(PaymentError::ValidationError(format!(
                "student {} is not enrolled in {}; enroll without an installment number first",
                op.student, op.product
            )));
        };

        // Due dates hang off the original enrollment date, not the retry date.
        let offset = anchor.schedule_entry()?.due_offset_days;
        let enrolled_on = anchor
            .due_date
            .checked_sub_days(Days::new(offset))
            .ok_or_else(|| {
                PaymentError::DataIntegrityError(format!(
                    "payment {} has a due date before its enrollment could start",
                    anchor.id
                ))
            })?;
        enrollment::enroll_missing(
            self.lifecycle.store(),
            &op.student,
            op.product,
            enrolled_on,
            &[index],
        )
        .await
    }

    async fn target(&self, op: &Operation) -> Result<PaymentRecord> {
        let index = op.installment.ok_or_else(|| {
            PaymentError::ValidationError(format!(
                "{:?} operation for {} needs an installment number",
                op.r#type, op.student
            ))
        })?;
        self.lifecycle
            .find_installment(&op.student, op.product, index)
            .await
    }

    /// Returns every payment with its status and penalty derived as of `today`.
    pub async fn results(&self, today: NaiveDate) -> Result<Vec<PaymentRecord>> {
        self.lifecycle.refresh_all(today).await
    }

    pub async fn summary(&self, today: NaiveDate) -> Result<PaymentSummary> {
        let records = self.results(today).await?;
        PaymentSummary::from_records(&records, today)
    }
}
