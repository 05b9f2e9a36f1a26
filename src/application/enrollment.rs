use crate::domain::payment::PaymentRecord;
use crate::domain::ports::PaymentStore;
use crate::domain::product::{InstallmentScheduleEntry, ProductType};
use crate::error::{PaymentError, Result};
use chrono::{Days, NaiveDate};

/// An installment whose write failed during enrollment.
#[derive(Debug)]
pub struct FailedInstallment {
    pub index: u8,
    pub error: PaymentError,
}

/// Result of persisting one enrollment's installments.
///
/// Writes are not transactional: records in `created` stay persisted even
/// when others failed. Callers retry only the `failed` indices.
#[derive(Debug, Default)]
pub struct EnrollmentOutcome {
    pub created: Vec<PaymentRecord>,
    pub failed: Vec<FailedInstallment>,
}

impl EnrollmentOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_indices(&self) -> Vec<u8> {
        self.failed.iter().map(|f| f.index).collect()
    }
}

fn due_date(entry: &InstallmentScheduleEntry, enrollment_date: NaiveDate) -> Result<NaiveDate> {
    enrollment_date
        .checked_add_days(Days::new(entry.due_offset_days))
        .ok_or_else(|| {
            PaymentError::ValidationError(format!(
                "enrollment date {enrollment_date} is too far in the future"
            ))
        })
}

fn records_for<'a, I>(
    student_id: &str,
    entries: I,
    enrollment_date: NaiveDate,
) -> Result<Vec<PaymentRecord>>
where
    I: IntoIterator<Item = &'a InstallmentScheduleEntry>,
{
    if student_id.trim().is_empty() {
        return Err(PaymentError::ValidationError(
            "student id must not be empty".to_string(),
        ));
    }
    entries
        .into_iter()
        .map(|entry| {
            Ok(PaymentRecord::from_schedule(
                student_id,
                entry,
                due_date(entry, enrollment_date)?,
            ))
        })
        .collect()
}

/// Builds the complete installment plan of one enrollment, without persisting it.
///
/// Every record is pending, carries no penalty and is due `due_offset_days`
/// after the enrollment date.
pub fn generate_installments(
    student_id: &str,
    product: ProductType,
    enrollment_date: NaiveDate,
) -> Result<Vec<PaymentRecord>> {
    records_for(student_id, product.schedule(), enrollment_date)
}

/// Writes records one by one, collecting failures instead of stopping.
pub async fn persist_installments(
    store: &dyn PaymentStore,
    records: Vec<PaymentRecord>,
) -> EnrollmentOutcome {
    let mut outcome = EnrollmentOutcome::default();
    for record in records {
        let index = record.installment_index;
        match store.create(record.clone()).await {
            Ok(_) => outcome.created.push(record),
            Err(error) => outcome.failed.push(FailedInstallment { index, error }),
        }
    }
    outcome
}

/// Generates and persists the installments of a new enrollment.
///
/// Calling this twice for the same enrollment creates duplicates.
pub async fn enroll(
    store: &dyn PaymentStore,
    student_id: &str,
    product: ProductType,
    enrollment_date: NaiveDate,
) -> Result<EnrollmentOutcome> {
    let records = generate_installments(student_id, product, enrollment_date)?;
    let outcome = persist_installments(store, records).await;
    log_outcome(student_id, product, &outcome);
    Ok(outcome)
}

/// Regenerates only the given installments after a partial enrollment failure.
pub async fn enroll_missing(
    store: &dyn PaymentStore,
    student_id: &str,
    product: ProductType,
    enrollment_date: NaiveDate,
    indices: &[u8],
) -> Result<EnrollmentOutcome> {
    let entries = indices
        .iter()
        .map(|index| product.installment(*index))
        .collect::<Result<Vec<_>>>()?;
    let records = records_for(student_id, entries, enrollment_date)?;
    let outcome = persist_installments(store, records).await;
    log_outcome(student_id, product, &outcome);
    Ok(outcome)
}

fn log_outcome(student_id: &str, product: ProductType, outcome: &EnrollmentOutcome) {
    if outcome.is_complete() {
        tracing::info!(
            student = student_id,
            %product,
            installments = outcome.created.len(),
            "enrollment installments created"
        );
    } else {
        tracing::warn!(
            student = student_id,
            %product,
            created = outcome.created.len(),
            failed = ?outcome.failed_indices(),
            "enrollment partially persisted"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::amount::Amount;
    use crate::domain::payment::PaymentStatus;
    use crate::infrastructure::in_memory::InMemoryPaymentStore;
    use crate::infrastructure::testing::FlakyStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_generate_mandarin_schedule() {
        let enrollment = date(2024, 1, 1);
        let records =
            generate_installments("stu-1", ProductType::MandarinCourse, enrollment).unwrap();

        let tuples: Vec<(u8, u64, NaiveDate)> = records
            .iter()
            .map(|r| (r.installment_index, r.amount.value(), r.due_date))
            .collect();
        assert_eq!(
            tuples,
            vec![
                (1, 10_000, date(2024, 1, 1)),
                (2, 11_000, date(2024, 1, 8)),
                (3, 50_000, date(2024, 1, 15)),
                (4, 50_000, date(2024, 3, 1)),
            ]
        );
        assert!(records.iter().all(|r| r.status == PaymentStatus::Pending
            && r.penalty_accrued == Amount::ZERO
            && r.student_id == "stu-1"));
    }

    #[test]
    fn test_generate_scholarship_schedule() {
        let records =
            generate_installments("stu-1", ProductType::Scholarship, date(2024, 1, 1)).unwrap();
        let due: Vec<NaiveDate> = records.iter().map(|r| r.due_date).collect();
        assert_eq!(
            due,
            vec![
                date(2024, 1, 1),
                date(2024, 1, 31),
                date(2024, 3, 31),
                date(2024, 6, 29),
            ]
        );
    }

    #[test]
    fn test_generate_rejects_blank_student() {
        let result = generate_installments("  ", ProductType::EnglishCourse, date(2024, 1, 1));
        assert!(matches!(result, Err(PaymentError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_enroll_persists_every_installment() {
        let store = InMemoryPaymentStore::new();
        let outcome = enroll(&store, "stu-1", ProductType::EnglishCourse, date(2024, 1, 1))
            .await
            .unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.created.len(), 4);
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn test_partial_failure_then_retry_missing() {
        let store = FlakyStore::failing_on(3);
        let enrollment = date(2024, 1, 1);

        let outcome = enroll(&store, "stu-1", ProductType::Scholarship, enrollment)
            .await
            .unwrap();
        assert!(!outcome.is_complete());
        assert_eq!(outcome.failed_indices(), vec![3]);
        assert_eq!(store.inner.len().await, 3);

        let retry = enroll_missing(
            &store.inner,
            "stu-1",
            ProductType::Scholarship,
            enrollment,
            &outcome.failed_indices(),
        )
        .await
        .unwrap();
        assert!(retry.is_complete());
        assert_eq!(retry.created[0].installment_index, 3);
        assert_eq!(retry.created[0].due_date, date(2024, 3, 31));
        assert_eq!(store.inner.len().await, 4);
    }

    #[tokio::test]
    async fn test_enroll_missing_rejects_unknown_index() {
        let store = InMemoryPaymentStore::new();
        let result = enroll_missing(
            &store,
            "stu-1",
            ProductType::MandarinCourse,
            date(2024, 1, 1),
            &[7],
        )
        .await;
        assert!(matches!(result, Err(PaymentError::DataIntegrityError(_))));
        assert!(store.is_empty().await);
    }
}
