use super::amount::Amount;
use super::product::{InstallmentScheduleEntry, ProductType};
use crate::error::{PaymentError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(Uuid);

impl PaymentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Overdue,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Overdue => "overdue",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled installment owed by a student.
///
/// `penalty_accrued` is a cache of the last calculator run and is always
/// re-derivable from the due date, the schedule row and the current date.
/// `revision` is bumped by the store on every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub student_id: String,
    pub product_type: ProductType,
    pub installment_index: u8,
    pub amount: Amount,
    pub status: PaymentStatus,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub penalty_accrued: Amount,
    pub proof_url: Option<String>,
    pub validated_by: Option<String>,
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub revision: u64,
}

impl PaymentRecord {
    /// Builds a fresh pending record from a schedule row.
    pub fn from_schedule(
        student_id: impl Into<String>,
        entry: &InstallmentScheduleEntry,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            student_id: student_id.into(),
            product_type: entry.product,
            installment_index: entry.index,
            amount: entry.amount,
            status: PaymentStatus::Pending,
            due_date,
            paid_date: None,
            penalty_accrued: Amount::ZERO,
            proof_url: None,
            validated_by: None,
            rejection_reason: None,
            revision: 0,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }

    /// A proof reference that is present and not blank.
    pub fn proof(&self) -> Option<&str> {
        self.proof_url
            .as_deref()
            .map(str::trim)
            .filter(|proof| !proof.is_empty())
    }

    /// Returns the schedule row this record was generated from, checking that
    /// the stored amount still matches it.
    pub fn schedule_entry(&self) -> Result<&'static InstallmentScheduleEntry> {
        let entry = self.product_type.installment(self.installment_index)?;
        if entry.amount != self.amount {
            return Err(PaymentError::DataIntegrityError(format!(
                "payment {} ({} installment {}) has amount {} but the schedule says {}",
                self.id, self.product_type, self.installment_index, self.amount, entry.amount
            )));
        }
        Ok(entry)
    }

    /// Checks the record-level invariants that do not depend on the current date
    /// and returns the matching schedule row.
    pub fn check_integrity(&self) -> Result<&'static InstallmentScheduleEntry> {
        let entry = self.schedule_entry()?;
        if self.is_paid() != self.paid_date.is_some() {
            return Err(PaymentError::DataIntegrityError(format!(
                "payment {} is {} but paid_date is {:?}",
                self.id, self.status, self.paid_date
            )));
        }
        if self.is_paid() && !self.penalty_accrued.is_zero() {
            return Err(PaymentError::DataIntegrityError(format!(
                "payment {} is paid but still carries a penalty of {}",
                self.id, self.penalty_accrued
            )));
        }
        Ok(entry)
    }
}

/// A partial update applied by a store.
///
/// `Some(None)` on an optional field clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentPatch {
    pub status: Option<PaymentStatus>,
    pub paid_date: Option<Option<NaiveDate>>,
    pub penalty_accrued: Option<Amount>,
    pub proof_url: Option<Option<String>>,
    pub validated_by: Option<Option<String>>,
    pub rejection_reason: Option<Option<String>>,
}

impl PaymentPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, record: &mut PaymentRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(paid_date) = self.paid_date {
            record.paid_date = paid_date;
        }
        if let Some(penalty) = self.penalty_accrued {
            record.penalty_accrued = penalty;
        }
        if let Some(proof_url) = &self.proof_url {
            record.proof_url = proof_url.clone();
        }
        if let Some(validated_by) = &self.validated_by {
            record.validated_by = validated_by.clone();
        }
        if let Some(reason) = &self.rejection_reason {
            record.rejection_reason = reason.clone();
        }
    }
}

/// Field predicates supported by `PaymentStore::query_by_field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentField {
    StudentId(String),
    ProductType(ProductType),
    Status(PaymentStatus),
}

impl PaymentField {
    pub fn matches(&self, record: &PaymentRecord) -> bool {
        match self {
            PaymentField::StudentId(student) => record.student_id == *student,
            PaymentField::ProductType(product) => record.product_type == *product,
            PaymentField::Status(status) => record.status == *status,
        }
    }
}
