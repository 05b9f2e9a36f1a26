//! Late-payment penalty calculator.
//!
//! Penalties accrue per whole day once the grace period after the due date has
//! elapsed. The calculator is pure: the current date is always passed in.

use super::amount::Amount;
use super::payment::{PaymentRecord, PaymentStatus};
use super::product::{InstallmentScheduleEntry, ProductType};
use crate::error::{PaymentError, Result};
use chrono::{Days, NaiveDate};

/// Outcome of evaluating one record against a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltyAssessment {
    pub grace_deadline: NaiveDate,
    pub days_late: u64,
    pub penalty: Amount,
    /// The status the record should have on that date.
    pub status: PaymentStatus,
}

/// Last day on which the installment can still be paid without penalty.
pub fn grace_deadline(
    entry: &InstallmentScheduleEntry,
    due_date: NaiveDate,
) -> Result<NaiveDate> {
    due_date
        .checked_add_days(Days::new(entry.grace_period_days))
        .ok_or_else(|| {
            PaymentError::DataIntegrityError(format!(
                "due date {due_date} plus {} grace days is out of range",
                entry.grace_period_days
            ))
        })
}

/// Whole days elapsed since the grace deadline, zero while still inside it.
pub fn days_late(grace_deadline: NaiveDate, today: NaiveDate) -> u64 {
    if today <= grace_deadline {
        return 0;
    }
    (today - grace_deadline).num_days().max(0) as u64
}

/// Penalty currently owed on an installment.
///
/// Paid installments never owe anything, whatever the date.
pub fn calculate_penalty(
    product: ProductType,
    installment_index: u8,
    due_date: NaiveDate,
    status: PaymentStatus,
    today: NaiveDate,
) -> Result<Amount> {
    if status == PaymentStatus::Paid {
        return Ok(Amount::ZERO);
    }
    let entry = product.installment(installment_index)?;
    Ok(accrue(entry, due_date, today)?.penalty)
}

/// Grace deadline, lateness and penalty of one schedule row on `today`.
fn accrue(
    entry: &InstallmentScheduleEntry,
    due_date: NaiveDate,
    today: NaiveDate,
) -> Result<PenaltyAssessment> {
    let deadline = grace_deadline(entry, due_date)?;
    let days_late = days_late(deadline, today);
    let penalty = entry.penalty_per_day.times(days_late);
    Ok(PenaltyAssessment {
        grace_deadline: deadline,
        days_late,
        penalty,
        status: if penalty.is_zero() {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Overdue
        },
    })
}

/// Evaluates a stored record, checking its invariants first.
///
/// The result is what the calculator says for `today` alone, ignoring any
/// status or penalty already stored on the record.
pub fn assess(record: &PaymentRecord, today: NaiveDate) -> Result<PenaltyAssessment> {
    let entry = record.check_integrity()?;
    let accrued = accrue(entry, record.due_date, today)?;

    if record.is_paid() {
        return Ok(PenaltyAssessment {
            days_late: 0,
            penalty: Amount::ZERO,
            status: PaymentStatus::Paid,
            ..accrued
        });
    }
    Ok(accrued)
}

/// Like [`assess`], but never moves a record backwards.
///
/// An `overdue` record stays overdue and a stored penalty is never lowered,
/// even when `today` is earlier than the date they were derived on. Only an
/// explicit rejection resets a record to the calculator's plain answer.
pub fn reassess(record: &PaymentRecord, today: NaiveDate) -> Result<PenaltyAssessment> {
    let mut assessment = assess(record, today)?;
    if record.is_paid() {
        return Ok(assessment);
    }
    if record.penalty_accrued > assessment.penalty {
        assessment.penalty = record.penalty_accrued;
    }
    if record.status == PaymentStatus::Overdue || !assessment.penalty.is_zero() {
        assessment.status = PaymentStatus::Overdue;
    }
    Ok(assessment)
}
