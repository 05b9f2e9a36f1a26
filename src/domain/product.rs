//! Billable products and their fixed installment schedules.
//!
//! Every payment record is generated from one row of these tables. Amounts,
//! due offsets, grace periods and penalty rates are never edited per record.

use super::amount::Amount;
use crate::error::{PaymentError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The offering a student is enrolled in.
///
/// A student may hold the scholarship procedure and a language course at the
/// same time; each enrollment produces its own set of installments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Scholarship,
    #[serde(alias = "mandarin")]
    MandarinCourse,
    #[serde(alias = "english")]
    EnglishCourse,
}

impl ProductType {
    pub const ALL: [ProductType; 3] = [
        ProductType::Scholarship,
        ProductType::MandarinCourse,
        ProductType::EnglishCourse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Scholarship => "scholarship",
            ProductType::MandarinCourse => "mandarin_course",
            ProductType::EnglishCourse => "english_course",
        }
    }

    /// The full installment plan for this product, ordered by index.
    pub fn schedule(&self) -> &'static [InstallmentScheduleEntry] {
        match self {
            ProductType::Scholarship => &SCHOLARSHIP_SCHEDULE,
            ProductType::MandarinCourse => &MANDARIN_SCHEDULE,
            ProductType::EnglishCourse => &ENGLISH_SCHEDULE,
        }
    }

    /// Looks up one row of the plan.
    ///
    /// An index outside the plan means the record was not produced by the
    /// installment generator and is reported as a data integrity error.
    pub fn installment(&self, index: u8) -> Result<&'static InstallmentScheduleEntry> {
        self.schedule()
            .iter()
            .find(|entry| entry.index == index)
            .ok_or_else(|| {
                PaymentError::DataIntegrityError(format!(
                    "installment {index} is not part of the {self} schedule"
                ))
            })
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a given installment pays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallmentKind {
    Inscription,
    DossierDeposit,
    PostAdmission,
    PostVisa,
    Book,
    FirstTranche,
    SecondTranche,
}

/// One row of a product's payment plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallmentScheduleEntry {
    pub product: ProductType,
    pub index: u8,
    pub kind: InstallmentKind,
    pub amount: Amount,
    /// Days between the enrollment date and the due date.
    pub due_offset_days: u64,
    /// Days after the due date before any penalty accrues.
    pub grace_period_days: u64,
    pub penalty_per_day: Amount,
}

const SCHOLARSHIP_GRACE_DAYS: u64 = 3;
const SCHOLARSHIP_PENALTY_PER_DAY: Amount = Amount::new(10_000);

const COURSE_INSCRIPTION_GRACE_DAYS: u64 = 14;
const COURSE_FIRST_TRANCHE_GRACE_DAYS: u64 = 30;
const COURSE_LATER_TRANCHE_GRACE_DAYS: u64 = 60;
const COURSE_INSCRIPTION_PENALTY_PER_DAY: Amount = Amount::new(500);
const COURSE_PENALTY_PER_DAY: Amount = Amount::new(1_000);

const fn scholarship(
    index: u8,
    kind: InstallmentKind,
    amount: u64,
    due_offset_days: u64,
) -> InstallmentScheduleEntry {
    InstallmentScheduleEntry {
        product: ProductType::Scholarship,
        index,
        kind,
        amount: Amount::new(amount),
        due_offset_days,
        grace_period_days: SCHOLARSHIP_GRACE_DAYS,
        penalty_per_day: SCHOLARSHIP_PENALTY_PER_DAY,
    }
}

const fn course(
    product: ProductType,
    index: u8,
    kind: InstallmentKind,
    amount: u64,
    due_offset_days: u64,
) -> InstallmentScheduleEntry {
    // The book is bought together with the inscription and shares its window.
    let grace_period_days = match kind {
        InstallmentKind::Inscription | InstallmentKind::Book => COURSE_INSCRIPTION_GRACE_DAYS,
        InstallmentKind::FirstTranche => COURSE_FIRST_TRANCHE_GRACE_DAYS,
        _ => COURSE_LATER_TRANCHE_GRACE_DAYS,
    };
    let penalty_per_day = match kind {
        InstallmentKind::Inscription => COURSE_INSCRIPTION_PENALTY_PER_DAY,
        _ => COURSE_PENALTY_PER_DAY,
    };
    InstallmentScheduleEntry {
        product,
        index,
        kind,
        amount: Amount::new(amount),
        due_offset_days,
        grace_period_days,
        penalty_per_day,
    }
}

static SCHOLARSHIP_SCHEDULE: [InstallmentScheduleEntry; 4] = [
    scholarship(1, InstallmentKind::Inscription, 100_000, 0),
    scholarship(2, InstallmentKind::DossierDeposit, 500_000, 30),
    scholarship(3, InstallmentKind::PostAdmission, 1_000_000, 90),
    scholarship(4, InstallmentKind::PostVisa, 1_390_000, 180),
];

static MANDARIN_SCHEDULE: [InstallmentScheduleEntry; 4] = [
    course(ProductType::MandarinCourse, 1, InstallmentKind::Inscription, 10_000, 0),
    course(ProductType::MandarinCourse, 2, InstallmentKind::Book, 11_000, 7),
    course(ProductType::MandarinCourse, 3, InstallmentKind::FirstTranche, 50_000, 14),
    course(ProductType::MandarinCourse, 4, InstallmentKind::SecondTranche, 50_000, 60),
];

static ENGLISH_SCHEDULE: [InstallmentScheduleEntry; 4] = [
    course(ProductType::EnglishCourse, 1, InstallmentKind::Inscription, 10_000, 0),
    course(ProductType::EnglishCourse, 2, InstallmentKind::Book, 11_000, 7),
    course(ProductType::EnglishCourse, 3, InstallmentKind::FirstTranche, 30_000, 14),
    course(ProductType::EnglishCourse, 4, InstallmentKind::SecondTranche, 40_000, 60),
];
