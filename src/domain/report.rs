//! Dashboard aggregates over a set of payment records.
//!
//! Statuses and penalties are re-derived through the calculator as of the
//! given date, so a stale cached `penalty_accrued` never leaks into totals.

use super::amount::Amount;
use super::payment::{PaymentRecord, PaymentStatus};
use super::penalty;
use super::product::ProductType;
use crate::error::Result;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

const MONTHS_FR: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub overdue: usize,
    pub paid: usize,
}

impl StatusCounts {
    fn record(&mut self, status: PaymentStatus) {
        match status {
            PaymentStatus::Pending => self.pending += 1,
            PaymentStatus::Overdue => self.overdue += 1,
            PaymentStatus::Paid => self.paid += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.overdue + self.paid
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRevenue {
    pub product: ProductType,
    pub revenue: Amount,
    /// Share of total paid revenue, in percent.
    pub share: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub revenue: Amount,
}

/// Read-only summary of a payment set as of one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    pub as_of: NaiveDate,
    pub counts: StatusCounts,
    pub total_billed: Amount,
    pub total_revenue: Amount,
    pub total_outstanding: Amount,
    pub total_penalties: Amount,
    /// Paid revenue over billed amount, in percent.
    pub collection_rate: Decimal,
    pub revenue_by_category: Vec<CategoryRevenue>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

impl PaymentSummary {
    pub fn from_records<'a, I>(records: I, as_of: NaiveDate) -> Result<Self>
    where
        I: IntoIterator<Item = &'a PaymentRecord>,
    {
        let mut counts = StatusCounts::default();
        let mut total_billed = Amount::ZERO;
        let mut total_revenue = Amount::ZERO;
        let mut total_penalties = Amount::ZERO;
        let mut by_category: BTreeMap<ProductType, Amount> =
            ProductType::ALL.iter().map(|p| (*p, Amount::ZERO)).collect();
        let mut by_month: BTreeMap<(i32, u32), Amount> = BTreeMap::new();

        for record in records {
            let assessment = penalty::reassess(record, as_of)?;
            counts.record(assessment.status);
            total_billed += record.amount;
            total_penalties += assessment.penalty;

            if assessment.status == PaymentStatus::Paid {
                total_revenue += record.amount;
                *by_category.entry(record.product_type).or_default() += record.amount;
                if let Some(paid) = record.paid_date {
                    *by_month.entry((paid.year(), paid.month())).or_default() += record.amount;
                }
            }
        }

        let revenue_by_category = by_category
            .into_iter()
            .map(|(product, revenue)| CategoryRevenue {
                product,
                revenue,
                share: percentage(revenue, total_revenue),
            })
            .collect();

        let monthly_revenue = by_month
            .into_iter()
            .map(|((year, month), revenue)| MonthlyRevenue {
                year,
                month,
                label: month_label(year, month),
                revenue,
            })
            .collect();

        Ok(Self {
            as_of,
            counts,
            total_billed,
            total_revenue,
            total_outstanding: Amount::new(
                total_billed.value().saturating_sub(total_revenue.value()),
            ),
            total_penalties,
            collection_rate: percentage(total_revenue, total_billed),
            revenue_by_category,
            monthly_revenue,
        })
    }

    pub fn total_revenue(&self) -> Amount {
        self.total_revenue
    }

    pub fn paid_count(&self) -> usize {
        self.counts.paid
    }

    pub fn revenue_for(&self, product: ProductType) -> Amount {
        self.revenue_by_category
            .iter()
            .find(|c| c.product == product)
            .map(|c| c.revenue)
            .unwrap_or_default()
    }
}

/// `part / whole` in percent, rounded to two decimals. Zero when `whole` is zero.
pub fn percentage(part: Amount, whole: Amount) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (Decimal::from(part.value()) * Decimal::ONE_HUNDRED / Decimal::from(whole.value())).round_dp(2)
}

/// French month-year label, e.g. "janvier 2024".
pub fn month_label(year: i32, month: u32) -> String {
    let name = month
        .checked_sub(1)
        .and_then(|i| MONTHS_FR.get(i as usize))
        .copied()
        .unwrap_or("?");
    format!("{name} {year}")
}
