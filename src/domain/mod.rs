//! Domain layer: payment records, the installment schedule and the pure rules
//! evaluated over them.

pub mod amount;
pub mod clock;
pub mod operation;
pub mod payment;
pub mod penalty;
pub mod ports;
pub mod product;
pub mod report;
