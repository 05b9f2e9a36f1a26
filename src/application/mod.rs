//! Application layer orchestrating the payment rules over a store.
//!
//! `PaymentEngine` is the entry point used by the binary. It delegates status
//! transitions to `PaymentLifecycle` and installment creation to `enrollment`.
//! `sync` keeps a cached store's remote copy up to date in the background.

pub mod engine;
pub mod enrollment;
pub mod lifecycle;
pub mod sync;
