//! Store adapters implementing `PaymentStore`.

pub mod cached;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
#[cfg(test)]
pub(crate) mod testing;
