use crate::domain::payment::{PaymentId, PaymentStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Invalid transition: cannot {action} a {from} payment")]
    InvalidTransitionError {
        from: PaymentStatus,
        action: &'static str,
    },
    #[error("Payment not found: {0}")]
    NotFoundError(String),
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),
    #[error("Conflict on payment {id}: expected revision {expected}, found {actual}")]
    ConflictError {
        id: PaymentId,
        expected: u64,
        actual: u64,
    },
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
}

impl PaymentError {
    pub fn not_found(id: PaymentId) -> Self {
        Self::NotFoundError(id.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
