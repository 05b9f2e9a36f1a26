//! CSV adapters for the command-line interface.

pub mod operation_reader;
pub mod payment_writer;
