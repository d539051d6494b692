//! Reconciliation logic for NetworkFilesystem status

pub mod conditions;
pub mod endpoint;
