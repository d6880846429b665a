//! Market core error types

use thiserror::Error;

/// Errors raised at ingestion or construction boundaries
///
/// Data sparsity (missing per-date rows, no candidate contract) and
/// solver non-convergence are not errors; they surface as `Option` or
/// empty results.
#[derive(Error, Debug)]
pub enum MarketCoreError {
    /// Malformed tick rejected before any buffer mutation
    #[error("Invalid tick: {0}")]
    InvalidTick(String),

    /// Invalid option contract parameters
    #[error("Invalid option contract: {0}")]
    InvalidContract(String),

    /// Empty contract-data batch
    #[error("Empty contract data: {0}")]
    EmptyContractData(String),

    /// Invalid engine configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
