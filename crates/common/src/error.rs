//! Boundary error type shared across Tickmill crates
//!
//! Engine crates define their own precise error enums; this type covers
//! the outer boundary (config loading, data sources, caller input) where
//! a shared vocabulary matters more than precision.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Caller-supplied input failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// A market-data source misbehaved (unreadable file, bad payload)
    #[error("Data source error: {0}")]
    DataSource(String),

    /// Anything carrying its own context
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn data_source(msg: impl Into<String>) -> Self {
        Self::DataSource(msg.into())
    }
}
