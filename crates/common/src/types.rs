//! Shared domain types for Tickmill
//!
//! Tickmill deals with market records keyed by instrument symbol. The
//! [`Symbol`] newtype normalizes symbols once at the boundary so every
//! downstream map lookup agrees on casing.

use serde::{Deserialize, Serialize};

/// Instrument symbol (e.g., "IF2403", "CU2406", "BTC")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a new Symbol, normalized to uppercase
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    /// Get the symbol as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
