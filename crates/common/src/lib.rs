//! Common types and utilities for Tickmill
//!
//! This crate provides the shared types and error definitions used across
//! all Tickmill crates.
//!
//! # Modules
//!
//! - [`error`] - Common error types
//! - [`types`] - Shared domain types (Symbol)

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::Symbol;
