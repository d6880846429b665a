//! Observability infrastructure for Tickmill
//!
//! This crate provides:
//! - Structured logging via tracing
//! - Prometheus metrics
//! - Tick-ingestion metric helpers
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! // Initialize logging
//! init_logging("tickmill", LogFormat::Pretty)?;
//!
//! // Initialize metrics (optional)
//! observability::metrics::init_metrics(9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, IngestMetrics};
