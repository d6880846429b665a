//! Market data derivation engines for Tickmill
//!
//! This crate turns raw feed data into derived market data products.
//!
//! # Core Components
//!
//! - [`bars`] - Tick-to-OHLCV bar synthesis across multiple periods
//! - [`stitcher`] - Continuous futures series with price-difference splicing
//! - [`black_scholes`] - Black-Scholes option pricing with Greeks
//! - [`greeks`] - Cached Greeks engine and implied volatility solver
//! - [`coordinator`] - Unified facade over the three engines
//!
//! # Key Invariants
//!
//! - Bars are immutable once emitted; only the open buffer mutates
//! - Rejected ticks never touch synthesizer state
//! - The stitched series carries no price jump across a contract switch
//! - Pricing is deterministic: same inputs, same outputs, cached or not

pub mod bars;
pub mod black_scholes;
pub mod coordinator;
pub mod error;
pub mod greeks;
pub mod stitcher;
pub mod types;

pub use bars::BarSynthesizer;
pub use coordinator::MarketDataCoordinator;
pub use error::MarketCoreError;
pub use greeks::GreeksEngine;
pub use stitcher::ContractStitcher;
pub use types::{
    Bar, BarPeriod, ContractData, Greeks, OptionContract, OptionType, StitchedContract,
    SwitchPoint, Tick,
};

pub type Result<T> = std::result::Result<T, MarketCoreError>;
