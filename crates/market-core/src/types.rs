//! Shared types for the derivation engines

use crate::error::MarketCoreError;
use chrono::{DateTime, NaiveDate, Utc};
use common::Symbol;
use serde::{Deserialize, Serialize};

/// Bar aggregation period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarPeriod {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    OneDay,
}

impl BarPeriod {
    pub fn as_seconds(&self) -> i64 {
        match self {
            BarPeriod::OneMinute => 60,
            BarPeriod::FiveMinutes => 300,
            BarPeriod::FifteenMinutes => 900,
            BarPeriod::ThirtyMinutes => 1800,
            BarPeriod::OneHour => 3600,
            BarPeriod::OneDay => 86400,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BarPeriod::OneMinute => "1m",
            BarPeriod::FiveMinutes => "5m",
            BarPeriod::FifteenMinutes => "15m",
            BarPeriod::ThirtyMinutes => "30m",
            BarPeriod::OneHour => "1h",
            BarPeriod::OneDay => "1d",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(BarPeriod::OneMinute),
            "5m" => Some(BarPeriod::FiveMinutes),
            "15m" => Some(BarPeriod::FifteenMinutes),
            "30m" => Some(BarPeriod::ThirtyMinutes),
            "1h" => Some(BarPeriod::OneHour),
            "1d" => Some(BarPeriod::OneDay),
            _ => None,
        }
    }

    /// Every supported period, the default synthesizer set
    pub fn all() -> Vec<BarPeriod> {
        vec![
            BarPeriod::OneMinute,
            BarPeriod::FiveMinutes,
            BarPeriod::FifteenMinutes,
            BarPeriod::ThirtyMinutes,
            BarPeriod::OneHour,
            BarPeriod::OneDay,
        ]
    }
}

/// One raw market event from the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: Symbol,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
    pub amount: f64,
}

/// An OHLCV summary of all ticks within one period window
///
/// Immutable once emitted by the synthesizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: Symbol,
    /// Floor-aligned start of the period window
    pub period_start: DateTime<Utc>,
    pub period: BarPeriod,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub amount: f64,
    pub tick_count: u64,
}

/// One contract's one trading day of futures data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractData {
    pub symbol: Symbol,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_interest: f64,
    /// Exchange settlement price, when published
    #[serde(default)]
    pub settlement: Option<f64>,
}

/// A confirmed main-contract roll-over
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchPoint {
    pub date: NaiveDate,
    pub old_contract: Symbol,
    pub new_contract: Symbol,
    /// new close - old close on the switch date
    pub price_diff: f64,
    /// new volume / old volume on the switch date
    pub volume_ratio: f64,
    /// new open interest / old open interest on the switch date
    pub oi_ratio: f64,
}

/// One day of the spliced continuous series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StitchedContract {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_interest: f64,
    /// The contract this day's data came from
    pub main_contract: Symbol,
    /// Cumulative price-difference adjustment subtracted from OHLC
    pub adjustment: f64,
}

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

/// A European option descriptor, validated at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionContract {
    pub symbol: Symbol,
    /// Spot price of the underlying
    pub underlying: f64,
    pub strike: f64,
    /// Time to maturity in years
    pub maturity: f64,
    /// Continuously compounded risk-free rate
    pub rate: f64,
    /// Volatility (as decimal, e.g., 0.2 = 20%)
    pub volatility: f64,
    pub option_type: OptionType,
    /// Continuous dividend yield (0 for non-dividend underlyings)
    pub dividend_yield: f64,
}

impl OptionContract {
    /// Create a contract with zero dividend yield
    pub fn new(
        symbol: impl Into<Symbol>,
        underlying: f64,
        strike: f64,
        maturity: f64,
        rate: f64,
        volatility: f64,
        option_type: OptionType,
    ) -> Result<Self, MarketCoreError> {
        let contract = Self {
            symbol: symbol.into(),
            underlying,
            strike,
            maturity,
            rate,
            volatility,
            option_type,
            dividend_yield: 0.0,
        };
        contract.validate()?;
        Ok(contract)
    }

    /// Set a continuous dividend yield
    pub fn with_dividend_yield(mut self, dividend_yield: f64) -> Result<Self, MarketCoreError> {
        if !dividend_yield.is_finite() {
            return Err(MarketCoreError::InvalidContract(format!(
                "dividend yield must be finite, got {}",
                dividend_yield
            )));
        }
        self.dividend_yield = dividend_yield;
        Ok(self)
    }

    fn validate(&self) -> Result<(), MarketCoreError> {
        if !self.underlying.is_finite() || self.underlying <= 0.0 {
            return Err(MarketCoreError::InvalidContract(format!(
                "underlying price must be positive, got {}",
                self.underlying
            )));
        }
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(MarketCoreError::InvalidContract(format!(
                "strike must be positive, got {}",
                self.strike
            )));
        }
        if !self.maturity.is_finite() || self.maturity <= 0.0 {
            return Err(MarketCoreError::InvalidContract(format!(
                "time to maturity must be positive, got {}",
                self.maturity
            )));
        }
        if !self.rate.is_finite() {
            return Err(MarketCoreError::InvalidContract(format!(
                "risk-free rate must be finite, got {}",
                self.rate
            )));
        }
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(MarketCoreError::InvalidContract(format!(
                "volatility must be non-negative, got {}",
                self.volatility
            )));
        }
        Ok(())
    }
}

/// One fully-computed risk snapshot for one option at one instant
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta: ∂V/∂S (rate of change with spot)
    pub delta: f64,
    /// Gamma: ∂²V/∂S² (curvature of delta)
    pub gamma: f64,
    /// Vega: ∂V/∂σ (sensitivity to volatility)
    pub vega: f64,
    /// Theta: ∂V/∂t (time decay)
    pub theta: f64,
    /// Rho: ∂V/∂r (sensitivity to interest rate)
    pub rho: f64,
    /// Theoretical option price at the same inputs
    pub option_price: f64,
}
