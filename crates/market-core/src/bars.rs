//! Bar synthesizer: tick stream in, completed OHLCV bars out
//!
//! Every configured period is aggregated concurrently per symbol. A tick
//! either folds into the open buffer for its (symbol, period) key or,
//! when its floor-aligned period start is later than the buffer's,
//! finalizes that buffer into an emitted [`Bar`] and seeds a fresh one.

use crate::error::MarketCoreError;
use crate::types::{Bar, BarPeriod, Tick};
use chrono::{DateTime, Utc};
use common::Symbol;
use std::collections::HashMap;
use tracing::{trace, warn};

/// Accumulator for the currently-open period window of one (symbol, period)
///
/// Replaced, never mutated, across period boundaries.
#[derive(Debug, Clone)]
struct BarBuffer {
    period_start: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    amount: f64,
    tick_count: u64,
}

impl BarBuffer {
    fn seed(period_start: DateTime<Utc>, tick: &Tick) -> Self {
        Self {
            period_start,
            open: tick.price,
            high: tick.price,
            low: tick.price,
            close: tick.price,
            volume: tick.volume,
            amount: tick.amount,
            tick_count: 1,
        }
    }

    fn fold(&mut self, tick: &Tick) {
        self.high = self.high.max(tick.price);
        self.low = self.low.min(tick.price);
        self.close = tick.price;
        self.volume += tick.volume;
        self.amount += tick.amount;
        self.tick_count += 1;
    }

    fn finalize(self, symbol: Symbol, period: BarPeriod) -> Bar {
        Bar {
            symbol,
            period_start: self.period_start,
            period,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            amount: self.amount,
            tick_count: self.tick_count,
        }
    }
}

/// Multi-period tick-to-bar aggregation engine
#[derive(Debug, Clone)]
pub struct BarSynthesizer {
    open_buffers: HashMap<(Symbol, BarPeriod), BarBuffer>,
    completed: HashMap<(Symbol, BarPeriod), Vec<Bar>>,
    periods: Vec<BarPeriod>,
}

impl BarSynthesizer {
    /// Synthesizer over the full default period set
    pub fn new() -> Self {
        Self {
            open_buffers: HashMap::new(),
            completed: HashMap::new(),
            periods: BarPeriod::all(),
        }
    }

    /// Synthesizer over a custom period set
    pub fn with_periods(periods: Vec<BarPeriod>) -> Result<Self, MarketCoreError> {
        if periods.is_empty() {
            return Err(MarketCoreError::InvalidConfig(
                "bar synthesizer needs at least one period".to_string(),
            ));
        }
        Ok(Self {
            open_buffers: HashMap::new(),
            completed: HashMap::new(),
            periods,
        })
    }

    pub fn periods(&self) -> &[BarPeriod] {
        &self.periods
    }

    fn period_start(timestamp: DateTime<Utc>, period: BarPeriod) -> DateTime<Utc> {
        let seconds = timestamp.timestamp();
        let len = period.as_seconds();
        let floored = seconds.div_euclid(len) * len;
        DateTime::from_timestamp(floored, 0).unwrap_or(timestamp)
    }

    /// Process one tick across every configured period
    ///
    /// Returns the bars completed by this tick: zero when every buffer is
    /// still open, one per period whose boundary the tick crossed.
    /// Malformed ticks are rejected before any buffer is touched.
    pub fn process_tick(&mut self, tick: &Tick) -> Result<Vec<Bar>, MarketCoreError> {
        if let Err(e) = Self::validate_tick(tick) {
            warn!(symbol = %tick.symbol, price = tick.price, volume = tick.volume, "Rejected tick");
            return Err(e);
        }

        let mut emitted = Vec::new();
        for period in self.periods.clone() {
            if let Some(bar) = self.process_tick_for_period(tick, period) {
                emitted.push(bar);
            }
        }
        Ok(emitted)
    }

    fn validate_tick(tick: &Tick) -> Result<(), MarketCoreError> {
        if !tick.price.is_finite() || tick.price <= 0.0 {
            return Err(MarketCoreError::InvalidTick(format!(
                "price must be positive, got {}",
                tick.price
            )));
        }
        if !tick.volume.is_finite() || tick.volume < 0.0 {
            return Err(MarketCoreError::InvalidTick(format!(
                "volume must be non-negative, got {}",
                tick.volume
            )));
        }
        if !tick.amount.is_finite() {
            return Err(MarketCoreError::InvalidTick(format!(
                "amount must be finite, got {}",
                tick.amount
            )));
        }
        Ok(())
    }

    fn process_tick_for_period(&mut self, tick: &Tick, period: BarPeriod) -> Option<Bar> {
        let key = (tick.symbol.clone(), period);
        let start = Self::period_start(tick.timestamp, period);

        match self.open_buffers.get_mut(&key) {
            None => {
                self.open_buffers.insert(key, BarBuffer::seed(start, tick));
                None
            }
            Some(buffer) if start <= buffer.period_start => {
                // Late ticks within the open window still fold in; feeds
                // deliver per-symbol ordered streams.
                buffer.fold(tick);
                None
            }
            Some(_) => {
                let finished = self
                    .open_buffers
                    .insert(key.clone(), BarBuffer::seed(start, tick))?
                    .finalize(key.0.clone(), period);
                trace!(symbol = %finished.symbol, period = period.as_str(), "Period rollover");
                self.completed.entry(key).or_default().push(finished.clone());
                Some(finished)
            }
        }
    }

    /// Finalize every open buffer regardless of period completion
    ///
    /// Used at session end. Clears all buffers; returns one bar per
    /// buffer that held at least one tick.
    pub fn force_complete_all(&mut self) -> Vec<Bar> {
        let mut emitted = Vec::with_capacity(self.open_buffers.len());
        for ((symbol, period), buffer) in self.open_buffers.drain() {
            let bar = buffer.finalize(symbol.clone(), period);
            self.completed
                .entry((symbol, period))
                .or_default()
                .push(bar.clone());
            emitted.push(bar);
        }
        emitted
    }

    /// Completed bars for one (symbol, period), oldest first
    ///
    /// `limit` of 0 means no limit.
    pub fn bars(&self, symbol: &Symbol, period: BarPeriod, limit: usize) -> Vec<Bar> {
        let mut result = self
            .completed
            .get(&(symbol.clone(), period))
            .cloned()
            .unwrap_or_default();

        if limit > 0 && result.len() > limit {
            result = result.split_off(result.len() - limit);
        }
        result
    }

    /// Snapshot of the still-open bar for one (symbol, period)
    pub fn open_bar(&self, symbol: &Symbol, period: BarPeriod) -> Option<Bar> {
        self.open_buffers
            .get(&(symbol.clone(), period))
            .map(|buffer| buffer.clone().finalize(symbol.clone(), period))
    }

    pub fn open_buffer_count(&self) -> usize {
        self.open_buffers.len()
    }

    pub fn clear(&mut self) {
        self.open_buffers.clear();
        self.completed.clear();
    }
}

impl Default for BarSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Pure data-quality check on an emitted bar
///
/// Returns whether the bar satisfies the OHLC invariants together with
/// every violation found. Not called inside `process_tick`; callers use
/// it as a gate on externally-sourced bars.
pub fn validate_bar(bar: &Bar) -> (bool, Vec<String>) {
    let mut violations = Vec::new();

    for (name, price) in [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
    ] {
        if !price.is_finite() || price <= 0.0 {
            violations.push(format!("{} must be positive, got {}", name, price));
        }
    }
    if bar.high < bar.low {
        violations.push(format!("high {} below low {}", bar.high, bar.low));
    }
    if bar.high < bar.open {
        violations.push(format!("high {} below open {}", bar.high, bar.open));
    }
    if bar.high < bar.close {
        violations.push(format!("high {} below close {}", bar.high, bar.close));
    }
    if bar.low > bar.open {
        violations.push(format!("low {} above open {}", bar.low, bar.open));
    }
    if bar.low > bar.close {
        violations.push(format!("low {} above close {}", bar.low, bar.close));
    }
    if bar.volume < 0.0 {
        violations.push(format!("volume must be non-negative, got {}", bar.volume));
    }
    if bar.tick_count == 0 {
        violations.push("tick_count must be positive".to_string());
    }

    (violations.is_empty(), violations)
}
