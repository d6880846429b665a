//! Greeks engine with result caching and implied volatility
//!
//! Pricing and Greeks calls are memoized on the full numeric input set;
//! any change in spot, strike, maturity or volatility produces a new
//! cache key. The implied volatility solver is Newton-Raphson with a
//! Brenner-Subrahmanyam seed and always computes fresh (the cache is
//! bypassed while iterating).

use crate::black_scholes;
use crate::types::{Greeks, OptionContract, OptionType};
use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub const DEFAULT_MAX_ITERATIONS: u32 = 100;
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

const IV_SEED_MIN: f64 = 0.01;
const IV_SEED_MAX: f64 = 5.0;
const IV_STEP_MIN: f64 = 0.001;
const IV_STEP_MAX: f64 = 5.0;
const MIN_VEGA: f64 = 1e-10;

/// Keys round to 1e-8 so float noise from upstream arithmetic does not
/// defeat the cache
const KEY_SCALE: f64 = 1e8;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CalcKind {
    Price,
    Greeks,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    symbol: String,
    kind: CalcKind,
    spot: OrderedFloat<f64>,
    strike: OrderedFloat<f64>,
    maturity: OrderedFloat<f64>,
    rate: OrderedFloat<f64>,
    volatility: OrderedFloat<f64>,
    dividend_yield: OrderedFloat<f64>,
    option_type: OptionType,
}

impl CacheKey {
    fn new(contract: &OptionContract, kind: CalcKind) -> Self {
        let quantize = |x: f64| OrderedFloat((x * KEY_SCALE).round() / KEY_SCALE);
        Self {
            symbol: contract.symbol.to_string(),
            kind,
            spot: quantize(contract.underlying),
            strike: quantize(contract.strike),
            maturity: quantize(contract.maturity),
            rate: quantize(contract.rate),
            volatility: quantize(contract.volatility),
            dividend_yield: quantize(contract.dividend_yield),
            option_type: contract.option_type,
        }
    }
}

#[derive(Debug, Clone)]
enum CachedValue {
    Price(f64),
    Greeks(Greeks),
}

/// Cached option pricing, Greeks and implied volatility
#[derive(Debug)]
pub struct GreeksEngine {
    cache_enabled: bool,
    cache: RwLock<HashMap<CacheKey, CachedValue>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl GreeksEngine {
    pub fn new() -> Self {
        Self::with_cache(true)
    }

    pub fn with_cache(cache_enabled: bool) -> Self {
        Self {
            cache_enabled,
            cache: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Theoretical Black-Scholes price, cached
    pub fn price(&self, contract: &OptionContract) -> f64 {
        if !self.cache_enabled {
            return black_scholes::price(contract);
        }

        let key = CacheKey::new(contract, CalcKind::Price);
        if let Some(CachedValue::Price(p)) = self.cache.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return *p;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let price = black_scholes::price(contract);
        self.cache.write().insert(key, CachedValue::Price(price));
        price
    }

    /// Full Greeks snapshot, cached
    pub fn greeks(&self, contract: &OptionContract) -> Greeks {
        if !self.cache_enabled {
            return black_scholes::greeks(contract);
        }

        let key = CacheKey::new(contract, CalcKind::Greeks);
        if let Some(CachedValue::Greeks(g)) = self.cache.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return *g;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let greeks = black_scholes::greeks(contract);
        self.cache.write().insert(key, CachedValue::Greeks(greeks));
        greeks
    }

    /// Implied volatility with the default iteration budget and tolerance
    ///
    /// The contract's own `volatility` field is ignored; only the market
    /// price drives the solve. Returns `None` when the solver cannot
    /// converge (stale or arbitrage-violating market price).
    pub fn implied_volatility(
        &self,
        contract: &OptionContract,
        market_price: f64,
    ) -> Option<f64> {
        self.implied_volatility_with(contract, market_price, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE)
    }

    /// Implied volatility with an explicit iteration budget and tolerance
    pub fn implied_volatility_with(
        &self,
        contract: &OptionContract,
        market_price: f64,
        max_iterations: u32,
        tolerance: f64,
    ) -> Option<f64> {
        if !market_price.is_finite() || market_price <= 0.0 {
            return None;
        }

        let s = contract.underlying;
        let t = contract.maturity;

        // Brenner-Subrahmanyam approximation as the starting point
        let mut vol = ((2.0 * PI / t).sqrt() * market_price / s).clamp(IV_SEED_MIN, IV_SEED_MAX);
        let mut probe = contract.clone();

        for _ in 0..max_iterations {
            probe.volatility = vol;

            let price = black_scholes::price(&probe);
            let diff = price - market_price;
            if diff.abs() < tolerance {
                return Some(vol);
            }

            let vega = black_scholes::greeks(&probe).vega;
            if vega.abs() < MIN_VEGA {
                debug!(symbol = %contract.symbol, vol, "Vega vanished during IV solve");
                return None;
            }

            vol = (vol - diff / vega).clamp(IV_STEP_MIN, IV_STEP_MAX);
        }

        debug!(
            symbol = %contract.symbol,
            market_price,
            "IV solve did not converge within iteration budget"
        );
        None
    }

    /// (hits, misses) since construction or the last clear
    pub fn cache_stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    pub fn clear_cache(&self) {
        self.cache.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for GreeksEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_contract(volatility: f64) -> OptionContract {
        OptionContract::new("IO2403", 100.0, 100.0, 1.0, 0.05, volatility, OptionType::Call)
            .unwrap()
    }

    #[test]
    fn test_cache_hit_on_repeat_call() {
        let engine = GreeksEngine::new();
        let contract = create_test_contract(0.2);

        let first = engine.price(&contract);
        let second = engine.price(&contract);
        assert!((first - second).abs() < 1e-15);

        let (hits, misses) = engine.cache_stats();
        assert_eq!(hits, 1);
        assert_eq!(misses, 1);
    }

    #[test]
    fn test_changed_input_misses_cache() {
        let engine = GreeksEngine::new();
        engine.price(&create_test_contract(0.2));
        engine.price(&create_test_contract(0.25));

        let (hits, misses) = engine.cache_stats();
        assert_eq!(hits, 0);
        assert_eq!(misses, 2);
    }

    #[test]
    fn test_price_and_greeks_keys_do_not_collide() {
        let engine = GreeksEngine::new();
        let contract = create_test_contract(0.2);

        let price = engine.price(&contract);
        let greeks = engine.greeks(&contract);
        assert!((greeks.option_price - price).abs() < 1e-12);
    }

    #[test]
    fn test_cache_disabled() {
        let engine = GreeksEngine::with_cache(false);
        let contract = create_test_contract(0.2);
        engine.price(&contract);
        engine.price(&contract);

        let (hits, misses) = engine.cache_stats();
        assert_eq!(hits, 0);
        assert_eq!(misses, 0);
    }

    #[test]
    fn test_clear_cache_resets_stats() {
        let engine = GreeksEngine::new();
        let contract = create_test_contract(0.2);
        engine.price(&contract);
        engine.price(&contract);
        engine.clear_cache();

        assert_eq!(engine.cache_stats(), (0, 0));
        engine.price(&contract);
        assert_eq!(engine.cache_stats(), (0, 1));
    }

    #[test]
    fn test_implied_vol_roundtrip() {
        let engine = GreeksEngine::new();
        let contract = create_test_contract(0.2);
        let market_price = black_scholes::price(&contract);

        let iv = engine.implied_volatility(&contract, market_price).unwrap();
        assert!((iv - 0.2).abs() < 0.001);
    }

    #[test]
    fn test_implied_vol_roundtrip_high_vol_put() {
        let engine = GreeksEngine::new();
        let contract =
            OptionContract::new("IO2403", 100.0, 110.0, 0.5, 0.03, 0.8, OptionType::Put).unwrap();
        let market_price = black_scholes::price(&contract);

        let iv = engine.implied_volatility(&contract, market_price).unwrap();
        assert!((iv - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_implied_vol_rejects_bad_price() {
        let engine = GreeksEngine::new();
        let contract = create_test_contract(0.2);

        assert_eq!(engine.implied_volatility(&contract, 0.0), None);
        assert_eq!(engine.implied_volatility(&contract, -5.0), None);
        assert_eq!(engine.implied_volatility(&contract, f64::NAN), None);
    }

    #[test]
    fn test_implied_vol_below_arbitrage_floor() {
        // A call is worth at least S - K e^{-rT}; a market price far
        // below that admits no volatility and the solver must give up.
        let engine = GreeksEngine::new();
        let contract =
            OptionContract::new("IO2403", 100.0, 50.0, 1.0, 0.05, 0.2, OptionType::Call).unwrap();

        assert_eq!(engine.implied_volatility(&contract, 1.0), None);
    }

    #[test]
    fn test_implied_vol_ignores_contract_volatility_field() {
        let engine = GreeksEngine::new();
        let priced_at = create_test_contract(0.35);
        let market_price = black_scholes::price(&priced_at);

        // Solve from a contract carrying a different stale vol
        let stale = create_test_contract(0.1);
        let iv = engine.implied_volatility(&stale, market_price).unwrap();
        assert!((iv - 0.35).abs() < 0.001);
    }
}
