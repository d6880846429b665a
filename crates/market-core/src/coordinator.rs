//! Facade over the three derivation engines
//!
//! Wraps the bar synthesizer and contract stitcher in async RwLocks so
//! the hot tick path takes brief write locks while queries share read
//! locks. The Greeks engine is internally synchronized and shared as-is.

use crate::bars::BarSynthesizer;
use crate::error::MarketCoreError;
use crate::greeks::GreeksEngine;
use crate::stitcher::ContractStitcher;
use crate::types::{
    Bar, BarPeriod, ContractData, Greeks, OptionContract, StitchedContract, SwitchPoint, Tick,
};
use chrono::NaiveDate;
use common::Symbol;
use config::PipelineConfig;
use observability::IngestMetrics;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct MarketDataCoordinator {
    synthesizer: Arc<RwLock<BarSynthesizer>>,
    stitcher: Arc<RwLock<ContractStitcher>>,
    greeks_engine: Arc<GreeksEngine>,
    iv_max_iterations: u32,
    iv_tolerance: f64,
    metrics: Option<IngestMetrics>,
}

impl MarketDataCoordinator {
    pub fn new() -> Self {
        Self {
            synthesizer: Arc::new(RwLock::new(BarSynthesizer::new())),
            stitcher: Arc::new(RwLock::new(ContractStitcher::new())),
            greeks_engine: Arc::new(GreeksEngine::new()),
            iv_max_iterations: crate::greeks::DEFAULT_MAX_ITERATIONS,
            iv_tolerance: crate::greeks::DEFAULT_TOLERANCE,
            metrics: None,
        }
    }

    /// Build all three engines from a validated pipeline config
    pub fn from_config(config: &PipelineConfig) -> Result<Self, MarketCoreError> {
        let periods = config
            .bars
            .periods
            .iter()
            .map(|p| {
                BarPeriod::parse(p).ok_or_else(|| {
                    MarketCoreError::InvalidConfig(format!("unknown bar period '{}'", p))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            synthesizer: Arc::new(RwLock::new(BarSynthesizer::with_periods(periods)?)),
            stitcher: Arc::new(RwLock::new(ContractStitcher::with_params(
                config.stitcher.volume_weight,
                config.stitcher.oi_weight,
                config.stitcher.switch_threshold,
                config.stitcher.switch_days,
            )?)),
            greeks_engine: Arc::new(GreeksEngine::with_cache(config.greeks.cache_enabled)),
            iv_max_iterations: config.greeks.iv_max_iterations,
            iv_tolerance: config.greeks.iv_tolerance,
            metrics: None,
        })
    }

    /// Attach ingestion metrics; recorded on every tick thereafter
    pub fn with_metrics(mut self, metrics: IngestMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Feed one tick through the synthesizer, returning any bars it
    /// completed
    pub async fn on_tick(&self, tick: &Tick) -> Result<Vec<Bar>, MarketCoreError> {
        let started = Instant::now();
        let mut synthesizer = self.synthesizer.write().await;
        let result = synthesizer.process_tick(tick);
        let open_buffers = synthesizer.open_buffer_count();
        drop(synthesizer);

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(bars) => metrics.record_tick(started.elapsed(), bars.len()),
                Err(_) => metrics.record_rejected(),
            }
            metrics.set_open_buffers(open_buffers);
        }

        result
    }

    /// Flush every open buffer into a completed bar
    pub async fn force_complete(&self) -> Vec<Bar> {
        let mut synthesizer = self.synthesizer.write().await;
        synthesizer.force_complete_all()
    }

    /// Most recent completed bars, newest last; `limit` of 0 means all
    pub async fn bars(&self, symbol: &Symbol, period: BarPeriod, limit: usize) -> Vec<Bar> {
        let synthesizer = self.synthesizer.read().await;
        synthesizer.bars(symbol, period, limit)
    }

    /// Snapshot of the in-progress bar, if a buffer is open
    pub async fn open_bar(&self, symbol: &Symbol, period: BarPeriod) -> Option<Bar> {
        let synthesizer = self.synthesizer.read().await;
        synthesizer.open_bar(symbol, period)
    }

    pub async fn add_contract_data(
        &self,
        symbol: impl Into<Symbol>,
        rows: Vec<ContractData>,
    ) -> Result<(), MarketCoreError> {
        let mut stitcher = self.stitcher.write().await;
        stitcher.add_contract_data(symbol, rows)
    }

    pub async fn identify_main_contract(
        &self,
        date: NaiveDate,
        candidates: &[Symbol],
    ) -> Option<Symbol> {
        let stitcher = self.stitcher.read().await;
        stitcher.identify_main_contract(date, candidates)
    }

    pub async fn detect_switch_points(
        &self,
        candidates: &[Symbol],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<SwitchPoint> {
        let stitcher = self.stitcher.read().await;
        stitcher.detect_switch_points(candidates, start, end)
    }

    pub async fn stitch_contracts(
        &self,
        candidates: &[Symbol],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<StitchedContract> {
        let stitcher = self.stitcher.read().await;
        stitcher.stitch_contracts(candidates, start, end)
    }

    pub fn price(&self, contract: &OptionContract) -> f64 {
        self.greeks_engine.price(contract)
    }

    pub fn greeks(&self, contract: &OptionContract) -> Greeks {
        self.greeks_engine.greeks(contract)
    }

    pub fn implied_volatility(
        &self,
        contract: &OptionContract,
        market_price: f64,
    ) -> Option<f64> {
        self.greeks_engine.implied_volatility_with(
            contract,
            market_price,
            self.iv_max_iterations,
            self.iv_tolerance,
        )
    }

    pub fn greeks_cache_stats(&self) -> (u64, u64) {
        self.greeks_engine.cache_stats()
    }
}

impl Default for MarketDataCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
