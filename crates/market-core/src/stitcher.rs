//! Continuous futures series via price-difference splicing
//!
//! The most liquid contract ("main contract") is scored daily from
//! volume and open interest. When an alternative out-scores the current
//! main by more than `switch_threshold` for `switch_days` consecutive
//! days, the chain rolls over; the close-to-close jump at that date is
//! absorbed into a cumulative adjustment subtracted from all subsequent
//! prices, so the spliced series shows no roll-over gap.

use crate::error::MarketCoreError;
use crate::types::{ContractData, StitchedContract, SwitchPoint};
use chrono::NaiveDate;
use common::Symbol;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

pub const DEFAULT_VOLUME_WEIGHT: f64 = 0.6;
pub const DEFAULT_OI_WEIGHT: f64 = 0.4;
pub const DEFAULT_SWITCH_THRESHOLD: f64 = 1.2;
pub const DEFAULT_SWITCH_DAYS: u32 = 3;

/// Splices per-contract daily data into one continuous series
#[derive(Debug, Clone)]
pub struct ContractStitcher {
    data: HashMap<Symbol, BTreeMap<NaiveDate, ContractData>>,
    volume_weight: f64,
    oi_weight: f64,
    switch_threshold: f64,
    switch_days: u32,
}

impl ContractStitcher {
    /// Stitcher with the default 0.6/0.4 weighting and 1.2×/3-day switch rule
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            volume_weight: DEFAULT_VOLUME_WEIGHT,
            oi_weight: DEFAULT_OI_WEIGHT,
            switch_threshold: DEFAULT_SWITCH_THRESHOLD,
            switch_days: DEFAULT_SWITCH_DAYS,
        }
    }

    /// Stitcher with explicit weighting and switch rule
    pub fn with_params(
        volume_weight: f64,
        oi_weight: f64,
        switch_threshold: f64,
        switch_days: u32,
    ) -> Result<Self, MarketCoreError> {
        if volume_weight < 0.0 || oi_weight < 0.0 {
            return Err(MarketCoreError::InvalidConfig(format!(
                "score weights must be non-negative, got {}/{}",
                volume_weight, oi_weight
            )));
        }
        if ((volume_weight + oi_weight) - 1.0).abs() > 1e-9 {
            return Err(MarketCoreError::InvalidConfig(format!(
                "score weights must sum to 1.0, got {}",
                volume_weight + oi_weight
            )));
        }
        if !switch_threshold.is_finite() || switch_threshold <= 1.0 {
            return Err(MarketCoreError::InvalidConfig(format!(
                "switch threshold must exceed 1.0, got {}",
                switch_threshold
            )));
        }
        if switch_days == 0 {
            return Err(MarketCoreError::InvalidConfig(
                "switch days must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            data: HashMap::new(),
            volume_weight,
            oi_weight,
            switch_threshold,
            switch_days,
        })
    }

    /// Load one contract's daily rows; sorted by date internally
    pub fn add_contract_data(
        &mut self,
        symbol: impl Into<Symbol>,
        rows: Vec<ContractData>,
    ) -> Result<(), MarketCoreError> {
        let symbol = symbol.into();
        if rows.is_empty() {
            return Err(MarketCoreError::EmptyContractData(symbol.to_string()));
        }

        let entry = self.data.entry(symbol.clone()).or_default();
        let count = rows.len();
        for row in rows {
            entry.insert(row.date, row);
        }
        debug!(symbol = %symbol, rows = count, "Loaded contract data");
        Ok(())
    }

    fn row(&self, symbol: &Symbol, date: NaiveDate) -> Option<&ContractData> {
        self.data.get(symbol)?.get(&date)
    }

    /// Latest row on or before `date`, for close/ratio lookups when the
    /// outgoing contract stopped trading
    fn row_on_or_before(&self, symbol: &Symbol, date: NaiveDate) -> Option<&ContractData> {
        self.data
            .get(symbol)?
            .range(..=date)
            .next_back()
            .map(|(_, row)| row)
    }

    fn score(&self, row: &ContractData) -> f64 {
        self.volume_weight * row.volume + self.oi_weight * row.open_interest
    }

    /// The highest-scoring candidate with data on `date`, if any
    pub fn identify_main_contract(
        &self,
        date: NaiveDate,
        candidates: &[Symbol],
    ) -> Option<Symbol> {
        let mut best: Option<(&Symbol, f64)> = None;
        for candidate in candidates {
            let Some(row) = self.row(candidate, date) else {
                continue;
            };
            let score = self.score(row);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((candidate, score));
            }
        }
        best.map(|(symbol, _)| symbol.clone())
    }

    /// Detect confirmed roll-overs between `start` and `end` inclusive
    ///
    /// An alternative becomes a switch candidate when its score ratio over
    /// the current main exceeds the threshold (a zero main score counts as
    /// infinite ratio); it must stay the top alternative above threshold
    /// for `switch_days` consecutive days. Any break resets the streak.
    pub fn detect_switch_points(
        &self,
        candidates: &[Symbol],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<SwitchPoint> {
        let mut switches = Vec::new();
        let mut current_main: Option<Symbol> = None;
        let mut streak_candidate: Option<Symbol> = None;
        let mut streak = 0u32;

        let mut date = start;
        while date <= end {
            let Some(main) = current_main.clone() else {
                current_main = self.identify_main_contract(date, candidates);
                date = match date.succ_opt() {
                    Some(d) => d,
                    None => break,
                };
                continue;
            };

            let main_score = self.row(&main, date).map(|r| self.score(r)).unwrap_or(0.0);

            let alternative = candidates
                .iter()
                .filter(|c| **c != main)
                .filter_map(|c| self.row(c, date).map(|r| (c, self.score(r))))
                .max_by(|a, b| a.1.total_cmp(&b.1));

            match alternative {
                Some((alt, alt_score)) => {
                    let ratio = if main_score > 0.0 {
                        alt_score / main_score
                    } else {
                        f64::INFINITY
                    };

                    if ratio > self.switch_threshold {
                        if streak_candidate.as_ref() == Some(alt) {
                            streak += 1;
                        } else {
                            streak_candidate = Some(alt.clone());
                            streak = 1;
                        }

                        if streak >= self.switch_days {
                            if let Some(point) = self.build_switch_point(&main, alt, date) {
                                info!(
                                    date = %date,
                                    from = %point.old_contract,
                                    to = %point.new_contract,
                                    price_diff = point.price_diff,
                                    "Main contract switch confirmed"
                                );
                                switches.push(point);
                            }
                            current_main = Some(alt.clone());
                            streak_candidate = None;
                            streak = 0;
                        }
                    } else {
                        streak_candidate = None;
                        streak = 0;
                    }
                }
                None => {
                    streak_candidate = None;
                    streak = 0;
                }
            }

            date = match date.succ_opt() {
                Some(d) => d,
                None => break,
            };
        }

        switches
    }

    fn build_switch_point(
        &self,
        old: &Symbol,
        new: &Symbol,
        date: NaiveDate,
    ) -> Option<SwitchPoint> {
        let new_row = self.row(new, date)?;
        // The outgoing contract may already have stopped trading; fall
        // back to its most recent row.
        let old_row = self.row_on_or_before(old, date)?;

        let ratio = |n: f64, o: f64| if o > 0.0 { n / o } else { f64::INFINITY };

        Some(SwitchPoint {
            date,
            old_contract: old.clone(),
            new_contract: new.clone(),
            price_diff: new_row.close - old_row.close,
            volume_ratio: ratio(new_row.volume, old_row.volume),
            oi_ratio: ratio(new_row.open_interest, old_row.open_interest),
        })
    }

    /// Build the continuous series between `start` and `end` inclusive
    ///
    /// Each confirmed switch adds its price_diff to a running cumulative
    /// adjustment, subtracted from OHLC from the switch date onward.
    /// Volume and open interest pass through unadjusted. Dates where the
    /// active main has no data are skipped.
    pub fn stitch_contracts(
        &self,
        candidates: &[Symbol],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<StitchedContract> {
        let switches = self.detect_switch_points(candidates, start, end);
        let mut switch_iter = switches.iter().peekable();

        let mut series = Vec::new();
        let mut active: Option<Symbol> = None;
        let mut adjustment = 0.0;

        let mut date = start;
        while date <= end {
            while let Some(point) = switch_iter.peek() {
                if point.date > date {
                    break;
                }
                adjustment += point.price_diff;
                active = Some(point.new_contract.clone());
                switch_iter.next();
            }

            if active.is_none() {
                active = self.identify_main_contract(date, candidates);
            }

            if let Some(main) = &active {
                if let Some(row) = self.row(main, date) {
                    series.push(StitchedContract {
                        date,
                        open: row.open - adjustment,
                        high: row.high - adjustment,
                        low: row.low - adjustment,
                        close: row.close - adjustment,
                        volume: row.volume,
                        open_interest: row.open_interest,
                        main_contract: main.clone(),
                        adjustment,
                    });
                }
            }

            date = match date.succ_opt() {
                Some(d) => d,
                None => break,
            };
        }

        series
    }
}

impl Default for ContractStitcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn create_test_row(
        symbol: &str,
        date: NaiveDate,
        close: f64,
        volume: f64,
        open_interest: f64,
    ) -> ContractData {
        ContractData {
            symbol: symbol.into(),
            date,
            open: close - 1.0,
            high: close + 2.0,
            low: close - 2.0,
            close,
            volume,
            open_interest,
            settlement: None,
        }
    }

    /// Near contract dominant for days 1-5, far contract dominant from
    /// day 6; with a 3-day confirmation the switch lands on day 8.
    fn build_rollover_stitcher() -> ContractStitcher {
        let mut stitcher = ContractStitcher::new();

        let near: Vec<ContractData> = (1..=10)
            .map(|d| {
                let volume = if d <= 5 { 10000.0 } else { 1000.0 };
                create_test_row("IF2403", day(d), 100.0, volume, volume)
            })
            .collect();
        let far: Vec<ContractData> = (1..=10)
            .map(|d| {
                let volume = if d <= 5 { 1000.0 } else { 10000.0 };
                create_test_row("IF2406", day(d), 110.0, volume, volume)
            })
            .collect();

        stitcher.add_contract_data("IF2403", near).unwrap();
        stitcher.add_contract_data("IF2406", far).unwrap();
        stitcher
    }

    #[test]
    fn test_empty_batch_rejected() {
        let mut stitcher = ContractStitcher::new();
        assert_matches!(
            stitcher.add_contract_data("IF2403", vec![]),
            Err(MarketCoreError::EmptyContractData(_))
        );
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert_matches!(
            ContractStitcher::with_params(0.7, 0.4, 1.2, 3),
            Err(MarketCoreError::InvalidConfig(_))
        );
        assert_matches!(
            ContractStitcher::with_params(0.6, 0.4, 0.9, 3),
            Err(MarketCoreError::InvalidConfig(_))
        );
        assert_matches!(
            ContractStitcher::with_params(0.6, 0.4, 1.2, 0),
            Err(MarketCoreError::InvalidConfig(_))
        );
        assert!(ContractStitcher::with_params(0.5, 0.5, 1.5, 2).is_ok());
    }

    #[test]
    fn test_identify_main_contract_by_weighted_score() {
        let mut stitcher = ContractStitcher::new();
        // Volume favors A, open interest favors B; volume carries 0.6
        stitcher
            .add_contract_data("A", vec![create_test_row("A", day(1), 100.0, 10000.0, 2000.0)])
            .unwrap();
        stitcher
            .add_contract_data("B", vec![create_test_row("B", day(1), 100.0, 8000.0, 4000.0)])
            .unwrap();

        // A: 0.6*10000 + 0.4*2000 = 6800; B: 0.6*8000 + 0.4*4000 = 6400
        let main = stitcher.identify_main_contract(day(1), &["A".into(), "B".into()]);
        assert_eq!(main, Some("A".into()));
    }

    #[test]
    fn test_identify_main_contract_no_data() {
        let stitcher = ContractStitcher::new();
        let main = stitcher.identify_main_contract(day(1), &["A".into()]);
        assert_eq!(main, None);
    }

    #[test]
    fn test_switch_confirmed_after_consecutive_days() {
        let stitcher = build_rollover_stitcher();
        let symbols: Vec<Symbol> = vec!["IF2403".into(), "IF2406".into()];

        let switches = stitcher.detect_switch_points(&symbols, day(1), day(10));
        assert_eq!(switches.len(), 1);

        let point = &switches[0];
        // Ratio first exceeds the threshold on day 6; confirmed on day 8
        assert_eq!(point.date, day(8));
        assert_eq!(point.old_contract, "IF2403".into());
        assert_eq!(point.new_contract, "IF2406".into());
        assert!((point.price_diff - 10.0).abs() < 1e-9);
        assert!(point.volume_ratio > 1.0);
    }

    #[test]
    fn test_broken_streak_resets_count() {
        let mut stitcher = ContractStitcher::new();

        // Far contract dominates on day 2, dips back on day 3, then
        // dominates again on days 4-6: the switch needs a fresh 3-day
        // run and lands on day 6, not day 4.
        let near: Vec<ContractData> = (1..=7)
            .map(|d| create_test_row("IF2403", day(d), 100.0, 5000.0, 5000.0))
            .collect();
        let far: Vec<ContractData> = (1..=7)
            .map(|d| {
                let volume = if d == 1 || d == 3 { 1000.0 } else { 10000.0 };
                create_test_row("IF2406", day(d), 108.0, volume, volume)
            })
            .collect();
        stitcher.add_contract_data("IF2403", near).unwrap();
        stitcher.add_contract_data("IF2406", far).unwrap();

        let symbols: Vec<Symbol> = vec!["IF2403".into(), "IF2406".into()];
        let switches = stitcher.detect_switch_points(&symbols, day(1), day(7));
        assert_eq!(switches.len(), 1);
        assert_eq!(switches[0].date, day(6));
    }

    #[test]
    fn test_no_switch_when_streak_never_completes() {
        let mut stitcher = ContractStitcher::new();

        // Alternative dominates only two days; with switch_days = 3 no
        // switch may be confirmed.
        let near: Vec<ContractData> = (1..=5)
            .map(|d| create_test_row("IF2403", day(d), 100.0, 5000.0, 5000.0))
            .collect();
        let far: Vec<ContractData> = (1..=5)
            .map(|d| {
                let volume = if d == 2 || d == 3 { 10000.0 } else { 1000.0 };
                create_test_row("IF2406", day(d), 108.0, volume, volume)
            })
            .collect();
        stitcher.add_contract_data("IF2403", near).unwrap();
        stitcher.add_contract_data("IF2406", far).unwrap();

        let symbols: Vec<Symbol> = vec!["IF2403".into(), "IF2406".into()];
        let switches = stitcher.detect_switch_points(&symbols, day(1), day(5));
        assert!(switches.is_empty());
    }

    #[test]
    fn test_stitched_series_zero_adjustment_before_switch() {
        let stitcher = build_rollover_stitcher();
        let symbols: Vec<Symbol> = vec!["IF2403".into(), "IF2406".into()];

        let series = stitcher.stitch_contracts(&symbols, day(1), day(10));

        for row in series.iter().filter(|r| r.date < day(8)) {
            assert!((row.adjustment - 0.0).abs() < 1e-12);
            assert_eq!(row.main_contract, "IF2403".into());
            assert!((row.close - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_stitched_series_continuous_across_switch() {
        let stitcher = build_rollover_stitcher();
        let symbols: Vec<Symbol> = vec!["IF2403".into(), "IF2406".into()];

        let series = stitcher.stitch_contracts(&symbols, day(1), day(10));
        assert_eq!(series.len(), 10);

        // After the switch the raw close of 110 is pulled back by the
        // +10 adjustment: no visible jump in the spliced series.
        for row in series.iter().filter(|r| r.date >= day(8)) {
            assert_eq!(row.main_contract, "IF2406".into());
            assert!((row.adjustment - 10.0).abs() < 1e-9);
            assert!((row.close - 100.0).abs() < 1e-9);
        }

        // Volume passes through unadjusted
        let last = series.last().unwrap();
        assert!((last.volume - 10000.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_dates_are_skipped() {
        let mut stitcher = ContractStitcher::new();
        stitcher
            .add_contract_data(
                "IF2403",
                vec![
                    create_test_row("IF2403", day(1), 100.0, 5000.0, 5000.0),
                    // day 2 missing
                    create_test_row("IF2403", day(3), 101.0, 5000.0, 5000.0),
                ],
            )
            .unwrap();

        let symbols: Vec<Symbol> = vec!["IF2403".into()];
        let series = stitcher.stitch_contracts(&symbols, day(1), day(3));
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, day(1));
        assert_eq!(series[1].date, day(3));
    }

    #[test]
    fn test_cumulative_adjustment_over_two_switches() {
        let mut stitcher = ContractStitcher::new();

        let make = |symbol: &str, active: std::ops::RangeInclusive<u32>, close: f64| {
            (1..=20)
                .map(|d| {
                    let volume = if active.contains(&d) { 10000.0 } else { 100.0 };
                    create_test_row(symbol, day(d), close, volume, volume)
                })
                .collect::<Vec<_>>()
        };

        stitcher.add_contract_data("C1", make("C1", 1..=6, 100.0)).unwrap();
        stitcher.add_contract_data("C2", make("C2", 7..=13, 104.0)).unwrap();
        stitcher.add_contract_data("C3", make("C3", 14..=20, 110.0)).unwrap();

        let symbols: Vec<Symbol> = vec!["C1".into(), "C2".into(), "C3".into()];
        let switches = stitcher.detect_switch_points(&symbols, day(1), day(20));
        assert_eq!(switches.len(), 2);

        let series = stitcher.stitch_contracts(&symbols, day(1), day(20));
        let last = series.last().unwrap();
        // Adjustment is the sum of both confirmed price diffs
        let expected: f64 = switches.iter().map(|s| s.price_diff).sum();
        assert!((last.adjustment - expected).abs() < 1e-9);
        assert!((last.close - (110.0 - expected)).abs() < 1e-9);
    }
}
