//! Black-Scholes pricing and Greeks for European options
//!
//! Supports a continuous dividend yield. The normal CDF uses the
//! Abramowitz-Stegun polynomial approximation (error below 7.5e-8).

use crate::types::{Greeks, OptionContract, OptionType};
use std::f64::consts::PI;

/// One second in years, the floor on time to maturity
pub const MIN_TIME: f64 = 1.0 / (365.25 * 24.0 * 3600.0);
pub const MIN_VOL: f64 = 1e-6;

/// Standard normal probability density
pub fn norm_pdf(x: f64) -> f64 {
    (1.0 / (2.0 * PI).sqrt()) * (-0.5 * x * x).exp()
}

/// Standard normal cumulative distribution, Abramowitz-Stegun 26.2.17
pub fn norm_cdf(x: f64) -> f64 {
    let k = 1.0 / (1.0 + 0.2316419 * x.abs());
    let poly = k * (0.319381530
        + k * (-0.356563782
        + k * (1.781477937
        + k * (-1.821255978
        + k * 1.330274429))));

    let approx = 1.0 - norm_pdf(x) * poly;

    if x >= 0.0 {
        approx
    } else {
        1.0 - approx
    }
}

pub fn d1_d2(contract: &OptionContract) -> (f64, f64) {
    let s = contract.underlying;
    let k = contract.strike;
    let t = contract.maturity.max(MIN_TIME);
    let v = contract.volatility.max(MIN_VOL);
    let r = contract.rate;
    let q = contract.dividend_yield;

    let d1 = ((s / k).ln() + (r - q + 0.5 * v * v) * t) / (v * t.sqrt());
    let d2 = d1 - v * t.sqrt();

    (d1, d2)
}

/// Theoretical price under Black-Scholes with continuous dividend yield
pub fn price(contract: &OptionContract) -> f64 {
    let (d1, d2) = d1_d2(contract);
    let s = contract.underlying;
    let k = contract.strike;
    let t = contract.maturity.max(MIN_TIME);
    let r = contract.rate;
    let q = contract.dividend_yield;

    let price = match contract.option_type {
        OptionType::Call => {
            s * (-q * t).exp() * norm_cdf(d1) - k * (-r * t).exp() * norm_cdf(d2)
        }
        OptionType::Put => {
            k * (-r * t).exp() * norm_cdf(-d2) - s * (-q * t).exp() * norm_cdf(-d1)
        }
    };

    price.max(0.0)
}

pub fn intrinsic_value(spot: f64, strike: f64, option_type: OptionType) -> f64 {
    match option_type {
        OptionType::Call => (spot - strike).max(0.0),
        OptionType::Put => (strike - spot).max(0.0),
    }
}

/// All five Greeks plus the theoretical price at the same inputs
///
/// Theta is per year; divide by 365 for a per-day decay figure.
pub fn greeks(contract: &OptionContract) -> Greeks {
    let (d1, d2) = d1_d2(contract);
    let s = contract.underlying;
    let k = contract.strike;
    let t = contract.maturity.max(MIN_TIME);
    let v = contract.volatility.max(MIN_VOL);
    let r = contract.rate;
    let q = contract.dividend_yield;

    let pdf = norm_pdf(d1);
    let sqrt_t = t.sqrt();
    let disc_q = (-q * t).exp();
    let disc_r = (-r * t).exp();

    let delta = match contract.option_type {
        OptionType::Call => disc_q * norm_cdf(d1),
        OptionType::Put => disc_q * (norm_cdf(d1) - 1.0),
    };

    let gamma = disc_q * pdf / (s * v * sqrt_t);

    let vega = s * disc_q * pdf * sqrt_t;

    let theta = match contract.option_type {
        OptionType::Call => {
            -(s * disc_q * pdf * v) / (2.0 * sqrt_t) - r * k * disc_r * norm_cdf(d2)
                + q * s * disc_q * norm_cdf(d1)
        }
        OptionType::Put => {
            -(s * disc_q * pdf * v) / (2.0 * sqrt_t) + r * k * disc_r * norm_cdf(-d2)
                - q * s * disc_q * norm_cdf(-d1)
        }
    };

    let rho = match contract.option_type {
        OptionType::Call => k * t * disc_r * norm_cdf(d2),
        OptionType::Put => -k * t * disc_r * norm_cdf(-d2),
    };

    Greeks {
        delta,
        gamma,
        vega,
        theta,
        rho,
        option_price: price(contract),
    }
}
