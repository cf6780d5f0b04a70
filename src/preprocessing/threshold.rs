// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the sensor-variants project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Adaptive threshold statistics
//!
//! A single scalar statistic derived from a signal, used to decide which
//! samples sit far enough from the baseline to deserve protection from
//! injected noise. Three methods are supported, selected by a
//! [`ThresholdMethod`] tag:
//!
//! - `percent_max`: ratio × max(|x|)
//! - `percent_median`: ratio × median(|x|)
//! - `std_dev`: ratio × population standard deviation of x
//!
//! Tags arriving as strings (for example from a configuration file) are
//! parsed with `FromStr`; an unrecognized tag is a programming-contract
//! violation and fails immediately with [`ThresholdError::InvalidMethod`].
//!
//! # Example
//!
//! ```
//! use sensor_variants::preprocessing::{adaptive_threshold, ThresholdMethod};
//!
//! let signal = vec![0.0, -2.0, 4.0, 1.0];
//! let t = adaptive_threshold(&signal, ThresholdMethod::PercentMax, 0.1);
//! assert!((t - 0.4).abs() < 1e-12);
//! ```

use std::str::FromStr;

use thiserror::Error;

use super::median;

/// Errors raised by threshold computation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThresholdError {
    /// The method tag does not name a known statistic.
    #[error("unrecognized threshold method: {0}")]
    InvalidMethod(String),
}

/// Statistic used to derive the adaptive threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMethod {
    /// Fraction of the maximum absolute sample value
    PercentMax,
    /// Fraction of the median absolute sample value
    PercentMedian,
    /// Multiple of the population standard deviation
    StdDev,
}

impl FromStr for ThresholdMethod {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percent_max" => Ok(Self::PercentMax),
            "percent_median" => Ok(Self::PercentMedian),
            "std_dev" => Ok(Self::StdDev),
            other => Err(ThresholdError::InvalidMethod(other.to_string())),
        }
    }
}

/// Compute `ratio × statistic(signal)` for the chosen method.
///
/// Pure, no side effects. An empty signal yields 0.0 for every method.
pub fn adaptive_threshold(signal: &[f64], method: ThresholdMethod, ratio: f64) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let statistic = match method {
        ThresholdMethod::PercentMax => signal.iter().fold(0.0f64, |acc, x| acc.max(x.abs())),
        ThresholdMethod::PercentMedian => {
            let abs: Vec<f64> = signal.iter().map(|x| x.abs()).collect();
            median(&abs)
        }
        ThresholdMethod::StdDev => {
            let n = signal.len() as f64;
            let mean = signal.iter().sum::<f64>() / n;
            let var = signal.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            var.sqrt()
        }
    };
    ratio * statistic
}
