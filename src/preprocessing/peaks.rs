// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the sensor-variants project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Significant-peak detection
//!
//! Finds the local extrema of a sensor channel that represent genuine
//! movement events rather than noise-level bumps. The primitive
//! ([`find_peaks`]) implements the classical "local maxima with prominence
//! and minimum distance" algorithm as a self-contained function, in the same
//! way the filter modules hand-port the IIR design formulas they need: the
//! core stays portable and free of a scientific mega-dependency.
//!
//! On top of the primitive, [`detect_peaks`] applies the sensor-aware
//! policy: optional median centering, a dynamic prominence threshold derived
//! from the smoothed signal magnitude, two-sided detection (maxima of the
//! signal and of its negation) and an absolute-height filter.
//!
//! # Example
//!
//! ```
//! use sensor_variants::preprocessing::find_peaks;
//!
//! let signal = vec![0.0, 1.0, 0.0, 3.0, 0.0, 1.0, 0.0];
//! let peaks = find_peaks(&signal, 2.0, 1, None);
//! assert_eq!(peaks, vec![3]);
//! ```

use crate::config::NoiseParams;

use super::{adaptive_threshold, median, rolling_mean_abs, ThresholdMethod};

/// Result of running the peak detector over one channel.
#[derive(Debug, Clone)]
pub struct PeakDetection {
    /// Sorted indices of significant extrema
    pub peaks: Vec<usize>,
    /// Adaptive threshold (`percent_max`, ratio 0.1) of the centered signal
    pub threshold: f64,
    /// The centered signal the detector operated on
    pub centered: Vec<f64>,
}

/// Find local maxima constrained by prominence, minimum inter-peak distance
/// and an optional minimum width at half prominence.
///
/// Plateaus are reported at their midpoint. Constraints are applied in the
/// order distance, prominence, width; the distance filter keeps the higher
/// of two competing peaks. Returned indices are sorted ascending.
pub fn find_peaks(
    signal: &[f64],
    prominence: f64,
    distance: usize,
    min_width: Option<f64>,
) -> Vec<usize> {
    let mut peaks = local_maxima(signal);

    if distance > 1 {
        peaks = filter_by_distance(signal, peaks, distance);
    }

    let mut kept = Vec::with_capacity(peaks.len());
    for &p in &peaks {
        let prom = peak_prominence(signal, p);
        if prom < prominence {
            continue;
        }
        if let Some(w) = min_width {
            if peak_width(signal, p, prom) < w {
                continue;
            }
        }
        kept.push(p);
    }
    kept
}

/// Local maxima of a signal; a flat plateau counts once, at its midpoint.
fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let n = signal.len();
    let mut peaks = Vec::new();
    let mut i = 1;
    while n >= 3 && i < n - 1 {
        if signal[i] > signal[i - 1] {
            // Extend over a possible plateau
            let mut j = i;
            while j + 1 < n && signal[j + 1] == signal[i] {
                j += 1;
            }
            if j + 1 < n && signal[j + 1] < signal[i] {
                peaks.push((i + j) / 2);
            }
            i = j + 1;
        } else {
            i += 1;
        }
    }
    peaks
}

/// Prominence of a peak: its height above the higher of the two base levels,
/// where each base is the lowest sample between the peak and the next
/// higher sample (or the signal edge) on that side.
fn peak_prominence(signal: &[f64], peak: usize) -> f64 {
    let height = signal[peak];

    let mut left_base = height;
    let mut k = peak;
    while k > 0 {
        k -= 1;
        if signal[k] > height {
            break;
        }
        left_base = left_base.min(signal[k]);
    }

    let mut right_base = height;
    let mut k = peak;
    while k + 1 < signal.len() {
        k += 1;
        if signal[k] > height {
            break;
        }
        right_base = right_base.min(signal[k]);
    }

    height - left_base.max(right_base)
}

/// Width of a peak in samples, measured at half its prominence with linear
/// interpolation at the crossings. Runs that never drop below the evaluation
/// height end at the signal edge.
fn peak_width(signal: &[f64], peak: usize, prominence: f64) -> f64 {
    let eval_height = signal[peak] - 0.5 * prominence;

    let mut left_ip = 0.0;
    let mut k = peak;
    while k > 0 {
        if signal[k - 1] < eval_height {
            // Interpolate between k-1 and k
            left_ip = (k - 1) as f64
                + (eval_height - signal[k - 1]) / (signal[k] - signal[k - 1]);
            break;
        }
        k -= 1;
    }

    let mut right_ip = (signal.len() - 1) as f64;
    let mut k = peak;
    while k + 1 < signal.len() {
        if signal[k + 1] < eval_height {
            right_ip =
                k as f64 + (signal[k] - eval_height) / (signal[k] - signal[k + 1]);
            break;
        }
        k += 1;
    }

    right_ip - left_ip
}

/// Remove peaks closer than `distance` samples to a taller peak. Peaks are
/// visited tallest-first, so of any crowded cluster the highest survives.
fn filter_by_distance(signal: &[f64], peaks: Vec<usize>, distance: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| signal[peaks[b]].total_cmp(&signal[peaks[a]]));

    let mut removed = vec![false; peaks.len()];
    for &idx in &order {
        if removed[idx] {
            continue;
        }
        for other in 0..peaks.len() {
            if other != idx && !removed[other] && peaks[other].abs_diff(peaks[idx]) < distance {
                removed[other] = true;
            }
        }
    }

    peaks
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !removed[*i])
        .map(|(_, p)| p)
        .collect()
}

/// Run the full sensor-aware peak detector over one channel.
///
/// When `normalize` is set the sample median is subtracted first, which
/// centers sensors carrying a constant offset (gravity on a vertical
/// accelerometer axis). The dynamic prominence threshold is the median of
/// the moving-average absolute signal times `prominence_factor`, floored at
/// the category's static `peak_prominence` so a flat trace cannot collapse
/// it to zero. Maxima of the centered signal and of its negation are
/// detected, merged and finally filtered by absolute height: only extrema
/// at least 10% of the value range away from the mean survive.
pub fn detect_peaks(signal: &[f64], params: &NoiseParams, normalize: bool) -> PeakDetection {
    let centered: Vec<f64> = if normalize {
        let m = median(signal);
        signal.iter().map(|x| x - m).collect()
    } else {
        signal.to_vec()
    };

    let smoothed = rolling_mean_abs(&centered, params.ma_window_size);
    let dynamic_prominence =
        (median(&smoothed) * params.prominence_factor).max(params.peak_prominence);

    let maxima = find_peaks(
        &centered,
        dynamic_prominence,
        params.peak_distance,
        params.peak_width,
    );
    let negated: Vec<f64> = centered.iter().map(|x| -x).collect();
    let minima = find_peaks(
        &negated,
        dynamic_prominence,
        params.peak_distance,
        params.peak_width,
    );

    let mut candidates = maxima;
    candidates.extend(minima);
    candidates.sort_unstable();
    candidates.dedup();

    // Absolute-height filter relative to the centered signal's spread
    let mean = centered.iter().sum::<f64>() / centered.len().max(1) as f64;
    let max = centered.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let min = centered.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let range = max - min;
    let upper = mean + 0.1 * range;
    let lower = mean - 0.1 * range;
    let peaks: Vec<usize> = candidates
        .into_iter()
        .filter(|&p| centered[p] >= upper || centered[p] <= lower)
        .collect();

    let threshold = adaptive_threshold(&centered, ThresholdMethod::PercentMax, 0.1);

    PeakDetection {
        peaks,
        threshold,
        centered,
    }
}
