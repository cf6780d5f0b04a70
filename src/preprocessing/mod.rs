// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the sensor-variants project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Signal-side primitives for peak-aware noise synthesis
//!
//! This module groups the pure, side-effect-free building blocks that run
//! before any noise is drawn: adaptive threshold statistics, significant-peak
//! detection and protection-mask construction.

pub mod mask;
pub mod peaks;
pub mod threshold;

pub use mask::ProtectionMaskBuilder;
pub use peaks::{detect_peaks, find_peaks, PeakDetection};
pub use threshold::{adaptive_threshold, ThresholdError, ThresholdMethod};

/// Sample median of a slice. Even lengths average the two middle values,
/// matching the conventional statistical definition.
///
/// Returns 0.0 for an empty slice so callers centering a signal can treat
/// "nothing to center" as a no-op.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Centered, edge-tolerant rolling mean of the absolute value of a signal.
///
/// The window shrinks near the edges instead of padding, so the output has
/// the same length as the input and every sample is an average of real data.
/// Used both for the dynamic prominence estimate (detection) and for the
/// local movement-magnitude estimate (synthesis).
pub fn rolling_mean_abs(signal: &[f64], window: usize) -> Vec<f64> {
    let n = signal.len();
    let window = window.max(1);
    let half = window / 2;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(n);
        let sum: f64 = signal[start..end].iter().map(|x| x.abs()).sum();
        out.push(sum / (end - start) as f64);
    }
    out
}
