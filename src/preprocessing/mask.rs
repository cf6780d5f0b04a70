// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the sensor-variants project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Protection-mask construction
//!
//! Turns a set of detected peak indices into a smooth per-sample weight in
//! [0,1] describing how strongly noise must be suppressed at each sample:
//! 0 means fully noisable, 1 fully protected. Two criteria are combined by
//! element-wise maximum (union semantics):
//!
//! - a Hanning window of length `2w+1` overlaid at every peak, so protection
//!   fades in and out smoothly and overlapping zones blend instead of
//!   summing past 1;
//! - a boolean mask flagging every sample whose deviation from the centered
//!   signal's mean exceeds the adaptive threshold.
//!
//! # Example
//!
//! ```
//! use sensor_variants::preprocessing::ProtectionMaskBuilder;
//!
//! let centered = vec![0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0];
//! let mask = ProtectionMaskBuilder::new(2).build(&centered, &[3], 5.0);
//! assert_eq!(mask[3], 1.0);
//! assert!(mask.iter().all(|&m| (0.0..=1.0).contains(&m)));
//! ```

/// Builds combined protection masks for one channel.
#[derive(Debug, Clone)]
pub struct ProtectionMaskBuilder {
    half_width: usize,
}

impl ProtectionMaskBuilder {
    /// Create a builder protecting `half_width` samples on each side of a
    /// peak (window length `2 * half_width + 1`).
    pub fn new(half_width: usize) -> Self {
        Self { half_width }
    }

    /// Smooth mask: a Hanning window overlaid at each peak index, clipped to
    /// the signal bounds, merged by element-wise maximum.
    pub fn smooth_mask(&self, len: usize, peaks: &[usize]) -> Vec<f64> {
        let window = hanning(2 * self.half_width + 1);
        let mut mask: Vec<f64> = vec![0.0; len];
        for &peak in peaks {
            for (offset, &w) in window.iter().enumerate() {
                let idx = peak as isize - self.half_width as isize + offset as isize;
                if idx >= 0 && (idx as usize) < len {
                    let idx = idx as usize;
                    mask[idx] = mask[idx].max(w);
                }
            }
        }
        mask
    }

    /// Boolean mask: 1.0 where the centered signal deviates from its mean by
    /// more than `threshold`, 0.0 elsewhere.
    pub fn boolean_mask(&self, centered: &[f64], threshold: f64) -> Vec<f64> {
        let mean = centered.iter().sum::<f64>() / centered.len().max(1) as f64;
        centered
            .iter()
            .map(|&x| if (x - mean).abs() > threshold { 1.0 } else { 0.0 })
            .collect()
    }

    /// Combined mask: element-wise maximum of the smooth and boolean masks.
    /// A sample is protected if either criterion flags it; values stay in
    /// [0,1] by construction.
    pub fn build(&self, centered: &[f64], peaks: &[usize], threshold: f64) -> Vec<f64> {
        let smooth = self.smooth_mask(centered.len(), peaks);
        let boolean = self.boolean_mask(centered, threshold);
        smooth
            .into_iter()
            .zip(boolean)
            .map(|(s, b)| s.max(b))
            .collect()
    }
}

/// Symmetric Hanning window of the given length; a length of 1 degenerates
/// to a single full-weight sample.
pub fn hanning(len: usize) -> Vec<f64> {
    if len <= 1 {
        return vec![1.0; len];
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / denom).cos())
        .collect()
}
