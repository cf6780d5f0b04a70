// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the sensor-variants project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! IMU channel pipeline (accelerometer / gyroscope)
//!
//! Each of the three axes is processed independently. Accelerometer axes are
//! median-centered before detection and synthesis — a vertical axis carries
//! a constant ≈1 g gravity offset that would otherwise register as one giant
//! "movement" — while gyroscope axes are used as-is. Centering is only a
//! detection aid: the synthesized noise is always added to the original,
//! uncentered samples.

use crate::config::{NoiseParams, SensorCategory};
use crate::pipeline::NoisePolicy;
use crate::preprocessing::{detect_peaks, ProtectionMaskBuilder};
use crate::synthesis::NoiseSynthesizer;

/// Default protection half-width around a detected peak, in samples.
pub const DEFAULT_MASK_HALF_WIDTH: usize = 5;

/// Noise pipeline for one triaxial IMU sensor.
#[derive(Debug, Clone)]
pub struct ImuPipeline {
    params: NoiseParams,
    policy: NoisePolicy,
    mask_half_width: usize,
}

impl ImuPipeline {
    /// Create a pipeline for the given parameter set and policy.
    pub fn new(params: NoiseParams, policy: NoisePolicy) -> Self {
        Self {
            params,
            policy,
            mask_half_width: DEFAULT_MASK_HALF_WIDTH,
        }
    }

    /// Noise one axis. The returned vector has the same length as the input
    /// and contains the original samples plus synthesized noise.
    pub fn apply_axis(&self, signal: &[f64], synth: &mut NoiseSynthesizer) -> Vec<f64> {
        let noise = match self.policy {
            NoisePolicy::Basic => {
                let stds = vec![self.params.base_std; signal.len()];
                synth.draw(&stds, f64::INFINITY)
            }
            NoisePolicy::PeakProtected => {
                let center = self.params.category == SensorCategory::Accelerometer;
                let detection = detect_peaks(signal, &self.params, center);
                let mask = ProtectionMaskBuilder::new(self.mask_half_width).build(
                    &detection.centered,
                    &detection.peaks,
                    detection.threshold,
                );
                synth.synthesize(&detection.centered, &self.params, &mask)
            }
        };

        signal.iter().zip(noise).map(|(&x, n)| x + n).collect()
    }

    /// Noise all three axes in order. Axes are independent; they only share
    /// the synthesizer's random stream.
    pub fn apply(&self, axes: [&[f64]; 3], synth: &mut NoiseSynthesizer) -> [Vec<f64>; 3] {
        [
            self.apply_axis(axes[0], synth),
            self.apply_axis(axes[1], synth),
            self.apply_axis(axes[2], synth),
        ]
    }
}
