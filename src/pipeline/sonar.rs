// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the sensor-variants project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Sonar channel pipeline (ultrasonic range)
//!
//! Distance channels get a treatment of their own: sharp first-difference
//! transitions are presumed to be real obstacle-distance changes and keep
//! most of their shape, the per-sample noise std is capped at a fraction of
//! the channel's value range so spikes cannot grow unbounded on wide-range
//! traces, occasional large spikes and echo-miss dropouts are injected, and
//! the final series is clamped at a floor derived from the original trace so
//! distances never plunge below plausibility.

use crate::config::NoiseParams;
use crate::pipeline::NoisePolicy;
use crate::preprocessing::{detect_peaks, rolling_mean_abs, ProtectionMaskBuilder};
use crate::synthesis::{NoiseSynthesizer, MOVEMENT_WINDOW, STD_FLOOR};

use super::imu::DEFAULT_MASK_HALF_WIDTH;

/// Std multiplier applied inside significant-transition samples.
const TRANSITION_SUPPRESSION: f64 = 0.3;

/// Conservative substitute for a dropped reading: a fraction of the original
/// value, but never below 5 cm (an echo miss still reports something).
const DROPOUT_RATIO: f64 = 0.3;
const DROPOUT_MIN_CM: f64 = 5.0;

/// Noise pipeline for one ultrasonic distance channel.
#[derive(Debug, Clone)]
pub struct SonarPipeline {
    params: NoiseParams,
    policy: NoisePolicy,
    mask_half_width: usize,
}

impl SonarPipeline {
    /// Create a pipeline for the given parameter set and policy.
    pub fn new(params: NoiseParams, policy: NoisePolicy) -> Self {
        Self {
            params,
            policy,
            mask_half_width: DEFAULT_MASK_HALF_WIDTH,
        }
    }

    /// Samples whose first-difference magnitude exceeds
    /// `threshold_multiplier × base_std`. The first sample is compared
    /// against itself and can never be a transition.
    pub fn significant_transitions(&self, signal: &[f64]) -> Vec<bool> {
        let gate = self.params.threshold_multiplier * self.params.base_std;
        signal
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let prev = if i == 0 { x } else { signal[i - 1] };
                (x - prev).abs() > gate
            })
            .collect()
    }

    /// Noise one distance channel. Output length equals input length and is
    /// non-negative whenever the input is.
    pub fn apply(&self, signal: &[f64], synth: &mut NoiseSynthesizer) -> Vec<f64> {
        let n = signal.len();
        let transitions;
        let stds;
        let floor;

        match self.policy {
            NoisePolicy::Basic => {
                transitions = vec![false; n];
                stds = vec![self.params.base_std; n];
                floor = 0.0;
            }
            NoisePolicy::PeakProtected => {
                let detection = detect_peaks(signal, &self.params, true);
                let mask = ProtectionMaskBuilder::new(self.mask_half_width).build(
                    &detection.centered,
                    &detection.peaks,
                    detection.threshold,
                );
                transitions = self.significant_transitions(signal);
                stds = self.noise_stds(signal, &detection.centered, &mask, &transitions);
                floor = 0.5 * percentile(signal, 1.0);
            }
        }

        // Gaussian pass (tighter +-2.5 sigma cut, spikes are modeled apart)
        let noise = synth.draw(&stds, 2.5);
        let mut out: Vec<f64> = signal.iter().zip(noise).map(|(&x, e)| x + e).collect();

        // Spike pass: rare large perturbations, never on real transitions
        let spike_std = self.params.base_std * self.params.spike_std_multiplier;
        for i in 0..n {
            if synth.uniform() < self.params.spike_prob && !transitions[i] {
                out[i] += synth.normal(spike_std);
            }
        }

        // Dropout pass: an echo miss reports a conservative minimum
        for i in 0..n {
            if synth.uniform() < self.params.dropout_prob {
                out[i] = (DROPOUT_RATIO * signal[i]).max(DROPOUT_MIN_CM);
            }
        }

        for v in &mut out {
            *v = v.max(floor);
        }
        out
    }

    /// Per-sample noise std profile: movement-scaled, capped at a fraction
    /// of the channel's value range, suppressed by the protection mask and
    /// multiplied by 0.3 at significant transitions, floored last.
    fn noise_stds(
        &self,
        signal: &[f64],
        centered: &[f64],
        mask: &[f64],
        transitions: &[bool],
    ) -> Vec<f64> {
        let max = signal.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let min = signal.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let std_cap = self.params.max_noise_fraction * (max - min);

        let magnitude = rolling_mean_abs(centered, MOVEMENT_WINDOW);
        magnitude
            .iter()
            .zip(mask)
            .zip(transitions)
            .map(|((&mag, &m), &transition)| {
                let mut std = self.params.base_std + mag * self.params.movement_std_ratio;
                std = std.min(std_cap);
                std *= 1.0 - m;
                if transition {
                    std *= TRANSITION_SUPPRESSION;
                }
                std.max(STD_FLOOR)
            })
            .collect()
    }
}

/// Linearly interpolated percentile (0..=100) of a slice.
fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoiseParams;

    fn outlier_drop() -> Vec<f64> {
        vec![50.0, 50.0, 50.0, 5.0, 50.0, 50.0]
    }

    #[test]
    fn test_transition_detection() {
        let pipeline = SonarPipeline::new(NoiseParams::sonar(1.0), NoisePolicy::PeakProtected);
        let transitions = pipeline.significant_transitions(&outlier_drop());
        // |5 - 50| and |50 - 5| both exceed 3 x 0.5
        assert_eq!(transitions, vec![false, false, false, true, true, false]);
    }

    #[test]
    fn test_transition_std_is_suppressed_threefold() {
        // Indices 2 and 3 of the outlier-drop trace carry the same movement
        // magnitude (rolling |centered| mean of 9.0), but only 3 is a
        // transition, so the x0.3 suppression is the sole difference in
        // their std profile
        let pipeline = SonarPipeline::new(NoiseParams::sonar(1.0), NoisePolicy::PeakProtected);
        let signal = outlier_drop();
        let centered: Vec<f64> = signal.iter().map(|x| x - 50.0).collect();
        let mask = vec![0.0; signal.len()];
        let transitions = pipeline.significant_transitions(&signal);
        assert!(!transitions[2] && transitions[3]);

        let stds = pipeline.noise_stds(&signal, &centered, &mask, &transitions);
        assert!(
            (stds[3] - TRANSITION_SUPPRESSION * stds[2]).abs() < 1e-12,
            "transition std {} must be 0.3 x the equal-magnitude std {}",
            stds[3],
            stds[2]
        );

        // Removing the flag removes the suppression and nothing else
        let unflagged = pipeline.noise_stds(&signal, &centered, &mask, &vec![false; signal.len()]);
        assert!((unflagged[3] - unflagged[2]).abs() < 1e-12);
        assert!((unflagged[2] - stds[2]).abs() < 1e-12);
    }

    #[test]
    fn test_first_sample_never_a_transition() {
        let pipeline = SonarPipeline::new(NoiseParams::sonar(1.0), NoisePolicy::PeakProtected);
        let transitions = pipeline.significant_transitions(&[100.0, 100.0]);
        assert_eq!(transitions, vec![false, false]);
    }

    #[test]
    fn test_output_non_negative() {
        let pipeline = SonarPipeline::new(NoiseParams::sonar(1.0), NoisePolicy::PeakProtected);
        let signal = vec![2.0, 1.5, 0.5, 0.0, 1.0, 30.0, 2.0, 1.0];
        for seed in 0..64 {
            let mut synth = NoiseSynthesizer::from_seed(seed, 5.0);
            let out = pipeline.apply(&signal, &mut synth);
            assert_eq!(out.len(), signal.len());
            for (i, &v) in out.iter().enumerate() {
                assert!(v >= 0.0, "negative distance {} at {} (seed {})", v, i, seed);
            }
        }
    }

    #[test]
    fn test_determinism_per_seed() {
        let pipeline = SonarPipeline::new(NoiseParams::sonar(1.0), NoisePolicy::PeakProtected);
        let signal = outlier_drop();
        let a = pipeline.apply(&signal, &mut NoiseSynthesizer::from_seed(21, 1.0));
        let b = pipeline.apply(&signal, &mut NoiseSynthesizer::from_seed(21, 1.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_std_cap_bounds_wide_range_noise() {
        // Range 100 -> std cap 10; without the cap the movement term at the
        // cliff would exceed it
        let params = NoiseParams::sonar(1.0);
        let pipeline = SonarPipeline::new(params.clone(), NoisePolicy::PeakProtected);
        let signal = vec![100.0, 100.0, 100.0, 0.0, 0.0, 0.0];
        let cap = params.max_noise_fraction * 100.0;
        for seed in 0..32 {
            let mut synth = NoiseSynthesizer::from_seed(seed, 1.0);
            let out = pipeline.apply(&signal, &mut synth);
            for (i, (&orig, &v)) in signal.iter().zip(&out).enumerate() {
                let deviation = (v - orig).abs();
                // 2.5 sigma at the cap, unless a spike or dropout fired
                assert!(
                    deviation <= 2.5 * cap + 4.5 + orig,
                    "unbounded sonar noise at {}: {}",
                    i,
                    deviation
                );
            }
        }
    }

    #[test]
    fn test_zero_scale_leaves_most_samples_untouched() {
        // With the Gaussian term silenced only spike and dropout events
        // (combined probability ~1.5% per sample) can still alter a value
        let pipeline = SonarPipeline::new(NoiseParams::sonar(0.0), NoisePolicy::PeakProtected);
        let signal = vec![40.0, 40.0, 40.0, 40.0, 40.0, 40.0];
        let mut synth = NoiseSynthesizer::from_seed(17, 0.0);
        let out = pipeline.apply(&signal, &mut synth);
        let changed = out.iter().zip(&signal).filter(|(a, b)| a != b).count();
        assert!(changed <= 2, "too many samples changed at scale 0: {}", changed);
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = vec![0.0, 10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&values, 0.0), 0.0);
        assert_eq!(percentile(&values, 50.0), 20.0);
        assert_eq!(percentile(&values, 100.0), 40.0);
        assert!((percentile(&values, 25.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_basic_policy_shape_and_floor() {
        let pipeline = SonarPipeline::new(NoiseParams::sonar(1.0), NoisePolicy::Basic);
        let signal = vec![10.0; 32];
        let mut synth = NoiseSynthesizer::from_seed(8, 1.0);
        let out = pipeline.apply(&signal, &mut synth);
        assert_eq!(out.len(), signal.len());
        assert!(out.iter().all(|&v| v >= 0.0));
    }
}
