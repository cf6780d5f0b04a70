// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the sensor-variants project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Noise parameter configuration
//!
//! This module defines the per-sensor-category noise parameter sets used by the
//! detection and synthesis stages. A [`NoiseParams`] value is built once per
//! run from fixed, empirically tuned constants (MPU-6050 accelerometer and
//! gyroscope, HC-SR04 ultrasonic rangers) together with the global
//! `noise_scale` of the variant being generated, and is never mutated
//! afterwards.
//!
//! # Example
//!
//! ```
//! use sensor_variants::config::NoiseParams;
//!
//! let accel = NoiseParams::accelerometer(1.0);
//! assert_eq!(accel.base_std, 0.004);
//!
//! let sonar = NoiseParams::sonar(0.5);
//! assert_eq!(sonar.noise_scale, 0.5);
//! assert!(sonar.spike_prob > 0.0);
//! ```

use serde::{Deserialize, Serialize};

/// The sensor categories this tool knows how to augment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorCategory {
    /// Triaxial accelerometer (g units, carries a static gravity offset)
    Accelerometer,
    /// Triaxial gyroscope (deg/s, zero-centered at rest)
    Gyroscope,
    /// Ultrasonic distance channel (cm, non-negative)
    Sonar,
}

/// Immutable noise parameter set for one sensor category.
///
/// The accelerometer/gyroscope constants are RMS noise figures typical of the
/// MPU-6050, the sonar constants typical of the HC-SR04. The `noise_scale`
/// field is the global sweep value of the variant being generated; it scales
/// the synthesized noise at draw time, not the stored constants, so a scale
/// of 0.0 disables the Gaussian term entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseParams {
    /// Which sensor category these parameters describe
    pub category: SensorCategory,

    /// Baseline noise standard deviation in sensor units
    pub base_std: f64,

    /// Extra noise per unit of local movement magnitude
    pub movement_std_ratio: f64,

    /// Static lower bound on peak prominence
    pub peak_prominence: f64,

    /// Multiplier applied to the median smoothed magnitude to obtain the
    /// dynamic prominence threshold
    pub prominence_factor: f64,

    /// Minimum number of samples between two detected peaks
    pub peak_distance: usize,

    /// Optional minimum peak width (samples, at half prominence)
    pub peak_width: Option<f64>,

    /// Moving-average window used when estimating the dynamic prominence
    pub ma_window_size: usize,

    /// Multiplier on `base_std` for the sonar transition detector
    pub threshold_multiplier: f64,

    /// Probability of an injected spike per sample (sonar only)
    pub spike_prob: f64,

    /// Probability of a dropped reading per sample (sonar only)
    pub dropout_prob: f64,

    /// Spike standard deviation as a multiple of `base_std` (sonar only)
    pub spike_std_multiplier: f64,

    /// Cap on the per-sample noise std as a fraction of the channel's value
    /// range (sonar only)
    pub max_noise_fraction: f64,

    /// Global noise scale of the variant being generated
    pub noise_scale: f64,
}

impl NoiseParams {
    /// Parameter set for a triaxial accelerometer channel (MPU-6050, g units).
    pub fn accelerometer(noise_scale: f64) -> Self {
        Self {
            category: SensorCategory::Accelerometer,
            base_std: 0.004,
            movement_std_ratio: 0.1,
            peak_prominence: 0.3,
            prominence_factor: 1.5,
            peak_distance: 5,
            peak_width: None,
            ma_window_size: 10,
            threshold_multiplier: 3.0,
            spike_prob: 0.0,
            dropout_prob: 0.0,
            spike_std_multiplier: 0.0,
            max_noise_fraction: 0.0,
            noise_scale,
        }
    }

    /// Parameter set for a triaxial gyroscope channel (MPU-6050, deg/s).
    pub fn gyroscope(noise_scale: f64) -> Self {
        Self {
            category: SensorCategory::Gyroscope,
            base_std: 0.05,
            movement_std_ratio: 0.1,
            peak_prominence: 2.0,
            prominence_factor: 1.5,
            peak_distance: 5,
            peak_width: None,
            ma_window_size: 10,
            threshold_multiplier: 3.0,
            spike_prob: 0.0,
            dropout_prob: 0.0,
            spike_std_multiplier: 0.0,
            max_noise_fraction: 0.0,
            noise_scale,
        }
    }

    /// Parameter set for an ultrasonic distance channel (HC-SR04, cm).
    pub fn sonar(noise_scale: f64) -> Self {
        Self {
            category: SensorCategory::Sonar,
            base_std: 0.5,
            movement_std_ratio: 0.1,
            peak_prominence: 1.0,
            prominence_factor: 1.5,
            peak_distance: 5,
            peak_width: None,
            ma_window_size: 10,
            threshold_multiplier: 3.0,
            spike_prob: 0.005,
            dropout_prob: 0.01,
            spike_std_multiplier: 3.0,
            max_noise_fraction: 0.1,
            noise_scale,
        }
    }

    /// Symmetric truncation bound for the Gaussian draw, in standard
    /// deviations. Sonar uses a tighter cut because its spikes are modeled
    /// separately.
    pub fn sigma_cut(&self) -> f64 {
        match self.category {
            SensorCategory::Sonar => 2.5,
            _ => 3.0,
        }
    }
}
