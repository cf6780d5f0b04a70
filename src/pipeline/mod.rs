// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the sensor-variants project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Per-channel noise pipelines
//!
//! Orchestrates detection and synthesis for each sensor channel with the
//! sensor-specific policies layered on top: median centering, transition
//! suppression, dropout, spikes and floor clamping. A pipeline owns no
//! persistent state; applying one is a pure function of
//! (signal, parameter set, seed).

pub mod imu;
pub mod sonar;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use imu::ImuPipeline;
pub use sonar::SonarPipeline;

/// Noise strategy selected by configuration.
///
/// The repository historically carried two competing generator
/// implementations for the same task; they are unified here as one pipeline
/// with a selectable policy instead of duplicated classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum NoisePolicy {
    /// Flat Gaussian noise at the category's base std, no peak protection.
    /// Retained for comparison runs against the movement-preserving policy.
    Basic,
    /// Peak-aware adaptive noise: movement-scaled variance, suppressed
    /// inside protected zones around detected peaks and transitions.
    PeakProtected,
}
