// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the sensor-variants project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Peak-aware noise augmentation for motion-sensor traces
//!
//! This crate expands a corpus of recorded sensor tables (triaxial
//! accelerometer, triaxial gyroscope and ultrasonic distance channels) into
//! families of synthetic variants. Noise intensity adapts to local movement
//! magnitude, detected signal peaks are protected by a smooth attenuation
//! mask, and sonar channels receive their own transition-aware treatment
//! with spikes, dropouts and a physical floor clamp.
//!
//! The pipeline is deterministic end to end: every variant's random stream
//! is derived from a stable hash of the source path plus the sweep index, so
//! reruns reproduce identical output files.
//!
//! Module map:
//! - [`config`] — per-sensor-category noise parameter sets
//! - [`preprocessing`] — adaptive thresholds, peak detection, protection masks
//! - [`synthesis`] — movement-adaptive std profiles and truncated-normal draws
//! - [`pipeline`] — IMU and sonar channel pipelines, noise policy selection
//! - [`table`] — CSV sensor-table model with column-group discovery
//! - [`orchestrator`] — directory walk, scale sweep and batch reporting

pub mod config;
pub mod orchestrator;
pub mod pipeline;
pub mod preprocessing;
pub mod synthesis;
pub mod table;

pub use config::{NoiseParams, SensorCategory};
pub use orchestrator::{BatchReport, Orchestrator, SweepConfig};
pub use pipeline::NoisePolicy;
