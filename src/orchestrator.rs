// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the sensor-variants project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Variant batch orchestrator
//!
//! Walks an input corpus, derives deterministic seeds, sweeps a noise-scale
//! range and drives the channel pipelines for every (file, scale) pair,
//! writing one augmented table per variant under a `variants` subdirectory
//! beside each source file.
//!
//! Determinism contract: the base seed for a file is a stable FNV-1a hash of
//! its path (no process-level hash randomization involved), and each sweep
//! step adds its index. The same (file, scale-index) pair therefore
//! reproduces bit-identical noise across separate process invocations, while
//! different files and scales diverge.
//!
//! A failing job is recorded and never aborts its siblings; sensor groups
//! missing from a table are skipped, reported per file and logged, not
//! treated as errors.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;

use crate::config::NoiseParams;
use crate::pipeline::{ImuPipeline, NoisePolicy, SonarPipeline};
use crate::synthesis::NoiseSynthesizer;
use crate::table::SensorTable;

/// Name of the per-source-directory output folder; also the directory name
/// skipped during the walk so generated variants are never reprocessed.
pub const VARIANTS_DIR: &str = "variants";

/// Tag embedded in every output file name.
const VARIANT_TAG: &str = "variants";

/// Noise-scale sweep: closed-open `[floor, ceiling)` at a fixed interval.
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    pub floor: f64,
    pub ceiling: f64,
    pub interval: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        // 50 steps: 0.1, 0.2, .. 5.0
        Self {
            floor: 0.1,
            ceiling: 5.1,
            interval: 0.1,
        }
    }
}

impl SweepConfig {
    /// The scale values of this sweep, in order.
    pub fn scales(&self) -> Vec<f64> {
        let mut scales = Vec::new();
        let mut i = 0u64;
        loop {
            let scale = self.floor + i as f64 * self.interval;
            if scale >= self.ceiling - 1e-9 {
                break;
            }
            scales.push(scale);
            i += 1;
        }
        scales
    }
}

/// One unit of work: a (source file, scale, seed, output path) tuple.
/// Immutable once planned; consumed exactly once.
#[derive(Debug, Clone)]
pub struct VariantJob {
    pub source: PathBuf,
    pub scale: f64,
    pub seed: u64,
    pub output: PathBuf,
}

/// A job that failed; the batch carries on without it.
#[derive(Debug, Clone, Serialize)]
pub struct JobFailure {
    pub source: String,
    pub scale: f64,
    pub error: String,
}

/// Summary of a completed batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Total variant tables written
    pub variants_written: usize,
    /// Per-job failures, in walk order
    pub failures: Vec<JobFailure>,
    /// (file, sensor group) pairs that were skipped for missing columns
    pub skipped_groups: Vec<(String, String)>,
}

/// Stable 64-bit FNV-1a hash of a path's UTF-8 bytes. Used as the per-file
/// base seed so reruns reproduce identical variants regardless of platform
/// or process.
pub fn stable_path_seed(path: &Path) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for &byte in path.to_string_lossy().as_bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Scale value as a file-name tag: trailing zeros trimmed (at most three
/// decimals), at least one decimal kept, `.` replaced by `_` (1.0 → `1_0`).
pub fn scale_tag(scale: f64) -> String {
    let mut s = format!("{:.3}", scale);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.push('0');
    }
    s.replace('.', "_")
}

/// Drives the variant sweep over an input corpus.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    sweep: SweepConfig,
    policy: NoisePolicy,
}

impl Orchestrator {
    pub fn new(sweep: SweepConfig, policy: NoisePolicy) -> Self {
        Self { sweep, policy }
    }

    /// Plan the variant jobs for one source table.
    pub fn plan_jobs(&self, source: &Path) -> Vec<VariantJob> {
        let base_seed = stable_path_seed(source);
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = source
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "csv".to_string());
        let out_dir = source
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(VARIANTS_DIR);

        self.sweep
            .scales()
            .iter()
            .enumerate()
            .map(|(step, &scale)| VariantJob {
                source: source.to_path_buf(),
                scale,
                seed: base_seed.wrapping_add(step as u64),
                output: out_dir.join(format!(
                    "{}_{}_scale{}.{}",
                    stem,
                    VARIANT_TAG,
                    scale_tag(scale),
                    ext
                )),
            })
            .collect()
    }

    /// Execute one job: read, noise the matching sensor groups, round, write.
    /// Returns the sensor groups that were absent from the table.
    pub fn run_job(&self, job: &VariantJob) -> Result<Vec<&'static str>> {
        let mut table = SensorTable::read(&job.source)?;
        let mut synth = NoiseSynthesizer::from_seed(job.seed, job.scale);
        let mut missing = Vec::new();

        match table.accel_indices() {
            Some(indices) => {
                let pipeline =
                    ImuPipeline::new(NoiseParams::accelerometer(job.scale), self.policy);
                let axes = pipeline.apply(
                    [
                        table.column(indices[0]),
                        table.column(indices[1]),
                        table.column(indices[2]),
                    ],
                    &mut synth,
                );
                for (idx, axis) in indices.into_iter().zip(axes) {
                    table.set_column(idx, axis);
                }
            }
            None => missing.push("accelerometer"),
        }

        match table.gyro_indices() {
            Some(indices) => {
                let pipeline = ImuPipeline::new(NoiseParams::gyroscope(job.scale), self.policy);
                let axes = pipeline.apply(
                    [
                        table.column(indices[0]),
                        table.column(indices[1]),
                        table.column(indices[2]),
                    ],
                    &mut synth,
                );
                for (idx, axis) in indices.into_iter().zip(axes) {
                    table.set_column(idx, axis);
                }
            }
            None => missing.push("gyroscope"),
        }

        let sonar_indices = table.sonar_indices();
        if sonar_indices.is_empty() {
            missing.push("sonar");
        } else {
            let pipeline = SonarPipeline::new(NoiseParams::sonar(job.scale), self.policy);
            for idx in sonar_indices {
                let noised = pipeline.apply(table.column(idx), &mut synth);
                table.set_column(idx, noised);
            }
        }

        // Concurrent creators must tolerate an already-existing folder
        let out_dir = job.output.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;

        table.round_for_output();
        table.write(&job.output)?;
        debug!(
            "wrote {} (scale {}, seed {})",
            job.output.display(),
            job.scale,
            job.seed
        );
        Ok(missing)
    }

    /// Walk `input_dir`, run every job, and return the batch report.
    pub fn run(&self, input_dir: &Path) -> Result<BatchReport> {
        let mut sources = Vec::new();
        collect_tables(input_dir, &mut sources)
            .with_context(|| format!("failed to walk {}", input_dir.display()))?;
        info!(
            "found {} source table(s) under {}",
            sources.len(),
            input_dir.display()
        );

        let mut report = BatchReport::default();
        let mut skipped: BTreeSet<(String, String)> = BTreeSet::new();

        for source in &sources {
            for job in self.plan_jobs(source) {
                match self.run_job(&job) {
                    Ok(missing) => {
                        report.variants_written += 1;
                        for group in missing {
                            let key = (source.display().to_string(), group.to_string());
                            if skipped.insert(key.clone()) {
                                warn!(
                                    "{}: no {} columns, group left untouched",
                                    source.display(),
                                    group
                                );
                            }
                        }
                    }
                    Err(err) => {
                        warn!(
                            "variant failed for {} at scale {}: {:#}",
                            source.display(),
                            job.scale,
                            err
                        );
                        report.failures.push(JobFailure {
                            source: source.display().to_string(),
                            scale: job.scale,
                            error: format!("{:#}", err),
                        });
                    }
                }
            }
        }

        report.skipped_groups = skipped.into_iter().collect();
        Ok(report)
    }
}

/// Recursively collect table files, skipping any `variants` subdirectory so
/// generated output is never reprocessed. Entries are visited in sorted
/// order to keep run reports stable.
fn collect_tables(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("failed to list {}", dir.display()))?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            if path.file_name().map_or(false, |n| n == VARIANTS_DIR) {
                continue;
            }
            collect_tables(&path, out)?;
        } else if path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
        {
            out.push(path);
        }
    }
    Ok(())
}
