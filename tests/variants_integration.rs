// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the sensor-variants project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::fs;

use sensor_variants::orchestrator::{Orchestrator, SweepConfig};
use sensor_variants::pipeline::NoisePolicy;
use sensor_variants::table::SensorTable;

const FULL_HEADER: &str = "Timestamp(ms),AccelX(g),AccelY(g),AccelZ(g),\
GyroX(deg/s),GyroY(deg/s),GyroZ(deg/s),DistanceLeft(cm),DistanceRight(cm)";

/// A small but realistic trace: rest, a sharp movement burst, rest again,
/// with a sonar approach-and-retreat on the left channel.
fn sample_csv() -> String {
    let mut lines = vec![FULL_HEADER.to_string()];
    for i in 0..24 {
        let t = i * 100;
        let burst = if (10..13).contains(&i) { 0.8 } else { 0.0 };
        let gyro_burst = if (10..13).contains(&i) { 45.0 } else { 0.0 };
        let left = if (10..13).contains(&i) { 12.0 } else { 55.0 };
        lines.push(format!(
            "{},{:.3},{:.3},{:.3},{:.2},{:.2},{:.2},{:.0},{:.0}",
            t,
            0.01 + burst,
            -0.02,
            0.98,
            gyro_burst,
            0.5,
            -0.3,
            left,
            60.0
        ));
    }
    lines.join("\n") + "\n"
}

fn small_sweep() -> SweepConfig {
    SweepConfig {
        floor: 0.5,
        ceiling: 0.7,
        interval: 0.1,
    }
}

#[test]
fn test_batch_writes_expected_variant_layout() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("run1.csv");
    fs::write(&source, sample_csv()).expect("Failed to write source table");

    let orchestrator = Orchestrator::new(small_sweep(), NoisePolicy::PeakProtected);
    let report = orchestrator.run(dir.path()).expect("Batch run failed");

    assert_eq!(report.variants_written, 2, "Expected one variant per scale");
    assert!(report.failures.is_empty(), "Unexpected failures: {:?}", report.failures);
    assert!(
        report.skipped_groups.is_empty(),
        "All sensor groups are present, nothing should be skipped"
    );

    let variants_dir = dir.path().join("variants");
    for tag in ["0_5", "0_6"] {
        let output = variants_dir.join(format!("run1_variants_scale{}.csv", tag));
        assert!(output.is_file(), "Missing variant file {}", output.display());

        let table = SensorTable::read(&output).expect("Failed to read variant");
        assert_eq!(table.rows(), 24, "Variant must keep the source row count");
        assert_eq!(
            table.headers().join(","),
            FULL_HEADER,
            "Variant must keep the source header row"
        );
    }
}

#[test]
fn test_variants_are_deterministic_across_runs() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("trace.csv");
    fs::write(&source, sample_csv()).expect("Failed to write source table");

    let orchestrator = Orchestrator::new(small_sweep(), NoisePolicy::PeakProtected);
    orchestrator.run(dir.path()).expect("First run failed");

    let output = dir.path().join("variants/trace_variants_scale0_5.csv");
    let first = fs::read_to_string(&output).expect("Failed to read first output");

    fs::remove_dir_all(dir.path().join("variants")).expect("Failed to clear variants");
    orchestrator.run(dir.path()).expect("Second run failed");
    let second = fs::read_to_string(&output).expect("Failed to read second output");

    assert_eq!(first, second, "Rerun over the same path must be bit-identical");
}

#[test]
fn test_sonar_columns_are_written_as_integers() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("run.csv");
    fs::write(&source, sample_csv()).expect("Failed to write source table");

    let orchestrator = Orchestrator::new(small_sweep(), NoisePolicy::PeakProtected);
    orchestrator.run(dir.path()).expect("Batch run failed");

    let output = dir.path().join("variants/run_variants_scale0_5.csv");
    let table = SensorTable::read(&output).expect("Failed to read variant");
    for idx in table.sonar_indices() {
        for &value in table.column(idx) {
            assert_eq!(
                value.fract(),
                0.0,
                "Sonar readings must be rounded to whole centimeters, got {}",
                value
            );
            assert!(value >= 0.0, "Sonar readings must stay non-negative");
        }
    }
}

#[test]
fn test_missing_sensor_groups_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut lines = vec!["Timestamp(ms),AccelX(g),AccelY(g),AccelZ(g)".to_string()];
    for i in 0..10 {
        lines.push(format!("{},0.01,-0.02,0.98", i * 100));
    }
    let source = dir.path().join("accel_only.csv");
    fs::write(&source, lines.join("\n") + "\n").expect("Failed to write source table");

    let orchestrator = Orchestrator::new(small_sweep(), NoisePolicy::PeakProtected);
    let report = orchestrator.run(dir.path()).expect("Batch run failed");

    assert_eq!(report.variants_written, 2);
    assert!(report.failures.is_empty(), "Skipped groups are not failures");

    let groups: Vec<&str> = report
        .skipped_groups
        .iter()
        .map(|(_, group)| group.as_str())
        .collect();
    assert!(groups.contains(&"gyroscope"), "Gyro group should be reported");
    assert!(groups.contains(&"sonar"), "Sonar group should be reported");
    assert!(
        !groups.contains(&"accelerometer"),
        "Accel group is present and must not be reported"
    );
}

#[test]
fn test_existing_variants_directory_is_not_reprocessed() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("run.csv");
    fs::write(&source, sample_csv()).expect("Failed to write source table");

    // A leftover from a previous run; its contents must never be walked
    let stale_dir = dir.path().join("variants");
    fs::create_dir_all(&stale_dir).expect("Failed to create variants dir");
    fs::write(stale_dir.join("stale_variants_scale0_5.csv"), sample_csv())
        .expect("Failed to plant stale variant");

    let orchestrator = Orchestrator::new(small_sweep(), NoisePolicy::PeakProtected);
    let report = orchestrator.run(dir.path()).expect("Batch run failed");

    assert_eq!(
        report.variants_written, 2,
        "Only the source table must be processed, never prior variants"
    );
    assert!(
        !stale_dir
            .join("stale_variants_scale0_5_variants_scale0_5.csv")
            .exists(),
        "Variants of variants must never be generated"
    );
}

#[test]
fn test_unreadable_table_fails_in_isolation() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("bad.csv"), "Timestamp(ms),AccelX(g)\noops,0.01\n")
        .expect("Failed to write bad table");
    fs::write(dir.path().join("good.csv"), sample_csv()).expect("Failed to write good table");

    let orchestrator = Orchestrator::new(small_sweep(), NoisePolicy::PeakProtected);
    let report = orchestrator.run(dir.path()).expect("Batch run failed");

    assert_eq!(report.variants_written, 2, "Good table must still be processed");
    assert_eq!(report.failures.len(), 2, "Bad table fails once per scale");
    assert!(
        report.failures.iter().all(|f| f.source.ends_with("bad.csv")),
        "Failures must point at the unreadable table"
    );
    assert!(
        dir.path()
            .join("variants/good_variants_scale0_5.csv")
            .is_file(),
        "Sibling output missing"
    );
}

#[test]
fn test_nested_directories_are_walked() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let nested = dir.path().join("session_a/day_1");
    fs::create_dir_all(&nested).expect("Failed to create nested dirs");
    let source = nested.join("run.csv");
    fs::write(&source, sample_csv()).expect("Failed to write source table");

    let orchestrator = Orchestrator::new(
        SweepConfig {
            floor: 1.0,
            ceiling: 1.1,
            interval: 0.1,
        },
        NoisePolicy::Basic,
    );
    let report = orchestrator.run(dir.path()).expect("Batch run failed");

    assert_eq!(report.variants_written, 1);
    // Output lands beside the source, not at the walk root
    assert!(
        nested.join("variants/run_variants_scale1_0.csv").is_file(),
        "Variant must be written next to its nested source"
    );
    assert!(!dir.path().join("variants").exists());
}
