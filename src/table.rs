// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the sensor-variants project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Tabular sensor-trace model
//!
//! CSV-backed tables of floating-point sensor channels. The reader preserves
//! header names and column order exactly; the writer emits the same schema,
//! so an augmented table is a drop-in replacement for its source.
//!
//! Column discovery follows the recording schema: the accelerometer and
//! gyroscope groups require their exact 3-column sets, while sonar-like
//! channels are matched by case-insensitive substring (`sonar` or `dist`),
//! so additional range sensors are picked up automatically.

use std::path::Path;

use anyhow::{Context, Result};

/// Exact accelerometer column set, in axis order.
pub const ACCEL_COLUMNS: [&str; 3] = ["AccelX(g)", "AccelY(g)", "AccelZ(g)"];

/// Exact gyroscope column set, in axis order.
pub const GYRO_COLUMNS: [&str; 3] = ["GyroX(deg/s)", "GyroY(deg/s)", "GyroZ(deg/s)"];

/// A sensor trace table: named columns of equal-length f64 series.
#[derive(Debug, Clone)]
pub struct SensorTable {
    headers: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl SensorTable {
    /// Build a table from headers and column-major data. Panics in debug
    /// builds if column counts disagree.
    pub fn new(headers: Vec<String>, columns: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(headers.len(), columns.len());
        Self { headers, columns }
    }

    /// Read a CSV table with a header row.
    pub fn read(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open table: {}", path.display()))?;
        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("failed to read header row: {}", path.display()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
        for (row_idx, record) in reader.records().enumerate() {
            let record = record
                .with_context(|| format!("failed to read row {}: {}", row_idx + 1, path.display()))?;
            for (col, field) in record.iter().enumerate() {
                let value: f64 = field.trim().parse().with_context(|| {
                    format!(
                        "non-numeric value {:?} in column {:?}, row {}: {}",
                        field,
                        headers.get(col).map(String::as_str).unwrap_or("?"),
                        row_idx + 1,
                        path.display()
                    )
                })?;
                columns
                    .get_mut(col)
                    .with_context(|| {
                        format!("row {} has more fields than headers: {}", row_idx + 1, path.display())
                    })?
                    .push(value);
            }
        }
        Ok(Self { headers, columns })
    }

    /// Write the table as CSV, headers first.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create output table: {}", path.display()))?;
        writer
            .write_record(&self.headers)
            .with_context(|| format!("failed to write header row: {}", path.display()))?;
        for row in 0..self.rows() {
            let record: Vec<String> = self
                .columns
                .iter()
                .map(|col| col[row].to_string())
                .collect();
            writer
                .write_record(&record)
                .with_context(|| format!("failed to write row {}: {}", row + 1, path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to flush output table: {}", path.display()))?;
        Ok(())
    }

    /// Number of data rows.
    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Column headers, in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Index of an exactly named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Borrow one column by index.
    pub fn column(&self, idx: usize) -> &[f64] {
        &self.columns[idx]
    }

    /// Replace one column by index. The replacement must keep the row count.
    pub fn set_column(&mut self, idx: usize, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.rows());
        self.columns[idx] = values;
    }

    /// Indices of the exact accelerometer triple, if all three are present.
    pub fn accel_indices(&self) -> Option<[usize; 3]> {
        self.exact_triple(&ACCEL_COLUMNS)
    }

    /// Indices of the exact gyroscope triple, if all three are present.
    pub fn gyro_indices(&self) -> Option<[usize; 3]> {
        self.exact_triple(&GYRO_COLUMNS)
    }

    fn exact_triple(&self, names: &[&str; 3]) -> Option<[usize; 3]> {
        Some([
            self.column_index(names[0])?,
            self.column_index(names[1])?,
            self.column_index(names[2])?,
        ])
    }

    /// Indices of all sonar-like columns: header contains `sonar` or `dist`,
    /// case-insensitively.
    pub fn sonar_indices(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| {
                let lower = h.to_lowercase();
                lower.contains("sonar") || lower.contains("dist")
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Round for output: sonar columns to whole units, every other column to
    /// 3 decimal places. Bounds floating noise in the emitted file so diffs
    /// between runs stay reproducible.
    pub fn round_for_output(&mut self) {
        let sonar: Vec<usize> = self.sonar_indices();
        for (idx, col) in self.columns.iter_mut().enumerate() {
            if sonar.contains(&idx) {
                for v in col.iter_mut() {
                    *v = v.round();
                }
            } else {
                for v in col.iter_mut() {
                    *v = (*v * 1000.0).round() / 1000.0;
                }
            }
        }
    }
}
