// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the sensor-variants project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the sensor-trace variant generator
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use sensor_variants::orchestrator::{Orchestrator, SweepConfig};
use sensor_variants::pipeline::NoisePolicy;

/// Noise-augmented variant generation for recorded sensor tables
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet", global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate noise variants for every table under a directory
    Generate {
        /// Directory containing the source CSV tables (walked recursively)
        input_dir: PathBuf,

        /// Lowest noise scale of the sweep (inclusive)
        #[arg(long, default_value_t = 0.1)]
        noise_floor: f64,

        /// Upper bound of the noise-scale sweep (exclusive)
        #[arg(long, default_value_t = 5.1)]
        noise_ceiling: f64,

        /// Step between consecutive noise scales
        #[arg(long, default_value_t = 0.1)]
        noise_interval: f64,

        /// Noise strategy applied to every channel
        #[arg(long, value_enum, default_value_t = NoisePolicy::PeakProtected)]
        policy: NoisePolicy,

        /// Render comparison plots (accepted for compatibility, not implemented)
        #[arg(long, default_value_t = false)]
        plot: bool,

        /// Write the batch report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    match args.command {
        Command::Generate {
            input_dir,
            noise_floor,
            noise_ceiling,
            noise_interval,
            policy,
            plot,
            report,
        } => {
            if plot {
                warn!("plot rendering is not part of this tool; ignoring --plot");
            }
            if !input_dir.is_dir() {
                return Err(anyhow::anyhow!(
                    "input directory does not exist: {}",
                    input_dir.display()
                ));
            }
            if noise_interval <= 0.0 {
                return Err(anyhow::anyhow!("--noise-interval must be positive"));
            }
            if noise_ceiling <= noise_floor {
                return Err(anyhow::anyhow!(
                    "--noise-ceiling must be greater than --noise-floor"
                ));
            }

            let sweep = SweepConfig {
                floor: noise_floor,
                ceiling: noise_ceiling,
                interval: noise_interval,
            };
            info!(
                "sweeping {} scale(s) over {} with {:?} policy",
                sweep.scales().len(),
                input_dir.display(),
                policy
            );

            let orchestrator = Orchestrator::new(sweep, policy);
            let batch = orchestrator.run(&input_dir)?;

            if let Some(report_path) = &report {
                let json = serde_json::to_string_pretty(&batch)?;
                fs::write(report_path, json).with_context(|| {
                    format!("failed to write report to {}", report_path.display())
                })?;
                info!("batch report written to {}", report_path.display());
            }

            println!(
                "Generated {} variant table(s) ({} failure(s))",
                batch.variants_written,
                batch.failures.len()
            );
        }
    }

    Ok(())
}
