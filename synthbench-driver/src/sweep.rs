// SPDX-License-Identifier: Apache-2.0

//! `mul-verify-sweep`: times Rosette on the split-multiply identity.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::ArgMatches;
use synthbench::{
    run_mul_verify_sweep, write_sweep_csv, RunConfig, RunOverrides, SolverBackend, SweepConfig,
    ToolchainConfig,
};

fn parse_bitwidths(text: &str) -> anyhow::Result<Vec<u32>> {
    text.split(',')
        .map(|s| {
            s.trim()
                .parse::<u32>()
                .with_context(|| format!("invalid bitwidth {:?}", s))
        })
        .collect()
}

/// `default` selects Rosette's default solver.
fn parse_solvers(text: &str) -> anyhow::Result<Vec<Option<SolverBackend>>> {
    text.split(',')
        .map(|s| match s.trim() {
            "default" => Ok(None),
            name => name.parse::<SolverBackend>().map(Some).map_err(anyhow::Error::msg),
        })
        .collect()
}

fn timeout_from_matches(matches: &ArgMatches) -> anyhow::Result<Duration> {
    if let Some(text) = matches.get_one::<String>("timeout_s") {
        let seconds: f64 = text
            .parse()
            .with_context(|| format!("--timeout_s must be a number; got {:?}", text))?;
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(anyhow!("--timeout_s must be positive; got {}", seconds));
        }
        return Ok(Duration::from_secs_f64(seconds));
    }
    let overrides = RunOverrides {
        manifest_path: matches.get_one::<String>("manifest").map(PathBuf::from),
        ..Default::default()
    };
    let run_config = RunConfig::from_process_env(&overrides)
        .context("no --timeout_s given; reading the timeout from the manifest")?;
    Ok(run_config.mul_verify_timeout())
}

pub fn handle_mul_verify_sweep(
    matches: &ArgMatches,
    toolchain: &ToolchainConfig,
) -> anyhow::Result<()> {
    let mut sweep = SweepConfig::new(timeout_from_matches(matches)?);
    if let Some(text) = matches.get_one::<String>("bitwidths") {
        sweep.bitwidths = parse_bitwidths(text)?;
    }
    if let Some(text) = matches.get_one::<String>("solvers") {
        sweep.backends = parse_solvers(text)?;
    }

    let records = run_mul_verify_sweep(&sweep, toolchain)?;
    match matches.get_one::<String>("output_csv") {
        Some(path) => {
            write_sweep_csv(&records, Path::new(path))?;
            log::info!("Wrote {} sweep records to {}", records.len(), path);
        }
        None => {
            for record in &records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
    }
    Ok(())
}
