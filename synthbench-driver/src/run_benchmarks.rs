// SPDX-License-Identifier: Apache-2.0

//! `run-benchmarks`: every benchmark in the manifest through Vivado and
//! Yosys, then one collected CSV.

use std::path::PathBuf;

use anyhow::anyhow;
use clap::ArgMatches;
use synthbench::{generate_benchmark_tasks, run_tasks, RunConfig, RunOverrides, ToolchainConfig};

use crate::common::parse_u32_flag;

pub fn handle_run_benchmarks(
    matches: &ArgMatches,
    toolchain: &ToolchainConfig,
) -> anyhow::Result<()> {
    let overrides = RunOverrides {
        manifest_path: matches.get_one::<String>("manifest").map(PathBuf::from),
        output_dir: matches.get_one::<String>("output_dir").map(PathBuf::from),
        iterations: parse_u32_flag(matches, "iterations")?,
    };
    let run_config = RunConfig::from_process_env(&overrides)?;
    log::info!(
        "run-benchmarks; manifest: {} output dir: {} iterations: {}",
        run_config.manifest_path.display(),
        run_config.output_dir.display(),
        run_config.iterations
    );

    let tasks = generate_benchmark_tasks(&run_config)?;
    if matches.get_flag("list") {
        for task in &tasks {
            println!("{}", task.name());
        }
        return Ok(());
    }

    let report = run_tasks(&tasks, toolchain);
    for name in &report.succeeded {
        println!("ok     {}", name);
    }
    for (name, error) in &report.failed {
        println!("FAILED {}: {}", name, error);
    }
    if report.all_succeeded() {
        Ok(())
    } else {
        Err(anyhow!(
            "{} of {} tasks failed: {}",
            report.failed.len(),
            tasks.len(),
            report.failed_names().join(", ")
        ))
    }
}
