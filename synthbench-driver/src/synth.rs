// SPDX-License-Identifier: Apache-2.0

//! `yosys-synth` and `vivado-synth`: one synthesis run, summary JSON on
//! stdout.

use std::path::Path;

use anyhow::{anyhow, Context};
use clap::ArgMatches;
use synthbench::{
    run_vivado_synthesis, run_yosys_synthesis, ClockConstraint, Summary, ToolchainConfig,
    VivadoSynthesisConfig, YosysSynthesisConfig,
};

use crate::common::{extra_fields_from_matches, parse_u32_flag};

fn print_summary(summary: &Summary) -> anyhow::Result<()> {
    println!("{}", summary.to_json_string()?);
    Ok(())
}

pub fn handle_yosys_synth(matches: &ArgMatches, toolchain: &ToolchainConfig) -> anyhow::Result<()> {
    let input = Path::new(matches.get_one::<String>("input").unwrap());
    let top = matches.get_one::<String>("top").unwrap();
    let output_dir = Path::new(matches.get_one::<String>("output_dir").unwrap());
    let recipe = matches.get_one::<String>("recipe").unwrap();

    let mut config = match recipe.as_str() {
        "lattice-ecp5" => YosysSynthesisConfig::lattice_ecp5(input, output_dir, top),
        "xilinx" => {
            let family = matches
                .get_one::<String>("family")
                .ok_or_else(|| anyhow!("--family is required with --recipe=xilinx"))?;
            YosysSynthesisConfig::xilinx(input, output_dir, top, family)
        }
        other => return Err(anyhow!("unknown recipe: {}", other)),
    };
    if let Some(attempts) = parse_u32_flag(matches, "attempts")? {
        config.attempts = attempts;
    }
    config.extra_summary_fields = extra_fields_from_matches(matches)?;

    let summary = run_yosys_synthesis(&config, toolchain)
        .with_context(|| format!("yosys synthesis of {}", input.display()))?;
    print_summary(&summary)
}

pub fn handle_vivado_synth(
    matches: &ArgMatches,
    toolchain: &ToolchainConfig,
) -> anyhow::Result<()> {
    let input = Path::new(matches.get_one::<String>("input").unwrap());
    let top = matches.get_one::<String>("top").unwrap();
    let output_dir = Path::new(matches.get_one::<String>("output_dir").unwrap());
    let part = matches.get_one::<String>("part").unwrap();

    let mut config = match matches.get_one::<String>("mode").map(|s| s.as_str()) {
        Some("runtime-optimized") => {
            VivadoSynthesisConfig::runtime_optimized(input, output_dir, top, part)
        }
        _ => VivadoSynthesisConfig::optimized(input, output_dir, top, part),
    };
    if let Some(flags) = matches.get_one::<String>("synth_options") {
        config.flags = flags.clone();
    }
    if let Some(clock) = matches.get_one::<String>("clock") {
        config.clock = Some(ClockConstraint::parse(clock)?);
    }
    if let Some(attempts) = parse_u32_flag(matches, "attempts")? {
        config.attempts = attempts;
    }
    if let Some(threads) = parse_u32_flag(matches, "max_threads")? {
        config.max_threads = threads;
    }
    config.extra_summary_fields = extra_fields_from_matches(matches)?;

    let summary = run_vivado_synthesis(&config, toolchain)
        .with_context(|| format!("vivado synthesis of {}", input.display()))?;
    print_summary(&summary)
}
