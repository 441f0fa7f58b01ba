// SPDX-License-Identifier: Apache-2.0

//! `parse-stat` and `count-resources`: resource counts as JSON on stdout.

use std::path::Path;

use anyhow::Context;
use clap::ArgMatches;
use synthbench::{
    count_resources_in_file, parse_stat_report, HdlDialect, ResourceCounts, ToolchainConfig,
};

fn print_counts(counts: &ResourceCounts) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(counts)?);
    Ok(())
}

pub fn handle_parse_stat(matches: &ArgMatches) -> anyhow::Result<()> {
    let log_path = Path::new(matches.get_one::<String>("log").unwrap());
    let text = std::fs::read_to_string(log_path)
        .with_context(|| format!("reading {}", log_path.display()))?;
    let counts =
        parse_stat_report(&text).with_context(|| format!("parsing {}", log_path.display()))?;
    print_counts(&counts)
}

pub fn handle_count_resources(
    matches: &ArgMatches,
    toolchain: &ToolchainConfig,
) -> anyhow::Result<()> {
    let input = Path::new(matches.get_one::<String>("input").unwrap());
    let top = matches.get_one::<String>("top").unwrap();
    let dialect = matches
        .get_one::<String>("dialect")
        .map(|s| s.parse::<HdlDialect>())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or_default();
    let counts = count_resources_in_file(toolchain, input, top, dialect)
        .with_context(|| format!("counting resources in {}", input.display()))?;
    print_counts(&counts)
}
