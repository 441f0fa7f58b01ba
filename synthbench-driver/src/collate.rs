// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::ArgMatches;
use synthbench::{annotate_summary, collect_summaries_to_csv, RunAnnotation};

use crate::common::parse_u32_flag;

pub fn handle_collect(matches: &ArgMatches) -> anyhow::Result<()> {
    let output_csv = Path::new(matches.get_one::<String>("output_csv").unwrap());
    let summaries: Vec<PathBuf> = matches
        .get_many::<String>("summaries")
        .into_iter()
        .flatten()
        .map(PathBuf::from)
        .collect();
    let rows = collect_summaries_to_csv(&summaries, output_csv)
        .with_context(|| format!("collecting into {}", output_csv.display()))?;
    println!("{} rows written to {}", rows, output_csv.display());
    Ok(())
}

pub fn handle_annotate_summary(matches: &ArgMatches) -> anyhow::Result<()> {
    let json_in = Path::new(matches.get_one::<String>("input").unwrap());
    let json_out = Path::new(matches.get_one::<String>("output").unwrap());
    let annotation = RunAnnotation {
        iteration: parse_u32_flag(matches, "iteration")?.unwrap_or(0),
        identifier: matches.get_one::<String>("identifier").unwrap().clone(),
        architecture: matches.get_one::<String>("architecture").unwrap().clone(),
        tool: matches.get_one::<String>("tool").unwrap().clone(),
    };
    annotate_summary(json_in, json_out, &annotation)
        .with_context(|| format!("annotating {}", json_in.display()))?;
    Ok(())
}
