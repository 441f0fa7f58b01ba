// SPDX-License-Identifier: Apache-2.0

//! Command line driver for the synthesis benchmarking harness.
//!
//! Commands are given like:
//!
//! ```text
//! synthbench-driver <global-options> <command> <command-args-and-options>
//! ```
//!
//! Sample usage:
//!
//! ```shell
//! $ cargo run -- --toolchain=$HOME/synthbench-toolchain.toml \
//!     yosys-synth bench/mul8.sv --top=mul8 --output_dir=out/mul8/yosys \
//!     --recipe=xilinx --family=xcup --extra tool=yosys
//! $ cargo run -- run-benchmarks --manifest=manifest.toml --iterations=3
//! $ cargo run -- mul-verify-sweep --timeout_s=60 --solvers=default,bitwuzla
//! ```
//!
//! Tool locations come from `--toolchain`, else from a
//! `synthbench-toolchain.toml` in the working directory, else from `PATH`.

mod collate;
mod common;
mod report_cli_error;
mod run_benchmarks;
mod stats;
mod sweep;
mod synth;

use std::path::PathBuf;

use clap::{Arg, ArgAction};
use report_cli_error::{report_cli_error_and_exit, report_handler_error_and_exit};
use synthbench::toolchain::TOOLCHAIN_FILENAME;
use synthbench::ToolchainConfig;

trait AppExt {
    fn add_input_and_top_args(self) -> Self;
    fn add_synth_run_args(self) -> Self;
}

impl AppExt for clap::Command {
    fn add_input_and_top_args(self) -> Self {
        (self as clap::Command)
            .arg(
                Arg::new("input")
                    .value_name("INPUT_FILE")
                    .help("The HDL source to process")
                    .required(true)
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("top")
                    .long("top")
                    .value_name("TOP_MODULE")
                    .help("The top-level module")
                    .required(true)
                    .action(ArgAction::Set),
            )
    }

    fn add_synth_run_args(self) -> Self {
        (self as clap::Command)
            .arg(
                Arg::new("output_dir")
                    .long("output_dir")
                    .value_name("OUTPUT_DIR")
                    .help("Directory for the netlist, log, and summary")
                    .required(true)
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("attempts")
                    .long("attempts")
                    .value_name("ATTEMPTS")
                    .help("Number of times to launch the tool before giving up")
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("extra")
                    .long("extra")
                    .value_name("KEY=VALUE")
                    .help("Extra field to record in the summary; may be repeated")
                    .action(ArgAction::Append),
            )
    }
}

/// Loads the toolchain file named by `--toolchain`, falling back to one in
/// the working directory.
fn load_toolchain(matches: &clap::ArgMatches) -> ToolchainConfig {
    let mut toml_path: Option<PathBuf> = matches.get_one::<String>("toolchain").map(PathBuf::from);

    if toml_path.is_none() {
        if let Ok(cwd) = std::env::current_dir() {
            let cwd_toml_path = cwd.join(TOOLCHAIN_FILENAME);
            if cwd_toml_path.exists() {
                log::info!(
                    "Using {} in current directory: {}",
                    TOOLCHAIN_FILENAME,
                    cwd_toml_path.display()
                );
                toml_path = Some(cwd_toml_path);
            }
        }
    }

    let Some(path) = toml_path else {
        return ToolchainConfig::default();
    };
    if !path.exists() {
        let working_dir = std::env::current_dir()
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        report_cli_error_and_exit(
            "toolchain toml file does not exist",
            None,
            vec![
                ("path", &path.display().to_string()),
                ("working directory", &working_dir),
            ],
        );
    }
    match ToolchainConfig::load(&path) {
        Ok(config) => config,
        Err(e) => report_cli_error_and_exit(
            &e.to_string(),
            None,
            vec![("path", &path.display().to_string())],
        ),
    }
}

fn main() {
    let _ = env_logger::try_init();

    log::info!(
        "synthbench-driver starting; version: {}",
        env!("CARGO_PKG_VERSION")
    );

    let matches = clap::Command::new("synthbench-driver")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs FPGA synthesis benchmarks through external EDA tools")
        .arg(
            Arg::new("toolchain")
                .long("toolchain")
                .value_name("TOOLCHAIN")
                .help("Path to a synthbench-toolchain.toml file")
                .action(ArgAction::Set),
        )
        .subcommand(clap::Command::new("version").about("Prints the version of the driver"))
        .subcommand(
            clap::Command::new("parse-stat")
                .about("Parses the cell counts out of a yosys stat report")
                .arg(
                    Arg::new("log")
                        .value_name("STAT_LOG")
                        .help("File holding yosys `stat` output")
                        .required(true)
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            clap::Command::new("count-resources")
                .about("Counts the cells of a design with yosys")
                .add_input_and_top_args()
                .arg(
                    Arg::new("dialect")
                        .long("dialect")
                        .value_name("DIALECT")
                        .help("How to read the input")
                        .value_parser(["verilog", "system-verilog"])
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            clap::Command::new("yosys-synth")
                .about("Synthesizes a design with yosys and writes its summary")
                .add_input_and_top_args()
                .add_synth_run_args()
                .arg(
                    Arg::new("recipe")
                        .long("recipe")
                        .value_name("RECIPE")
                        .help("Synthesis pass to run")
                        .value_parser(["lattice-ecp5", "xilinx"])
                        .default_value("xilinx")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("family")
                        .long("family")
                        .value_name("FAMILY")
                        .help("Xilinx family for synth_xilinx, e.g. xc7 or xcup")
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            clap::Command::new("vivado-synth")
                .about("Synthesizes, places, and routes a design with Vivado")
                .add_input_and_top_args()
                .add_synth_run_args()
                .arg(
                    Arg::new("part")
                        .long("part")
                        .value_name("PART")
                        .help("Target part, e.g. xczu3eg-sbva484-1-e")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .value_name("MODE")
                        .help("Directive preset")
                        .value_parser(["optimized", "runtime-optimized"])
                        .default_value("optimized")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("synth_options")
                        .long("synth_options")
                        .value_name("FLAGS")
                        .help("Extra flags for synth_design")
                        .allow_hyphen_values(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("clock")
                        .long("clock")
                        .value_name("NAME:PERIOD_NS[:RISE:FALL]")
                        .help("Clock to constrain")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("max_threads")
                        .long("max_threads")
                        .value_name("N")
                        .help("Value for general.maxThreads")
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            clap::Command::new("mul-verify-sweep")
                .about("Times Rosette verification of a split multiply across bitwidths")
                .arg(
                    Arg::new("timeout_s")
                        .long("timeout_s")
                        .value_name("SECONDS")
                        .help("Per-point timeout; defaults to the manifest's value")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("manifest")
                        .long("manifest")
                        .value_name("MANIFEST")
                        .help("Manifest to read the timeout from")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("bitwidths")
                        .long("bitwidths")
                        .value_name("COMMA_SEPARATED")
                        .help("Even bitwidths to sweep (default 2,4,...,16)")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("solvers")
                        .long("solvers")
                        .value_name("COMMA_SEPARATED")
                        .help("Solver backends; `default` is Rosette's default solver")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("output_csv")
                        .long("output_csv")
                        .value_name("CSV")
                        .help("Write records here instead of stdout")
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            clap::Command::new("collect")
                .about("Merges summary JSON files into one CSV")
                .arg(
                    Arg::new("output_csv")
                        .value_name("OUTPUT_CSV")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("summaries")
                        .value_name("SUMMARY_JSON")
                        .num_args(0..)
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(
            clap::Command::new("annotate-summary")
                .about("Adds run identification fields to a summary")
                .arg(Arg::new("input").value_name("INPUT_JSON").required(true))
                .arg(Arg::new("output").value_name("OUTPUT_JSON").required(true))
                .arg(
                    Arg::new("iteration")
                        .long("iteration")
                        .value_name("N")
                        .required(true),
                )
                .arg(
                    Arg::new("identifier")
                        .long("identifier")
                        .value_name("ID")
                        .required(true),
                )
                .arg(
                    Arg::new("architecture")
                        .long("architecture")
                        .value_name("ARCH")
                        .required(true),
                )
                .arg(
                    Arg::new("tool")
                        .long("tool")
                        .value_name("TOOL")
                        .required(true),
                ),
        )
        .subcommand(
            clap::Command::new("run-benchmarks")
                .about("Runs every benchmark in a manifest and collects the results")
                .arg(
                    Arg::new("manifest")
                        .long("manifest")
                        .value_name("MANIFEST")
                        .help("Benchmark manifest (default manifest.toml)")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("output_dir")
                        .long("output_dir")
                        .value_name("OUTPUT_DIR")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("iterations")
                        .long("iterations")
                        .value_name("N")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("list")
                        .long("list")
                        .help("Print the task names without running them")
                        .action(ArgAction::SetTrue),
                ),
        )
        .get_matches();

    let toolchain = load_toolchain(&matches);

    let (subcommand, result) = if let Some(matches) = matches.subcommand_matches("parse-stat") {
        ("parse-stat", stats::handle_parse_stat(matches))
    } else if let Some(matches) = matches.subcommand_matches("count-resources") {
        (
            "count-resources",
            stats::handle_count_resources(matches, &toolchain),
        )
    } else if let Some(matches) = matches.subcommand_matches("yosys-synth") {
        ("yosys-synth", synth::handle_yosys_synth(matches, &toolchain))
    } else if let Some(matches) = matches.subcommand_matches("vivado-synth") {
        ("vivado-synth", synth::handle_vivado_synth(matches, &toolchain))
    } else if let Some(matches) = matches.subcommand_matches("mul-verify-sweep") {
        (
            "mul-verify-sweep",
            sweep::handle_mul_verify_sweep(matches, &toolchain),
        )
    } else if let Some(matches) = matches.subcommand_matches("collect") {
        ("collect", collate::handle_collect(matches))
    } else if let Some(matches) = matches.subcommand_matches("annotate-summary") {
        ("annotate-summary", collate::handle_annotate_summary(matches))
    } else if let Some(matches) = matches.subcommand_matches("run-benchmarks") {
        (
            "run-benchmarks",
            run_benchmarks::handle_run_benchmarks(matches, &toolchain),
        )
    } else if let Some(_matches) = matches.subcommand_matches("version") {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return;
    } else {
        report_cli_error_and_exit("No valid subcommand provided.", None, vec![]);
    };

    if let Err(e) = result {
        report_handler_error_and_exit(subcommand, &e);
    }
}
