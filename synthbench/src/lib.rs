// SPDX-License-Identifier: Apache-2.0

pub mod collect;
pub mod config;
pub mod mul_verify;
pub mod resource_counts;
pub mod runner;
pub mod stat_report;
pub mod summary;
pub mod synthbench_error;
pub mod tasks;
pub mod toolchain;
pub mod vivado;
pub mod yosys;

pub use collect::{annotate_summary, collect_summaries_to_csv, RunAnnotation};
pub use config::{BenchManifest, BenchmarkEntry, RunConfig, RunOverrides};
pub use mul_verify::{
    mul_verify_program, run_mul_verify_sweep, write_sweep_csv, SolverBackend, SweepConfig,
    SweepPoint, SweepRecord,
};
pub use resource_counts::{count_resources_in_file, extract_resource_counts, HdlDialect};
pub use runner::{
    run_with_retries, run_with_timeout, TimedRun, ToToolCommand, ToolCommand, ToolRun,
};
pub use stat_report::{parse_stat_report, ResourceCounts};
pub use summary::{
    assemble_summary, extra_fields, insert_extra_field, write_summary_json, ExtraFields, Summary,
    SummaryValue,
};
pub use synthbench_error::SynthbenchError;
pub use tasks::{generate_benchmark_tasks, run_tasks, BenchTask, TaskReport};
pub use toolchain::ToolchainConfig;
pub use vivado::{run_vivado_synthesis, ClockConstraint, VivadoSynthesisConfig};
pub use yosys::{run_yosys_synthesis, SynthRecipe, YosysSynthesisConfig};
