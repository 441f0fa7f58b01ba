// SPDX-License-Identifier: Apache-2.0

//! Turns a manifest into a flat list of synthesis and collection tasks and
//! runs them in order.

use std::path::PathBuf;

use crate::collect::collect_summaries_to_csv;
use crate::config::RunConfig;
use crate::summary::{insert_extra_field, SummaryValue};
use crate::synthbench_error::{Result, SynthbenchError};
use crate::toolchain::ToolchainConfig;
use crate::vivado::{run_vivado_synthesis, VivadoSynthesisConfig};
use crate::yosys::{run_yosys_synthesis, YosysSynthesisConfig};

pub const COLLECT_TASK_NAME: &str = "collect_data";

#[derive(Debug, Clone, PartialEq)]
pub enum BenchTask {
    Vivado {
        name: String,
        config: VivadoSynthesisConfig,
    },
    Yosys {
        name: String,
        config: YosysSynthesisConfig,
    },
    Collect {
        name: String,
        summary_paths: Vec<PathBuf>,
        output_csv: PathBuf,
    },
}

impl BenchTask {
    pub fn name(&self) -> &str {
        match self {
            BenchTask::Vivado { name, .. }
            | BenchTask::Yosys { name, .. }
            | BenchTask::Collect { name, .. } => name,
        }
    }

    pub fn run(&self, toolchain: &ToolchainConfig) -> Result<()> {
        match self {
            BenchTask::Vivado { config, .. } => run_vivado_synthesis(config, toolchain).map(|_| ()),
            BenchTask::Yosys { config, .. } => run_yosys_synthesis(config, toolchain).map(|_| ()),
            BenchTask::Collect {
                summary_paths,
                output_csv,
                ..
            } => collect_summaries_to_csv(summary_paths, output_csv).map(|_| ()),
        }
    }
}

/// One Vivado and one Yosys task per benchmark and iteration, followed by a
/// single collection task over every summary they produce.
///
/// A manifest feature that reuses a harness-owned field (`tool`, `name`,
/// `iteration`) is a `SummaryFieldCollision`.
pub fn generate_benchmark_tasks(run_config: &RunConfig) -> Result<Vec<BenchTask>> {
    let manifest = &run_config.manifest;
    let repeated = run_config.iterations > 1;
    let mut tasks = Vec::new();
    let mut summary_paths = Vec::new();

    for iteration in 0..run_config.iterations {
        let (iteration_dir, task_prefix) = if repeated {
            (
                run_config.output_dir.join(format!("iter{}", iteration)),
                format!("iter{}/", iteration),
            )
        } else {
            (run_config.output_dir.clone(), String::new())
        };

        for entry in &manifest.benchmarks {
            let name = entry.name();
            let input = run_config.benchmark_path(entry);
            let benchmark_dir = iteration_dir.join(&name);

            let mut vivado = VivadoSynthesisConfig::optimized(
                &input,
                &benchmark_dir.join("vivado"),
                &name,
                &manifest.vivado_part_name,
            );
            vivado.flags = entry.synth_options.clone().unwrap_or_default();
            vivado.attempts = manifest.vivado_num_attempts;
            let fields = &mut vivado.extra_summary_fields;
            insert_extra_field(fields, "tool", SummaryValue::from("vivado"))?;
            insert_extra_field(fields, "name", SummaryValue::from(name.as_str()))?;
            for (feature, value) in &entry.features {
                insert_extra_field(fields, feature.clone(), value.clone())?;
            }

            let mut yosys = YosysSynthesisConfig::xilinx(
                &input,
                &benchmark_dir.join("yosys"),
                &name,
                &manifest.yosys_family,
            );
            let fields = &mut yosys.extra_summary_fields;
            insert_extra_field(fields, "tool", SummaryValue::from("yosys"))?;
            insert_extra_field(fields, "name", SummaryValue::from(name.as_str()))?;

            if repeated {
                let value = SummaryValue::from(i64::from(iteration));
                insert_extra_field(&mut vivado.extra_summary_fields, "iteration", value.clone())?;
                insert_extra_field(&mut yosys.extra_summary_fields, "iteration", value)?;
            }

            summary_paths.push(vivado.summary_file.clone());
            tasks.push(BenchTask::Vivado {
                name: format!("{}{}:compile:vivado", task_prefix, name),
                config: vivado,
            });
            summary_paths.push(yosys.summary_file.clone());
            tasks.push(BenchTask::Yosys {
                name: format!("{}{}:compile:yosys", task_prefix, name),
                config: yosys,
            });
        }
    }

    tasks.push(BenchTask::Collect {
        name: COLLECT_TASK_NAME.to_string(),
        summary_paths,
        output_csv: run_config.output_csv_path(),
    });
    Ok(tasks)
}

/// Outcome of [`run_tasks`].
#[derive(Debug, Default)]
pub struct TaskReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, SynthbenchError)>,
}

impl TaskReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// Runs `tasks` in order. A failing task is recorded and does not stop the
/// tasks after it.
pub fn run_tasks(tasks: &[BenchTask], toolchain: &ToolchainConfig) -> TaskReport {
    let mut report = TaskReport::default();
    for (i, task) in tasks.iter().enumerate() {
        log::info!("[{}/{}] {}", i + 1, tasks.len(), task.name());
        match task.run(toolchain) {
            Ok(()) => report.succeeded.push(task.name().to_string()),
            Err(e) => {
                log::error!("Task {} failed: {}", task.name(), e);
                report.failed.push((task.name().to_string(), e));
            }
        }
    }
    report
}
