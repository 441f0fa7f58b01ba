// SPDX-License-Identifier: Apache-2.0

//! Synthesis, placement and routing with Xilinx Vivado in batch mode.
//!
//! A run writes a TCL script and an XDC constraint file, launches Vivado with
//! retries (Vivado occasionally crashes for no reproducible reason), then
//! counts the cells in the routed netlist with yosys and writes the summary
//! JSON.

use std::path::{Path, PathBuf};

use crate::resource_counts::{count_resources_in_file, HdlDialect};
use crate::runner::{ensure_parent_dir, run_with_retries, ToToolCommand, ToolCommand};
use crate::summary::{write_run_summary, ExtraFields, Summary};
use crate::synthbench_error::{Result, SynthbenchError};
use crate::toolchain::ToolchainConfig;

pub const DEFAULT_DIRECTIVE: &str = "default";
pub const RUNTIME_OPTIMIZED_DIRECTIVE: &str = "RuntimeOptimized";

/// A clock to constrain, with its period and waveform edges in nanoseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockConstraint {
    pub name: String,
    pub period_ns: f64,
    pub rising_edge_ns: f64,
    pub falling_edge_ns: f64,
}

impl ClockConstraint {
    /// Parses `name:period[:rise:fall]`; the waveform defaults to a 50% duty
    /// cycle starting at 0.
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split(':').collect();
        let bad = || {
            SynthbenchError::InvalidArgument(format!(
                "clock must be name:period or name:period:rise:fall; got {:?}",
                text
            ))
        };
        let number = |s: &str| {
            s.parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .ok_or_else(bad)
        };
        let clock = match parts.as_slice() {
            [name, period] if !name.is_empty() => {
                let period_ns = number(period)?;
                ClockConstraint {
                    name: name.to_string(),
                    period_ns,
                    rising_edge_ns: 0.0,
                    falling_edge_ns: period_ns / 2.0,
                }
            }
            [name, period, rise, fall] if !name.is_empty() => ClockConstraint {
                name: name.to_string(),
                period_ns: number(period)?,
                rising_edge_ns: number(rise)?,
                falling_edge_ns: number(fall)?,
            },
            _ => return Err(bad()),
        };
        if clock.period_ns <= 0.0 {
            return Err(SynthbenchError::InvalidArgument(format!(
                "clock {} period must be positive; got {}",
                clock.name, clock.period_ns
            )));
        }
        Ok(clock)
    }
}

/// Everything needed for one Vivado run.
#[derive(Debug, Clone, PartialEq)]
pub struct VivadoSynthesisConfig {
    /// SystemVerilog source to synthesize.
    pub input_file: PathBuf,
    pub module_name: String,
    /// Netlist written after routing.
    pub output_netlist: PathBuf,
    /// Where the generated TCL script is written; the XDC file goes next to
    /// it with an `.xdc` extension.
    pub tcl_script: PathBuf,
    pub log_file: PathBuf,
    pub summary_file: PathBuf,
    pub part_name: String,

    /// `-directive` for `synth_design`.
    pub directive: String,
    /// Extra flags appended to `synth_design`.
    pub flags: String,
    pub synth_design: bool,
    pub opt_design: bool,
    /// Pass `-rtl` and the `-rtl_skip_*` flags to `synth_design`.
    pub synth_design_rtl_flags: bool,
    pub clock: Option<ClockConstraint>,
    pub place_directive: String,
    pub route_directive: String,
    pub max_threads: u32,
    /// Number of times to launch Vivado before giving up.
    pub attempts: u32,
    pub extra_summary_fields: ExtraFields,
}

impl VivadoSynthesisConfig {
    /// Full synthesis with `opt_design`, writing into `output_dir`:
    /// `<input file name>`, `<stem>.log`, `<stem>.tcl`, `<stem>_summary.json`.
    pub fn optimized(
        input_file: &Path,
        output_dir: &Path,
        module_name: &str,
        part_name: &str,
    ) -> Self {
        let stem = file_stem(input_file);
        VivadoSynthesisConfig {
            input_file: input_file.to_path_buf(),
            module_name: module_name.to_string(),
            output_netlist: output_dir.join(input_file.file_name().unwrap_or_default()),
            tcl_script: output_dir.join(format!("{}.tcl", stem)),
            log_file: output_dir.join(format!("{}.log", stem)),
            summary_file: output_dir.join(format!("{}_summary.json", stem)),
            part_name: part_name.to_string(),
            directive: DEFAULT_DIRECTIVE.to_string(),
            flags: String::new(),
            synth_design: true,
            opt_design: true,
            synth_design_rtl_flags: false,
            clock: None,
            place_directive: DEFAULT_DIRECTIVE.to_string(),
            route_directive: DEFAULT_DIRECTIVE.to_string(),
            max_threads: 1,
            attempts: 1,
            extra_summary_fields: ExtraFields::new(),
        }
    }

    /// Fast synthesis: `RuntimeOptimized` directives throughout and no
    /// `opt_design`. The summary is written to `<stem>.json`.
    pub fn runtime_optimized(
        input_file: &Path,
        output_dir: &Path,
        module_name: &str,
        part_name: &str,
    ) -> Self {
        let stem = file_stem(input_file);
        VivadoSynthesisConfig {
            summary_file: output_dir.join(format!("{}.json", stem)),
            directive: RUNTIME_OPTIMIZED_DIRECTIVE.to_string(),
            place_directive: RUNTIME_OPTIMIZED_DIRECTIVE.to_string(),
            route_directive: RUNTIME_OPTIMIZED_DIRECTIVE.to_string(),
            opt_design: false,
            ..Self::optimized(input_file, output_dir, module_name, part_name)
        }
    }

    pub fn xdc_file(&self) -> PathBuf {
        self.tcl_script.with_extension("xdc")
    }

    pub fn xdc_text(&self) -> String {
        match &self.clock {
            Some(clock) => format!(
                "create_clock -period {} -name {} -waveform {{{} {}}} [get_ports {}]\n",
                clock.period_ns,
                clock.name,
                clock.rising_edge_ns,
                clock.falling_edge_ns,
                clock.name
            ),
            None => "# No clock provided; not creating a clock.\n".to_string(),
        }
    }

    fn synth_design_command(&self) -> String {
        let mut command = format!(
            "synth_design -mode out_of_context -directive {}",
            self.directive
        );
        if !self.flags.trim().is_empty() {
            command.push(' ');
            command.push_str(self.flags.trim());
        }
        if self.synth_design_rtl_flags {
            command.push_str(" -rtl -rtl_skip_mlo -rtl_skip_ip -rtl_skip_constraints");
        }
        command
    }

    pub fn tcl_text(&self) -> String {
        let comment_unless = |enabled: bool, line: String| {
            if enabled {
                line
            } else {
                format!("# {}", line)
            }
        };
        format!(
            "set sv_source_file {input}
set modname {module}
set output_netlist {output}

set_part {part}
set_param general.maxThreads {threads}

read_verilog -sv ${{sv_source_file}}
set_property top ${{modname}} [current_fileset]
{synth}
read_xdc -mode out_of_context {xdc}
{opt}
place_design -directive {place}
route_design -directive {route}
write_verilog -force ${{output_netlist}}
report_timing_summary
report_utilization
",
            input = self.input_file.display(),
            module = self.module_name,
            output = self.output_netlist.display(),
            part = self.part_name,
            threads = self.max_threads,
            synth = comment_unless(self.synth_design, self.synth_design_command()),
            xdc = self.xdc_file().display(),
            opt = comment_unless(self.opt_design, "opt_design".to_string()),
            place = self.place_directive,
            route = self.route_directive,
        )
    }
}

impl ToToolCommand for VivadoSynthesisConfig {
    fn to_tool_command(&self, toolchain: &ToolchainConfig) -> Result<ToolCommand> {
        let mut command = ToolCommand::new("vivado", toolchain.vivado()?)
            .arg("-stack")
            .arg("2000")
            .arg("-mode")
            .arg("batch")
            .arg("-source")
            .arg(self.tcl_script.display().to_string());
        let preload = toolchain.vivado_ld_preload();
        if !preload.is_empty() {
            let inherited = std::env::var("LD_PRELOAD").unwrap_or_default();
            let value = if inherited.is_empty() {
                preload.to_string()
            } else {
                format!("{}:{}", preload, inherited)
            };
            command = command.env("LD_PRELOAD", value);
        }
        Ok(command)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    std::fs::write(path, text)
        .map_err(|e| SynthbenchError::io(format!("failed to write {}", path.display()), e))
}

/// Runs Vivado per `config` and writes the resulting summary JSON.
pub fn run_vivado_synthesis(
    config: &VivadoSynthesisConfig,
    toolchain: &ToolchainConfig,
) -> Result<Summary> {
    ensure_parent_dir(&config.output_netlist)?;
    write_text(&config.xdc_file(), &config.xdc_text())?;
    write_text(&config.tcl_script, &config.tcl_text())?;

    let command = config.to_tool_command(toolchain)?;
    log::info!(
        "Running Vivado synthesis/place/route on {}",
        config.input_file.display()
    );
    let run = run_with_retries(&command, &config.log_file, config.attempts)?;

    let counts = count_resources_in_file(
        toolchain,
        &config.output_netlist,
        &config.module_name,
        HdlDialect::Verilog,
    )?;
    write_run_summary(
        &counts,
        &run,
        &config.extra_summary_fields,
        &config.summary_file,
    )
}
