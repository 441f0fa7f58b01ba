// SPDX-License-Identifier: Apache-2.0

//! Counts the cells in a design by running it through yosys `stat`.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::runner::ToolCommand;
use crate::stat_report::{parse_stat_report, ResourceCounts};
use crate::synthbench_error::{Result, SynthbenchError};
use crate::toolchain::ToolchainConfig;

/// Source dialect the design is read as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HdlDialect {
    #[default]
    Verilog,
    SystemVerilog,
}

impl HdlDialect {
    fn read_command(self) -> &'static str {
        match self {
            HdlDialect::Verilog => "read_verilog",
            HdlDialect::SystemVerilog => "read_verilog -sv",
        }
    }

    fn file_suffix(self) -> &'static str {
        match self {
            HdlDialect::Verilog => ".v",
            HdlDialect::SystemVerilog => ".sv",
        }
    }
}

impl std::fmt::Display for HdlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HdlDialect::Verilog => "verilog",
            HdlDialect::SystemVerilog => "system-verilog",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for HdlDialect {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "verilog" => Ok(Self::Verilog),
            "system-verilog" | "sv" => Ok(Self::SystemVerilog),
            _ => Err(format!("invalid HDL dialect: {}", s)),
        }
    }
}

/// Yosys script that elaborates `top_module` from `source_path` and prints
/// statistics.
pub fn stat_script(source_path: &Path, top_module: &str, dialect: HdlDialect) -> String {
    format!(
        "{} {}; hierarchy -top {}; stat",
        dialect.read_command(),
        source_path.display(),
        top_module
    )
}

/// Writes `source_text` to a scratch file, runs yosys `stat` on it, and parses
/// the per-cell-type instance counts out of the report.
///
/// The scratch file is removed before returning.
pub fn extract_resource_counts(
    toolchain: &ToolchainConfig,
    source_text: &str,
    top_module: &str,
    dialect: HdlDialect,
) -> Result<ResourceCounts> {
    let mut scratch = tempfile::Builder::new()
        .prefix("synthbench_stat_")
        .suffix(dialect.file_suffix())
        .tempfile()
        .map_err(|e| SynthbenchError::io("failed to create scratch source file", e))?;
    scratch
        .write_all(source_text.as_bytes())
        .and_then(|_| scratch.flush())
        .map_err(|e| SynthbenchError::io("failed to write scratch source file", e))?;

    let command = ToolCommand::new("yosys", toolchain.yosys()?)
        .arg("-p")
        .arg(stat_script(scratch.path(), top_module, dialect));
    log::info!("Counting resources: {}", command.cmdline());
    let output = command
        .to_command()
        .output()
        .map_err(|e| SynthbenchError::io("failed to spawn yosys", e))?;

    if !output.status.success() {
        log::error!(
            "yosys stat failed with status {}\nstdout: {}\nstderr: {}",
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        return Err(SynthbenchError::ProcessFailure {
            tool: "yosys".to_string(),
            exit_code: output.status.code(),
            log_path: None,
        });
    }
    parse_stat_report(&String::from_utf8_lossy(&output.stdout))
}

/// Like [`extract_resource_counts`] for a netlist already on disk.
pub fn count_resources_in_file(
    toolchain: &ToolchainConfig,
    netlist_path: &Path,
    top_module: &str,
    dialect: HdlDialect,
) -> Result<ResourceCounts> {
    let text = std::fs::read_to_string(netlist_path).map_err(|e| {
        SynthbenchError::io(
            format!("failed to read netlist {}", netlist_path.display()),
            e,
        )
    })?;
    extract_resource_counts(toolchain, &text, top_module, dialect)
}
