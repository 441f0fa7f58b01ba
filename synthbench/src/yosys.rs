// SPDX-License-Identifier: Apache-2.0

//! Synthesis with Yosys for Lattice and Xilinx targets.

use std::path::{Path, PathBuf};

use crate::resource_counts::{count_resources_in_file, HdlDialect};
use crate::runner::{ensure_parent_dir, run_with_retries, ToToolCommand, ToolCommand};
use crate::summary::{write_run_summary, ExtraFields, Summary};
use crate::synthbench_error::Result;
use crate::toolchain::ToolchainConfig;

/// Which yosys synthesis pass to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthRecipe {
    LatticeEcp5,
    Xilinx { family: String },
}

impl SynthRecipe {
    pub fn synth_command(&self) -> String {
        match self {
            SynthRecipe::LatticeEcp5 => "synth_ecp5".to_string(),
            SynthRecipe::Xilinx { family } => format!("synth_xilinx -family {}", family),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YosysSynthesisConfig {
    pub input_file: PathBuf,
    pub module_name: String,
    pub output_netlist: PathBuf,
    pub log_file: PathBuf,
    pub summary_file: PathBuf,
    pub recipe: SynthRecipe,
    pub attempts: u32,
    pub extra_summary_fields: ExtraFields,
}

impl YosysSynthesisConfig {
    fn in_dir(
        input_file: &Path,
        output_dir: &Path,
        module_name: &str,
        recipe: SynthRecipe,
    ) -> Self {
        YosysSynthesisConfig {
            input_file: input_file.to_path_buf(),
            module_name: module_name.to_string(),
            output_netlist: output_dir.join(format!("{}.sv", module_name)),
            log_file: output_dir.join(format!("{}.log", module_name)),
            summary_file: output_dir.join(format!("{}.json", module_name)),
            recipe,
            attempts: 1,
            extra_summary_fields: ExtraFields::new(),
        }
    }

    pub fn lattice_ecp5(input_file: &Path, output_dir: &Path, module_name: &str) -> Self {
        Self::in_dir(input_file, output_dir, module_name, SynthRecipe::LatticeEcp5)
    }

    pub fn xilinx(input_file: &Path, output_dir: &Path, module_name: &str, family: &str) -> Self {
        Self::in_dir(
            input_file,
            output_dir,
            module_name,
            SynthRecipe::Xilinx {
                family: family.to_string(),
            },
        )
    }

    /// The `-p` script: read, elaborate, synthesize, report, write.
    pub fn script(&self) -> String {
        [
            format!("read -sv {}", self.input_file.display()),
            format!("hierarchy -top {}", self.module_name),
            self.recipe.synth_command(),
            "stat".to_string(),
            format!("write_verilog {}", self.output_netlist.display()),
        ]
        .join("; ")
    }
}

impl ToToolCommand for YosysSynthesisConfig {
    fn to_tool_command(&self, toolchain: &ToolchainConfig) -> Result<ToolCommand> {
        Ok(ToolCommand::new("yosys", toolchain.yosys()?)
            .arg("-d")
            .arg("-p")
            .arg(self.script()))
    }
}

pub fn run_yosys_synthesis(
    config: &YosysSynthesisConfig,
    toolchain: &ToolchainConfig,
) -> Result<Summary> {
    ensure_parent_dir(&config.output_netlist)?;
    let command = config.to_tool_command(toolchain)?;
    log::info!("Running Yosys synthesis on {}", config.input_file.display());
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

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(SynthRecipe::LatticeEcp5, "synth_ecp5"; "lattice")]
    #[test_case(SynthRecipe::Xilinx { family: "xc7".to_string() }, "synth_xilinx -family xc7"; "xilinx")]
    fn test_synth_command(recipe: SynthRecipe, want: &str) {
        assert_eq!(recipe.synth_command(), want);
    }

    #[test]
    fn test_output_paths_are_named_after_module() {
        let c = YosysSynthesisConfig::lattice_ecp5(
            Path::new("bench/mul8.sv"),
            Path::new("out/mul8/yosys"),
            "mul8_top",
        );
        assert_eq!(c.output_netlist, Path::new("out/mul8/yosys/mul8_top.sv"));
        assert_eq!(c.log_file, Path::new("out/mul8/yosys/mul8_top.log"));
        assert_eq!(c.summary_file, Path::new("out/mul8/yosys/mul8_top.json"));
        assert_eq!(c.attempts, 1);
    }

    #[test]
    fn test_script() {
        let c = YosysSynthesisConfig::xilinx(
            Path::new("bench/mul8.sv"),
            Path::new("out"),
            "mul8",
            "xcup",
        );
        assert_eq!(
            c.script(),
            "read -sv bench/mul8.sv; hierarchy -top mul8; synth_xilinx -family xcup; stat; write_verilog out/mul8.sv"
        );
    }

    #[test]
    fn test_command_args() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("yosys");
        std::fs::write(&fake, "#!/bin/sh\n").unwrap();
        let toolchain = ToolchainConfig {
            yosys_path: Some(fake.clone()),
            ..Default::default()
        };
        let c = YosysSynthesisConfig::lattice_ecp5(Path::new("a.sv"), Path::new("o"), "a");
        let tc = c.to_tool_command(&toolchain).unwrap();
        assert_eq!(tc.program, fake);
        assert_eq!(tc.args[..2], ["-d".to_string(), "-p".to_string()]);
        assert_eq!(tc.args[2], c.script());
        assert!(tc.env.is_empty());
    }
}
