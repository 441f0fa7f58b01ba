// SPDX-License-Identifier: Apache-2.0

//! Locations of the external tools the harness shells out to.
//!
//! The configuration is normally read from a `synthbench-toolchain.toml` file
//! with a single `[toolchain]` table:
//!
//! ```toml
//! [toolchain]
//! yosys_path = "/opt/yosys/bin/yosys"
//! vivado_path = "/tools/Xilinx/Vivado/2023.1/bin/vivado"
//! racket_path = "/usr/bin/racket"
//! ```
//!
//! Every entry is optional; unset tools are looked up on `PATH`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::synthbench_error::{Result, SynthbenchError};

/// Library preloaded into Vivado so that `route_design` does not crash inside
/// containers that lack a udev daemon.
pub const DEFAULT_VIVADO_LD_PRELOAD: &str = "/lib/x86_64-linux-gnu/libudev.so.1";

pub const TOOLCHAIN_FILENAME: &str = "synthbench-toolchain.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Path to the `yosys` executable.
    pub yosys_path: Option<PathBuf>,

    /// Path to the `vivado` executable.
    pub vivado_path: Option<PathBuf>,

    /// Path to the `racket` interpreter used by the solver experiment.
    pub racket_path: Option<PathBuf>,

    /// Value prepended to `LD_PRELOAD` when launching Vivado. Set to an empty
    /// string to leave the inherited `LD_PRELOAD` untouched.
    pub vivado_ld_preload: Option<String>,
}

#[derive(Deserialize)]
struct SynthbenchToolchain {
    toolchain: ToolchainConfig,
}

impl ToolchainConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let parsed: SynthbenchToolchain = toml::from_str(text)
            .map_err(|e| SynthbenchError::Config(format!("invalid toolchain toml: {}", e)))?;
        Ok(parsed.toolchain)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SynthbenchError::io(
                format!("failed to read toolchain file {}", path.display()),
                e,
            )
        })?;
        Self::from_toml_str(&text)
    }

    pub fn yosys(&self) -> Result<PathBuf> {
        resolve_tool("yosys", self.yosys_path.as_deref())
    }

    pub fn vivado(&self) -> Result<PathBuf> {
        resolve_tool("vivado", self.vivado_path.as_deref())
    }

    pub fn racket(&self) -> Result<PathBuf> {
        resolve_tool("racket", self.racket_path.as_deref())
    }

    pub fn vivado_ld_preload(&self) -> &str {
        self.vivado_ld_preload
            .as_deref()
            .unwrap_or(DEFAULT_VIVADO_LD_PRELOAD)
    }
}

/// Returns the configured path for `name` if it exists, otherwise searches
/// `PATH`.
fn resolve_tool(name: &str, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if !path.exists() {
            return Err(SynthbenchError::Config(format!(
                "{} not found at configured path {}",
                name,
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }
    which::which(name).map_err(|e| {
        SynthbenchError::Config(format!(
            "{} not found on PATH ({}); set `{}_path` in {}",
            name, e, name, TOOLCHAIN_FILENAME
        ))
    })
}
