// SPDX-License-Identifier: Apache-2.0

//! Stand-ins for yosys, vivado and racket so the harness can be tested on
//! machines without the real toolchains.
//!
//! Every fake is a small `/bin/sh` script written into a test directory.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Creates a unique temporary directory for tests under the system temp dir,
/// using the provided base prefix combined with the process id and a nanosecond
/// timestamp.
///
/// The directory is cleaned up automatically when the returned `TempDir` is
/// dropped.
pub fn make_test_tmpdir(base_prefix: &str) -> tempfile::TempDir {
    let pid = std::process::id();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let prefix = format!("{}_{}_{}", base_prefix, pid, nanos);
    tempfile::Builder::new()
        .prefix(&prefix)
        .tempdir_in(std::env::temp_dir())
        .expect("tempdir create")
}

/// Writes `body` to `dir/name` and marks it executable.
pub fn write_executable(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write fake tool");
    let mut perms = std::fs::metadata(&path).expect("stat fake tool").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod fake tool");
    log::info!("write_executable; wrote {}", path.display());
    path
}

/// A fake tool that appends a line to a counter file on every launch.
#[derive(Debug, Clone)]
pub struct FakeTool {
    pub path: PathBuf,
    launch_file: PathBuf,
}

impl FakeTool {
    /// Number of times the tool has been started.
    pub fn launches(&self) -> usize {
        std::fs::read_to_string(&self.launch_file)
            .map(|text| text.lines().count())
            .unwrap_or(0)
    }
}

fn launch_prelude(launch_file: &Path) -> String {
    format!(
        "echo launch >> '{f}'\nn=$(wc -l < '{f}')\n",
        f = launch_file.display()
    )
}

/// A tool that exits with `exit_code` on its first `failures` launches,
/// sleeping `fail_sleep_s` seconds before each failure, and succeeds after.
pub fn fake_flaky_tool(
    dir: &Path,
    name: &str,
    failures: u32,
    exit_code: i32,
    fail_sleep_s: u32,
) -> FakeTool {
    let launch_file = dir.join(format!("{}.launches", name));
    let body = format!(
        r#"#!/bin/sh
{prelude}if [ "$n" -le {failures} ]; then
  sleep {sleep}
  echo "attempt $n failing" >&2
  exit {code}
fi
echo "attempt $n ok"
"#,
        prelude = launch_prelude(&launch_file),
        failures = failures,
        sleep = fail_sleep_s,
        code = exit_code,
    );
    FakeTool {
        path: write_executable(dir, name, &body),
        launch_file,
    }
}

/// A stat report for a small design with two cell types.
pub const SMALL_STAT_REPORT: &str = "
=== top ===

   Number of wires:                  4
   Number of cells:                  3
     DFF                             2
     LUT4                            1

End of script.
";

/// A fake yosys. Any `write_verilog <path>` in the `-p` script produces a
/// placeholder netlist at that path, and every run prints `stat_report`.
pub fn fake_yosys(dir: &Path, stat_report: &str) -> FakeTool {
    let report_file = dir.join("fake_yosys_stat.txt");
    std::fs::write(&report_file, stat_report).expect("write stat report");
    let launch_file = dir.join("yosys.launches");
    let body = format!(
        r#"#!/bin/sh
{prelude}for arg in "$@"; do script="$arg"; done
out=$(printf '%s' "$script" | sed -n 's/.*write_verilog \([^;]*\).*/\1/p')
if [ -n "$out" ]; then
  echo 'module top(); endmodule' > "$out"
fi
cat '{report}'
"#,
        prelude = launch_prelude(&launch_file),
        report = report_file.display(),
    );
    FakeTool {
        path: write_executable(dir, "yosys", &body),
        launch_file,
    }
}

/// A fake vivado that fails its first `failures` launches, then writes the
/// netlist named by `set output_netlist` in the `-source` script. The
/// `LD_PRELOAD` it saw is recorded in `dir/vivado.ld_preload`.
pub fn fake_vivado(dir: &Path, failures: u32) -> FakeTool {
    let launch_file = dir.join("vivado.launches");
    let body = format!(
        r#"#!/bin/sh
{prelude}echo "$LD_PRELOAD" > '{preload}'
if [ "$n" -le {failures} ]; then
  echo 'ERROR: [Common 17-39] segfault' >&2
  exit 1
fi
tcl=''
while [ $# -gt 0 ]; do
  if [ "$1" = '-source' ]; then tcl="$2"; fi
  shift
done
out=$(sed -n 's/^set output_netlist //p' "$tcl")
echo 'module top(); endmodule' > "$out"
echo 'route_design completed successfully'
"#,
        prelude = launch_prelude(&launch_file),
        preload = dir.join("vivado.ld_preload").display(),
        failures = failures,
    );
    FakeTool {
        path: write_executable(dir, "vivado", &body),
        launch_file,
    }
}

/// An interpreter that never finishes on its own.
pub fn fake_sleeping_interpreter(dir: &Path, name: &str) -> FakeTool {
    let launch_file = dir.join(format!("{}.launches", name));
    let body = format!(
        "#!/bin/sh\n{prelude}sleep 600\n",
        prelude = launch_prelude(&launch_file)
    );
    FakeTool {
        path: write_executable(dir, name, &body),
        launch_file,
    }
}
