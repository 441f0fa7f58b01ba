// SPDX-License-Identifier: Apache-2.0

//! Launching external tools: a retrying runner for flaky synthesis tools and
//! a timeout-bounded runner for the solver experiment.

use std::fs::File;
use std::io;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::synthbench_error::{Result, SynthbenchError};

const TIMEOUT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A fully materialized external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Short tool name used in logs and errors, e.g. `vivado`.
    pub tool: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Variables set on top of the inherited environment.
    pub env: Vec<(String, String)>,
    pub working_dir: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(tool: &str, program: impl Into<PathBuf>) -> Self {
        ToolCommand {
            tool: tool.to_string(),
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.env.push((key.to_string(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command
    }

    /// Human-readable command line for logs.
    pub fn cmdline(&self) -> String {
        let program = self.program.display().to_string();
        if self.args.is_empty() {
            program
        } else {
            format!("{} {}", program, self.args.join(" "))
        }
    }
}

/// Types that describe a tool invocation and can produce its command line.
pub trait ToToolCommand {
    fn to_tool_command(&self, toolchain: &crate::ToolchainConfig) -> Result<ToolCommand>;
}

/// Result of a successful [`run_with_retries`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolRun {
    /// Wall-clock time of the final (successful) attempt only.
    pub elapsed: Duration,
    pub attempts_made: u32,
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|e| {
                SynthbenchError::io(format!("failed to create {}", parent.display()), e)
            }),
        _ => Ok(()),
    }
}

/// Runs `command` once with stdout and stderr both written to a freshly
/// truncated `log_path`.
fn run_logged_once(command: &ToolCommand, log_path: &Path) -> Result<(ExitStatus, Duration)> {
    let log_context = || format!("failed to open log file {}", log_path.display());
    let logfile = File::create(log_path).map_err(|e| SynthbenchError::io(log_context(), e))?;
    let stderr_file = logfile
        .try_clone()
        .map_err(|e| SynthbenchError::io(log_context(), e))?;

    let mut cmd = command.to_command();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(logfile))
        .stderr(Stdio::from(stderr_file));

    log::info!("Running {}: {}", command.tool, command.cmdline());
    let start = Instant::now();
    let status = cmd
        .status()
        .map_err(|e| SynthbenchError::io(format!("failed to spawn {}", command.tool), e))?;
    Ok((status, start.elapsed()))
}

/// Runs `command`, re-running it from scratch on a non-zero exit until it
/// succeeds or `attempts` launches have been made.
///
/// The log at `log_path` holds the output of the most recent attempt. Spawn
/// failures are returned immediately without retrying.
pub fn run_with_retries(command: &ToolCommand, log_path: &Path, attempts: u32) -> Result<ToolRun> {
    if attempts == 0 {
        return Err(SynthbenchError::InvalidArgument(format!(
            "{} attempts must be at least 1",
            command.tool
        )));
    }
    ensure_parent_dir(log_path)?;

    let mut attempts_made = 0;
    loop {
        let (status, elapsed) = run_logged_once(command, log_path)?;
        attempts_made += 1;
        if status.success() {
            log::info!(
                "{} succeeded on attempt {} in {:.2}s",
                command.tool,
                attempts_made,
                elapsed.as_secs_f64()
            );
            return Ok(ToolRun {
                elapsed,
                attempts_made,
            });
        }
        let attempts_remaining = attempts - attempts_made;
        log::error!(
            "{} failed with status {}. Attempts remaining: {}.{}",
            command.tool,
            status,
            attempts_remaining,
            if attempts_remaining > 0 {
                " Trying again..."
            } else {
                ""
            }
        );
        if attempts_remaining == 0 {
            log::error!("Error log in {}", log_path.display());
            return Err(SynthbenchError::ProcessFailure {
                tool: command.tool.clone(),
                exit_code: status.code(),
                log_path: Some(log_path.to_path_buf()),
            });
        }
    }
}

/// Result of [`run_with_timeout`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedRun {
    /// Elapsed wall-clock time; equal to the timeout bound when `timed_out`.
    pub elapsed: Duration,
    pub timed_out: bool,
    /// `None` when timed out or terminated by a signal.
    pub exit_code: Option<i32>,
}

/// Asks the child's process group to terminate. Does not wait for it and does
/// not escalate to SIGKILL.
fn request_termination(child: &Child) {
    let pid = child.id() as libc::pid_t;
    let rc = unsafe { libc::kill(-pid, libc::SIGTERM) };
    if rc != 0 {
        log::warn!(
            "failed to send SIGTERM to process group {}: {}",
            pid,
            io::Error::last_os_error()
        );
    }
}

/// Runs `command` with output discarded, waiting at most `timeout`.
///
/// The child leads its own process group so that helper processes it spawns
/// (e.g. solver binaries) receive the termination request too.
pub fn run_with_timeout(command: &ToolCommand, timeout: Duration) -> Result<TimedRun> {
    let mut cmd = command.to_command();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    unsafe {
        cmd.pre_exec(|| {
            if libc::setpgid(0, 0) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }

    log::info!(
        "Running {} with timeout {:.3}s: {}",
        command.tool,
        timeout.as_secs_f64(),
        command.cmdline()
    );
    let start = Instant::now();
    let mut child = cmd
        .spawn()
        .map_err(|e| SynthbenchError::io(format!("failed to spawn {}", command.tool), e))?;

    loop {
        let polled = child
            .try_wait()
            .map_err(|e| SynthbenchError::io(format!("failed to poll {}", command.tool), e))?;
        if let Some(status) = polled {
            return Ok(TimedRun {
                elapsed: start.elapsed(),
                timed_out: false,
                exit_code: status.code(),
            });
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            log::warn!(
                "{} timed out after {:.3}s; requesting termination",
                command.tool,
                timeout.as_secs_f64()
            );
            request_termination(&child);
            // Reap off-thread so the caller never blocks on a slow shutdown.
            std::thread::spawn(move || {
                let _ = child.wait();
            });
            return Ok(TimedRun {
                elapsed: timeout,
                timed_out: true,
                exit_code: None,
            });
        }
        std::thread::sleep(TIMEOUT_POLL_INTERVAL.min(timeout - elapsed));
    }
}
