// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Errors surfaced by the benchmarking harness.
///
/// `Parse`, `ProcessFailure` and `SummaryFieldCollision` are fatal to the task
/// that produced them; the task layer records them and moves on to the next
/// independent task.
#[derive(Debug)]
pub enum SynthbenchError {
    /// The tool output did not contain exactly one well-formed cell-count
    /// block.
    Parse(String),
    /// An external tool exited unsuccessfully on its final attempt.
    ProcessFailure {
        tool: String,
        /// `None` when the process was terminated by a signal.
        exit_code: Option<i32>,
        log_path: Option<PathBuf>,
    },
    /// A summary field would shadow a resource count or reserved key.
    SummaryFieldCollision { field: String },
    InvalidArgument(String),
    /// Malformed toolchain config, manifest, or environment override.
    Config(String),
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl SynthbenchError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SynthbenchError::Io {
            context: context.into(),
            source,
        }
    }

    /// Exit code carried by a `ProcessFailure`, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            SynthbenchError::ProcessFailure { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

impl std::fmt::Display for SynthbenchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SynthbenchError::Parse(msg) => write!(f, "parse error: {}", msg),
            SynthbenchError::ProcessFailure {
                tool,
                exit_code,
                log_path,
            } => {
                match exit_code {
                    Some(code) => write!(f, "{} failed with exit code {}", tool, code)?,
                    None => write!(f, "{} was terminated by a signal", tool)?,
                }
                if let Some(log_path) = log_path {
                    write!(f, "; see log at {}", log_path.display())?;
                }
                Ok(())
            }
            SynthbenchError::SummaryFieldCollision { field } => {
                write!(f, "summary field collision on key `{}`", field)
            }
            SynthbenchError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            SynthbenchError::Config(msg) => write!(f, "configuration error: {}", msg),
            SynthbenchError::Io { context, source } => write!(f, "{}: {}", context, source),
        }
    }
}

impl std::error::Error for SynthbenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SynthbenchError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SynthbenchError>;
