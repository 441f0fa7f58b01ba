// SPDX-License-Identifier: Apache-2.0

//! Measures how long Rosette takes to verify a split multiplication identity
//! as the bitwidth grows, optionally across solver backends.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::runner::{ensure_parent_dir, run_with_timeout, ToolCommand};
use crate::synthbench_error::{Result, SynthbenchError};
use crate::toolchain::ToolchainConfig;

pub const DEFAULT_BITWIDTHS: [u32; 8] = [2, 4, 6, 8, 10, 12, 14, 16];

/// SMT solvers Rosette can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverBackend {
    Z3,
    Boolector,
    Bitwuzla,
    Cvc5,
    Yices,
}

impl SolverBackend {
    pub const ALL: [SolverBackend; 5] = [
        SolverBackend::Z3,
        SolverBackend::Boolector,
        SolverBackend::Bitwuzla,
        SolverBackend::Cvc5,
        SolverBackend::Yices,
    ];
}

impl std::fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SolverBackend::Z3 => "z3",
            SolverBackend::Boolector => "boolector",
            SolverBackend::Bitwuzla => "bitwuzla",
            SolverBackend::Cvc5 => "cvc5",
            SolverBackend::Yices => "yices",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SolverBackend {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "z3" => Ok(Self::Z3),
            "boolector" => Ok(Self::Boolector),
            "bitwuzla" => Ok(Self::Bitwuzla),
            "cvc5" => Ok(Self::Cvc5),
            "yices" => Ok(Self::Yices),
            _ => Err(format!("invalid solver backend: {}", s)),
        }
    }
}

/// Rosette program checking that `a*b` equals the sum of its half-width
/// partial products, with the high-half product dropped since it overflows.
pub fn mul_verify_program(bitwidth: u32, backend: Option<SolverBackend>) -> Result<String> {
    if bitwidth < 2 || bitwidth % 2 != 0 {
        return Err(SynthbenchError::InvalidArgument(format!(
            "bitwidth must be even and at least 2; got {}",
            bitwidth
        )));
    }
    let solver_prelude = match backend {
        Some(backend) => format!(
            "(require rosette/solver/smt/{b})\n(current-solver ({b}))\n",
            b = backend
        ),
        None => String::new(),
    };
    Ok(format!(
        "#lang rosette
{solver_prelude}(define bw {bw})
(define-symbolic a1 a0 b1 b0 (bitvector (/ bw 2)))
(define a (concat a1 a0))
(define b (concat b1 b0))
(verify (assert
 (bveq (bvmul a b)
       (bvadd
        (bvmul (zero-extend a0 (bitvector bw))
               (zero-extend b0 (bitvector bw)))
        (bvshl (zero-extend (bvmul a0 b1) (bitvector bw))
               (bv (/ bw 2) bw))
        (bvshl (zero-extend (bvmul a1 b0) (bitvector bw))
               (bv (/ bw 2) bw))))))
",
        solver_prelude = solver_prelude,
        bw = bitwidth
    ))
}

/// One point of the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPoint {
    pub bitwidth: u32,
    /// `None` runs with Rosette's default solver.
    pub backend: Option<SolverBackend>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub timeout: Duration,
    pub bitwidths: Vec<u32>,
    pub backends: Vec<Option<SolverBackend>>,
}

impl SweepConfig {
    pub fn new(timeout: Duration) -> Self {
        SweepConfig {
            timeout,
            bitwidths: DEFAULT_BITWIDTHS.to_vec(),
            backends: vec![None],
        }
    }

    /// Points in run order: bitwidth-major, then backend.
    pub fn points(&self) -> Vec<SweepPoint> {
        self.bitwidths
            .iter()
            .flat_map(|&bitwidth| {
                self.backends
                    .iter()
                    .map(move |&backend| SweepPoint { bitwidth, backend })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRecord {
    pub bitwidth: u32,
    pub solver: Option<String>,
    pub elapsed_seconds: f64,
    pub timed_out: bool,
}

fn run_point(
    racket: &Path,
    point: SweepPoint,
    timeout: Duration,
) -> Result<SweepRecord> {
    let program = mul_verify_program(point.bitwidth, point.backend)?;
    let mut scratch = tempfile::Builder::new()
        .prefix("mul_verify_")
        .suffix(".rkt")
        .tempfile()
        .map_err(|e| SynthbenchError::io("failed to create rosette program file", e))?;
    scratch
        .write_all(program.as_bytes())
        .and_then(|_| scratch.flush())
        .map_err(|e| SynthbenchError::io("failed to write rosette program file", e))?;

    let command =
        ToolCommand::new("racket", racket).arg(scratch.path().display().to_string());
    let run = run_with_timeout(&command, timeout)?;
    if !run.timed_out && run.exit_code != Some(0) {
        log::warn!(
            "racket exited with {:?} for bitwidth {}",
            run.exit_code,
            point.bitwidth
        );
    }
    Ok(SweepRecord {
        bitwidth: point.bitwidth,
        solver: point.backend.map(|b| b.to_string()),
        elapsed_seconds: run.elapsed.as_secs_f64(),
        timed_out: run.timed_out,
    })
}

/// Runs every point of `sweep` in order, one `racket` process at a time.
///
/// A timed-out point is a recorded outcome, not an error.
pub fn run_mul_verify_sweep(
    sweep: &SweepConfig,
    toolchain: &ToolchainConfig,
) -> Result<Vec<SweepRecord>> {
    if sweep.timeout.is_zero() {
        return Err(SynthbenchError::InvalidArgument(
            "sweep timeout must be positive".to_string(),
        ));
    }
    // Reject bad bitwidths before spending any time running points.
    for &bitwidth in &sweep.bitwidths {
        mul_verify_program(bitwidth, None)?;
    }
    let racket = toolchain.racket()?;
    let mut records = Vec::new();
    for point in sweep.points() {
        let record = run_point(&racket, point, sweep.timeout)?;
        log::info!(
            "bitwidth {} solver {}: {:.3}s{}",
            record.bitwidth,
            record.solver.as_deref().unwrap_or("default"),
            record.elapsed_seconds,
            if record.timed_out { " (timed out)" } else { "" }
        );
        records.push(record);
    }
    Ok(records)
}

pub fn write_sweep_csv(records: &[SweepRecord], path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let csv_error =
        |e: csv::Error| SynthbenchError::Parse(format!("failed to write {}: {}", path.display(), e));
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for record in records {
        writer.serialize(record).map_err(csv_error)?;
    }
    writer
        .flush()
        .map_err(|e| SynthbenchError::io(format!("failed to flush {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0; "zero")]
    #[test_case(3; "odd")]
    #[test_case(1; "one")]
    fn test_bad_bitwidth(bitwidth: u32) {
        let err = mul_verify_program(bitwidth, None).unwrap_err();
        assert!(matches!(err, SynthbenchError::InvalidArgument(_)));
    }

    #[test]
    fn test_default_program() {
        let program = mul_verify_program(8, None).unwrap();
        assert!(program.starts_with("#lang rosette\n(define bw 8)\n"), "{}", program);
        assert!(!program.contains("current-solver"));
    }

    #[test]
    fn test_program_with_backend() {
        let program = mul_verify_program(4, Some(SolverBackend::Bitwuzla)).unwrap();
        assert!(program.contains("(require rosette/solver/smt/bitwuzla)\n(current-solver (bitwuzla))\n"));
        assert!(program.contains("(define bw 4)"));
    }

    #[test]
    fn test_backend_round_trips_through_str() {
        for backend in SolverBackend::ALL {
            assert_eq!(backend.to_string().parse::<SolverBackend>().unwrap(), backend);
        }
        assert!("minisat".parse::<SolverBackend>().is_err());
    }

    #[test]
    fn test_default_sweep_points() {
        let sweep = SweepConfig::new(Duration::from_secs(1));
        let points = sweep.points();
        assert_eq!(points.len(), 8);
        assert_eq!(points[0], SweepPoint { bitwidth: 2, backend: None });
        assert_eq!(points[7].bitwidth, 16);
    }

    #[test]
    fn test_points_are_bitwidth_major() {
        let sweep = SweepConfig {
            timeout: Duration::from_secs(1),
            bitwidths: vec![2, 4],
            backends: vec![Some(SolverBackend::Z3), Some(SolverBackend::Cvc5)],
        };
        let got: Vec<(u32, Option<SolverBackend>)> =
            sweep.points().iter().map(|p| (p.bitwidth, p.backend)).collect();
        assert_eq!(
            got,
            vec![
                (2, Some(SolverBackend::Z3)),
                (2, Some(SolverBackend::Cvc5)),
                (4, Some(SolverBackend::Z3)),
                (4, Some(SolverBackend::Cvc5)),
            ]
        );
    }

    #[test]
    fn test_odd_bitwidth_rejected_before_running() {
        let sweep = SweepConfig {
            bitwidths: vec![2, 5],
            ..SweepConfig::new(Duration::from_secs(1))
        };
        // The racket path is bogus; the bitwidth check must fire first.
        let toolchain = ToolchainConfig {
            racket_path: Some("/no/such/racket".into()),
            ..Default::default()
        };
        let err = run_mul_verify_sweep(&sweep, &toolchain).unwrap_err();
        assert!(matches!(err, SynthbenchError::InvalidArgument(_)), "got {:?}", err);
    }

    #[test]
    fn test_write_sweep_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figures").join("sweep.csv");
        let records = vec![
            SweepRecord {
                bitwidth: 2,
                solver: None,
                elapsed_seconds: 0.5,
                timed_out: false,
            },
            SweepRecord {
                bitwidth: 4,
                solver: Some("z3".to_string()),
                elapsed_seconds: 1.0,
                timed_out: true,
            },
        ];
        write_sweep_csv(&records, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "bitwidth,solver,elapsed_seconds,timed_out\n2,,0.5,false\n4,z3,1.0,true\n"
        );
    }
}
