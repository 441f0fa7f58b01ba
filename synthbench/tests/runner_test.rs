// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use synthbench::{
    run_mul_verify_sweep, run_with_retries, SweepConfig, SynthbenchError, ToolCommand,
    ToolchainConfig,
};
use synthbench_test_helpers::{fake_flaky_tool, fake_sleeping_interpreter, make_test_tmpdir};

#[test]
fn test_always_failing_tool_is_launched_attempts_times() {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = make_test_tmpdir("synthbench_retry_exhaust");
    let tool = fake_flaky_tool(temp_dir.path(), "flaky", 1000, 7, 0);
    let log_path = temp_dir.path().join("logs").join("flaky.log");

    let err = run_with_retries(&ToolCommand::new("flaky", &tool.path), &log_path, 4).unwrap_err();

    assert_eq!(tool.launches(), 4);
    match err {
        SynthbenchError::ProcessFailure {
            tool,
            exit_code,
            log_path: Some(reported_log),
        } => {
            assert_eq!(tool, "flaky");
            assert_eq!(exit_code, Some(7));
            assert_eq!(reported_log, log_path);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    // Only the final attempt's output survives in the log.
    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("attempt 4 failing"), "log: {}", log);
    assert!(!log.contains("attempt 3"), "log: {}", log);
}

#[test]
fn test_signal_killed_tool_has_no_exit_code() {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = make_test_tmpdir("synthbench_retry_signal");
    let log_path = temp_dir.path().join("sh.log");
    let command = ToolCommand::new("sh", "/bin/sh").arg("-c").arg("kill -9 $$");

    let err = run_with_retries(&command, &log_path, 2).unwrap_err();

    match err {
        SynthbenchError::ProcessFailure {
            tool, exit_code, ..
        } => {
            assert_eq!(tool, "sh");
            assert_eq!(exit_code, None);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_tool_succeeding_on_third_attempt() {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = make_test_tmpdir("synthbench_retry_recover");
    // Each failing attempt takes a full second; the successful one is instant.
    let tool = fake_flaky_tool(temp_dir.path(), "flaky", 2, 1, 1);
    let log_path = temp_dir.path().join("flaky.log");

    let run = run_with_retries(&ToolCommand::new("flaky", &tool.path), &log_path, 5).unwrap();

    assert_eq!(tool.launches(), 3);
    assert_eq!(run.attempts_made, 3);
    assert!(
        run.elapsed < Duration::from_millis(900),
        "elapsed should cover the last attempt only; got {:?}",
        run.elapsed
    );
    let log = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(log.trim(), "attempt 3 ok");
}

#[test]
fn test_single_attempt_success_launches_once() {
    let temp_dir = make_test_tmpdir("synthbench_retry_once");
    let tool = fake_flaky_tool(temp_dir.path(), "steady", 0, 1, 0);
    let run = run_with_retries(
        &ToolCommand::new("steady", &tool.path),
        &temp_dir.path().join("steady.log"),
        3,
    )
    .unwrap();
    assert_eq!(tool.launches(), 1);
    assert_eq!(run.attempts_made, 1);
}

#[test]
fn test_sweep_with_overrunning_interpreter() {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = make_test_tmpdir("synthbench_sweep_timeout");
    let racket = fake_sleeping_interpreter(temp_dir.path(), "racket");
    let toolchain = ToolchainConfig {
        racket_path: Some(racket.path.clone()),
        ..Default::default()
    };
    let sweep = SweepConfig {
        bitwidths: vec![2, 4],
        ..SweepConfig::new(Duration::from_secs(1))
    };

    let start = std::time::Instant::now();
    let records = run_mul_verify_sweep(&sweep, &toolchain).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].bitwidth, 2);
    assert_eq!(records[1].bitwidth, 4);
    for record in &records {
        assert!(record.timed_out);
        assert_eq!(record.solver, None);
        assert!((record.elapsed_seconds - 1.0).abs() < 1e-9, "{:?}", record);
    }
    assert!(start.elapsed() < Duration::from_secs(10));
    // Give the launch counter a moment in case a shell is still starting up.
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(racket.launches(), 2);
}
