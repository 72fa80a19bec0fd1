//! The `slicesim` binary: exit status, report echo and error output.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn slicesim(output_dir: &Path, run_id: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_slicesim"))
        .args(["--sim-time", "50ms", "--run-id", run_id, "--output-dir"])
        .arg(output_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch slicesim")
}

#[test]
fn test_successful_run_echoes_report() {
    let dir = tempfile::tempdir().unwrap();

    let output = slicesim(dir.path(), "cli-run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let report = fs::read_to_string(dir.path().join("cli-run")).unwrap();
    assert_eq!(stdout, report);
    assert!(stdout.contains("Flow 1 ("));
    assert!(stdout.contains("  Mean flow throughput: "));
}

#[test]
fn test_unopenable_report_exits_with_status_one() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");

    let output = slicesim(&missing, "cli-run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    let expected = format!("Can't open file {}", missing.join("cli-run").display());
    assert!(
        stderr.lines().any(|line| line == expected),
        "stderr was: {stderr}"
    );
    assert!(output.stdout.is_empty());
    assert!(!missing.exists());
}
