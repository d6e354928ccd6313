//! CLI integration tests

use std::process::Command;

fn pdm() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pdm"))
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = pdm().arg("--help").output().expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Predictive Maintenance"),
        "Should show app name"
    );
    for command in ["ingest", "history", "series", "predict", "health"] {
        assert!(stdout.contains(command), "Should show {command} command");
    }
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = pdm().arg("--version").output().expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("pdm"), "Should show binary name");
}

/// Test ingest subcommand help
#[test]
fn test_ingest_help() {
    let output = pdm()
        .args(["ingest", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Ingest help should succeed");
    for flag in ["--temperature", "--humidity", "--vibration", "--current", "--voltage"] {
        assert!(stdout.contains(flag), "Should show {flag} option");
    }
}

/// Test history subcommand help
#[test]
fn test_history_help() {
    let output = pdm()
        .args(["history", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "History help should succeed");
    assert!(stdout.contains("--limit"), "Should show limit option");
}

/// Test that an unreachable server is reported as a failure
#[test]
fn test_predict_unreachable_server_fails() {
    let output = pdm()
        .args(["--api-url", "http://127.0.0.1:9", "predict"])
        .env("HOME", env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Predict should fail without a server");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to send request"),
        "Should explain the failure: {stderr}"
    );
}

/// Test invalid subcommand
#[test]
fn test_invalid_subcommand() {
    let output = pdm()
        .arg("invalid-command")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Invalid command should fail");
}
