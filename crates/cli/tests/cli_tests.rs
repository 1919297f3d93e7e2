//! CLI integration tests

use std::process::Command;

fn run(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "emon-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = run(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Energy & Emissions Monitor"),
        "Should show app name"
    );
    assert!(stdout.contains("snapshot"), "Should show snapshot command");
    assert!(stdout.contains("window"), "Should show window command");
    assert!(stdout.contains("savings"), "Should show savings command");
    assert!(
        stdout.contains("recommendations"),
        "Should show recommendations command"
    );
    assert!(stdout.contains("report"), "Should show report command");
    assert!(stdout.contains("analyze"), "Should show analyze command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = run(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("emon"), "Should show binary name");
}

#[test]
fn test_window_help() {
    let output = run(&["window", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--limit"), "Should show limit option");
}

#[test]
fn test_analyze_help() {
    let output = run(&["analyze", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--input"), "Should show input option");
    assert!(stdout.contains("--config"), "Should show config option");
}

#[test]
fn test_format_option() {
    let output = run(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
}

#[test]
fn test_invalid_command() {
    let output = run(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
}

#[test]
fn test_analyze_requires_input() {
    let output = run(&["analyze"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Missing input should fail");
    assert!(stderr.contains("--input"), "Should mention missing input");
}

#[test]
fn test_analyze_recorded_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("readings.json");
    std::fs::write(
        &input,
        r#"[
            {"current": 1.0, "temperature": 58.0, "co2": 450, "energy_cumulative": 20.000, "timestamp": "2024-01-01T12:00:00Z"},
            {"current": 1.2, "temperature": 57.0, "co2": 455, "energy_cumulative": 20.001, "timestamp": "2024-01-01T12:00:02Z"}
        ]"#,
    )
    .unwrap();

    let input = input.to_string_lossy().to_string();
    let output = run(&["--format", "json", "analyze", "--input", &input]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Analyze should succeed");
    let outcome: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(outcome["snapshot"]["accepted"], 2);
    assert!(outcome["rejected"].as_array().unwrap().is_empty());
}

#[test]
fn test_analyze_csv_recording() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("readings.csv");
    std::fs::write(
        &input,
        "timestamp,current_A,temp_C,co2_ppm,power_W\n\
         1704110400000,1.0,58.0,450,230.0\n\
         1704110402000,1.2,57.0,455,276.0\n\
         1704110404000,9.0,45.0,520,2070.0\n",
    )
    .unwrap();

    let input = input.to_string_lossy().to_string();
    let output = run(&["--format", "json", "analyze", "--input", &input]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Analyze should accept CSV");
    let outcome: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(outcome["snapshot"]["accepted"], 3);
    assert_eq!(outcome["snapshot"]["window"].as_array().unwrap().len(), 3);
}
