use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

const FAST_WINDOW: [&str; 4] = ["--window-ms", "400", "--frame-interval-ms", "20"];

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_oil_cli"))
}

fn fixture_file(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

#[test]
fn inspect_fixture_succeeds() {
    let output = cli()
        .args(["inspect", "--fixture", "clean_sample"])
        .args(FAST_WINDOW)
        .output()
        .expect("failed to run oil_cli inspect");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("inspection report JSON payload");
    assert_eq!(json["fixture"], "clean_sample");
    assert_eq!(json["result"]["top_label"], "Clean Oil");
    assert_eq!(json["result"]["status"], "Clean");
    assert_eq!(json["view"]["bar_width"], "88%");
    assert!(
        json["result"]["tick_count"].as_u64().unwrap_or_default() >= 6,
        "expected the script to be exhausted"
    );
}

#[test]
fn inspect_fixture_detects_mismatch() {
    let output = cli()
        .args([
            "inspect",
            "--fixture",
            "clean_sample",
            "--expect",
            &fixture_file("clean_sample_incorrect.expect.json"),
        ])
        .args(FAST_WINDOW)
        .output()
        .expect("failed to run mismatch inspect");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(
        stderr.contains("\"failures\""),
        "expected diff JSON in stderr, got {stderr}"
    );
}

#[test]
fn inspect_writes_report_to_output_path() {
    let path = std::env::temp_dir().join(format!("oil_cli_report_{}.json", std::process::id()));
    let output = cli()
        .args(["inspect", "--fixture", "dirty_sample", "--output"])
        .arg(&path)
        .args(FAST_WINDOW)
        .output()
        .expect("failed to run inspect with --output");
    assert!(output.status.success());

    let written = std::fs::read_to_string(&path).expect("report file");
    let json: Value = serde_json::from_str(&written).expect("report JSON");
    assert_eq!(json["result"]["status"], "Dirty");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn inspect_unknown_fixture_fails() {
    let output = cli()
        .args(["inspect", "--fixture", "does_not_exist"])
        .output()
        .expect("failed to run inspect");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn status_reports_moderate_band() {
    let output = cli()
        .args(["status", "--percent", "70"])
        .output()
        .expect("failed to run status");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("status JSON");
    assert_eq!(json["status"], "Moderate");
    assert_eq!(json["badge"], "bg-warning");
}

#[test]
fn dump_fixtures_lists_assets() {
    let output = cli()
        .arg("dump-fixtures")
        .output()
        .expect("failed to run dump-fixtures");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert!(
        stdout.contains("clean_sample"),
        "expected fixture listing, got {stdout}"
    );
    assert!(!stdout.contains("clean_sample_incorrect"));
}
