use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

use crate::testutils::sample_snapshot;

const TEST_CONFIG_FILE: &str = "explorer.toml";

fn run_explorer(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_data-explorer"))
        .arg("--config-path")
        .arg(config_dir.join(TEST_CONFIG_FILE))
        .args(args)
        .env("RUST_LOG", "data_explorer=debug")
        .output()
        .expect("data-explorer runs")
}

fn write_config(temp_dir: &TempDir) {
    let snapshot_path = temp_dir.path().join("explorer.json");
    fs::write(
        &snapshot_path,
        serde_json::to_string(&sample_snapshot()).unwrap(),
    )
    .unwrap();

    fs::write(
        temp_dir.path().join(TEST_CONFIG_FILE),
        format!(
            "[source]\ntype = \"snapshot\"\npath = {:?}\n\n[tree]\nauto_expand_ceiling = 5\n",
            snapshot_path.to_str().unwrap()
        ),
    )
    .unwrap();
}

#[test]
fn test_cli_prints_tree_and_tabs() {
    let temp_dir = TempDir::new().unwrap();
    write_config(&temp_dir);

    let output = run_explorer(
        temp_dir.path(),
        &[
            "--route",
            "dbs/db1/colls/c1/documents",
            "--route",
            "#/dbs/db1/colls/c1/sprocs/sp1",
        ],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("v db1 [400 RU/s]"), "{stdout}");
    assert!(stdout.contains("  v c1"), "{stdout}");
    assert!(stdout.contains("      sp1 (stored_procedure)"), "{stdout}");
    assert!(stdout.contains("  > c3"), "{stdout}");
    assert!(stdout.contains("*sp1 #dbs/db1/colls/c1/sprocs/sp1"), "{stdout}");
}

#[test]
fn test_cli_json_logs() {
    let temp_dir = TempDir::new().unwrap();
    write_config(&temp_dir);

    let output = run_explorer(temp_dir.path(), &["--json-logs"]);
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    let line = stderr
        .lines()
        .find(|line| line.contains("Refreshing databases"))
        .expect("refresh is logged");
    let log: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(log["level"], "INFO");
}

#[test]
fn test_cli_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join(TEST_CONFIG_FILE),
        "[source]\ntype = \"snapshot\"\npath = \"\"\n",
    )
    .unwrap();

    let output = run_explorer(temp_dir.path(), &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("non-empty `path`"), "{stderr}");
}
