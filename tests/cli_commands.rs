use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::process::Command;

fn busflow(config: &std::path::Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("busflow"));
    cmd.env_remove("RUST_LOG").arg("--config").arg(config);
    cmd
}

fn config_file(dir: &tempfile::TempDir, yaml: &str) -> std::path::PathBuf {
    let path = dir.path().join("busflow.yaml");
    fs::write(&path, yaml).unwrap();
    path
}

fn step_ids(flow: &Value) -> Vec<String> {
    let mut ids = Vec::new();
    collect(&flow["root"], &mut ids);
    ids
}

fn collect(node: &Value, ids: &mut Vec<String>) {
    match node["node"].as_str() {
        Some("sequence") => {
            for step in node["steps"].as_array().unwrap() {
                collect(step, ids);
            }
        }
        _ => ids.push(node["id"].as_str().unwrap().to_string()),
    }
}

#[test]
fn plan_prints_the_indexed_flow() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(&dir, "flow_timeout_ms: 120000\n");
    let assert = busflow(&config)
        .args(["plan", "--variant", "indexed", "--today", "2024-01-30"])
        .assert()
        .success();

    let flow: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(flow["id"], "easemytrip-indexed");
    assert_eq!(flow["timeout_ms"], 120000);
    assert_eq!(flow["metadata"]["travel_date"], "2024-02-06");
    let ids = step_ids(&flow);
    assert!(ids.contains(&"boarding-point".to_string()));
    assert!(!ids.contains(&"filter-ac".to_string()));
}

#[test]
fn plan_uses_configured_route_and_flag_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(
        &dir,
        "booking:\n  variant: quick\n  from: Agra\n  days_ahead: 2\n",
    );
    let assert = busflow(&config)
        .args(["plan", "--to", "Lucknow", "--today", "2024-03-10"])
        .assert()
        .success();

    let flow: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(flow["id"], "easemytrip-quick");
    assert_eq!(flow["metadata"]["pacing"], "slow");
    assert_eq!(flow["metadata"]["travel_date"], "2024-03-12");
    let text = flow.to_string();
    assert!(text.contains("\"city\":\"Agra\""));
    assert!(text.contains("\"city\":\"Lucknow\""));
}

#[test]
fn unknown_variant_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(&dir, "{}\n");
    busflow(&config)
        .args(["plan", "--variant", "scenic"])
        .assert()
        .failure();
}

#[test]
fn days_ahead_past_a_year_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(&dir, "{}\n");
    busflow(&config)
        .args(["plan", "--days-ahead", "400"])
        .assert()
        .failure();
}

#[test]
fn intents_yaml_reflects_override_file() {
    let dir = tempfile::tempdir().unwrap();
    let overrides = dir.path().join("intents.yaml");
    fs::write(
        &overrides,
        "search-button:\n  candidates:\n    - anchor:\n        kind: css\n        selector: \"#searchNow\"\n",
    )
    .unwrap();
    let config = config_file(
        &dir,
        &format!("intents_path: {}\n", overrides.display()),
    );

    let assert = busflow(&config)
        .args(["intents", "--yaml"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("#searchNow"));
    assert!(!stdout.contains("#srcbtn"));
    assert!(stdout.contains("txtSrcCity"));
}

#[test]
fn info_reports_version_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(&dir, "artifacts_dir: shots\n");
    let assert = busflow(&config)
        .args(["--output", "json", "info"])
        .assert()
        .success();
    let info: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(info["artifacts_dir"], "shots");
}

#[test]
fn missing_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    busflow(&dir.path().join("absent.yaml"))
        .arg("info")
        .assert()
        .failure();
}
