//! Binary-level CLI tests. None of these reach multipass.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn clusterforge() -> Command {
    cargo_bin_cmd!("clusterforge")
}

/// Command pointed at a config and state file inside `dir`.
fn isolated(dir: &Path) -> Command {
    let mut cmd = clusterforge();
    cmd.arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--state")
        .arg(dir.join("state.json"))
        .arg("--color")
        .arg("never");
    cmd
}

#[test]
fn test_help() {
    clusterforge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("clusterforge"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("destroy"))
        .stdout(predicate::str::contains("outputs"));
}

#[test]
fn test_version() {
    clusterforge()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("clusterforge"));
}

#[test]
fn plan_json_lists_operations_without_running_them() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .args(["plan", "2", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"command\":\"plan\""))
        .stdout(predicate::str::contains("microk8s-node0Purge"))
        .stdout(predicate::str::contains("microk8s-node0Create"))
        .stdout(predicate::str::contains("hostmicrok8s-node1Tomicrok8s-node0"))
        .stdout(predicate::str::contains("microk8s-node1JoinCommand"))
        .stdout(predicate::str::contains("microk8s-node0Join\"").not());

    assert!(!dir.path().join("state.json").exists());
}

#[test]
fn plan_rejects_zero_nodes() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .args(["plan", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least"));
}

#[test]
fn plan_uses_node_prefix_from_config() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("config.toml"), "[cluster]\nnode_prefix = \"lab\"\n").unwrap();

    isolated(dir.path())
        .args(["plan", "1", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lab0Create"));
}

#[test]
fn destroy_with_empty_state_is_a_no_op() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .args(["destroy", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to destroy"));
}

#[test]
fn outputs_before_up() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .arg("outputs")
        .assert()
        .success()
        .stdout(predicate::str::contains("No outputs recorded"));
}

#[test]
fn outputs_redact_credential_unless_asked() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("state.json"),
        r#"{
  "version": 1,
  "operations": [],
  "outputs": {
    "clusterCredential": "apiVersion: v1\nusers:\n- name: admin\n",
    "masterAddress": "10.0.0.11"
  }
}"#,
    )
    .unwrap();

    isolated(dir.path())
        .args(["outputs", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10.0.0.11"))
        .stdout(predicate::str::contains("[secret]"))
        .stdout(predicate::str::contains("apiVersion").not());

    isolated(dir.path())
        .args(["outputs", "--show-secrets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("apiVersion: v1"));
}

#[test]
fn config_init_then_validate() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    isolated(dir.path())
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config file is valid"));

    isolated(dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn config_validate_reports_bad_field() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("config.toml"), "[vm]\nmemory = \"lots\"\n").unwrap();

    isolated(dir.path())
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("vm.memory"));
}

#[test]
fn config_validate_requires_file() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .args(["config", "validate"])
        .assert()
        .failure();
}

#[test]
fn config_show_json_has_defaults() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"node_prefix\":\"microk8s-node\""))
        .stdout(predicate::str::contains("\"timeout_secs\":900"));
}
