#![allow(deprecated)] // cargo_bin is deprecated in favor of cargo_bin_cmd!

use assert_cmd::Command;
use predicates::prelude::*;
mod common;
use common::{STACK_KDL, TestProject};
use std::fs;

fn eksforge(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("eksforge").unwrap();
    cmd.current_dir(project.path())
        .env_remove("EKSFORGE_CONFIG_PATH")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("eksforge").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("outputs"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("eksforge").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("eksforge"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("eksforge").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

#[test]
fn test_validate_summary() {
    let project = TestProject::with_stack();
    eksforge(&project)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("2 private subnets, 1 public subnets"))
        .stdout(predicate::str::contains("general"));
}

#[test]
fn test_validate_without_stack_file() {
    let project = TestProject::new();
    eksforge(&project)
        .env("HOME", project.path())
        .env_remove("XDG_CONFIG_HOME")
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Stack file not found"));
}

#[test]
fn test_validate_rejects_bad_capacity() {
    let project = TestProject::new();
    project.write_stack_kdl(&STACK_KDL.replace("desired-size 1", "desired-size \"lots\""));
    eksforge(&project)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("desired"));
}

#[test]
fn test_config_flag_and_environment() {
    let project = TestProject::new();
    let path = project.path().join("infra.kdl");
    fs::write(&path, STACK_KDL).unwrap();

    eksforge(&project)
        .arg("validate")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("infra.kdl"));

    eksforge(&project)
        .env("EKSFORGE_CONFIG_PATH", &path)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("infra.kdl"));
}

#[test]
fn test_debug_logs_go_to_stderr() {
    let project = TestProject::with_stack();
    eksforge(&project)
        .env("RUST_LOG", "debug")
        .arg("plan")
        .arg("--json")
        .assert()
        .success()
        .stderr(predicate::str::contains("Loaded stack file"))
        .stdout(predicate::str::contains("Loaded stack file").not());
}

#[test]
fn test_plan_json_lists_actions_in_order() {
    let project = TestProject::with_stack();
    let output = eksforge(&project)
        .arg("plan")
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let plan: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let actions = plan["actions"].as_array().unwrap();
    assert_eq!(actions[0]["resource_id"], "VPC");
    assert_eq!(actions[0]["action_type"], "create");
    assert_eq!(plan["has_changes"], true);

    let igw = actions.iter().find(|a| a["resource_id"] == "igw").unwrap();
    assert_eq!(igw["details"]["vpcId"], "(known after apply)");
    assert!(actions.iter().any(|a| a["action_type"] == "read"));
}

#[test]
fn test_apply_requires_yes() {
    let project = TestProject::with_stack();
    eksforge(&project)
        .arg("apply")
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));
    assert!(!project.state_path().exists());
}

#[test]
fn test_apply_then_outputs_and_plan() {
    let project = TestProject::with_stack();

    eksforge(&project)
        .arg("apply")
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("autoScalerRoleArn"));
    assert!(project.state_path().exists());
    assert!(!project.path().join(".eksforge").join("lock.json").exists());

    let output = eksforge(&project)
        .arg("outputs")
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let outputs: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        outputs["autoScalerRoleArn"],
        "arn:aws:iam::210987654321:role/AmazonEKSClusterAutoscalerRole"
    );
    assert!(outputs["private-subnet-01"].is_string());
    assert!(outputs["general-role-arn"].is_string());

    eksforge(&project)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 to create, 0 to update"));
}

#[test]
fn test_outputs_without_state() {
    let project = TestProject::new();
    eksforge(&project)
        .arg("outputs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No state found"));
}
