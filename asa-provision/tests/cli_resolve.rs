use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn resolve_picks_longest_prefix() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("asa-provision"));
    cmd.arg("resolve")
        .arg("--snapshot")
        .arg(fixture("fixtures/lab-snapshot"))
        .arg("192.168.6.77")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "192.168.6.77 zone=lab route=192.168.6.0/24 gateway=192.168.1.9 interface=GigabitEthernet0/1",
        ));
}

#[test]
fn resolve_falls_back_to_default_route() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("asa-provision"));
    cmd.arg("resolve")
        .arg("--snapshot")
        .arg(fixture("fixtures/lab-snapshot"))
        .arg("8.8.8.8")
        .assert()
        .success()
        .stdout(predicate::str::contains("zone=outside route=0.0.0.0/0"));
}

#[test]
fn resolve_skips_management_routes() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("asa-provision"));
    cmd.arg("resolve")
        .arg("--snapshot")
        .arg(fixture("fixtures/lab-snapshot"))
        .arg("10.99.0.5")
        .assert()
        .success()
        .stdout(predicate::str::contains("zone=inside route=10.0.0.0/8"));
}

#[test]
fn management_zone_is_configurable() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("site.toml");
    fs::write(&config, "[routing]\nmanagement_zone = \"oob\"\n").expect("write");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("asa-provision"));
    cmd.arg("--config")
        .arg(path_as_str(&config))
        .arg("resolve")
        .arg("--snapshot")
        .arg(fixture("fixtures/lab-snapshot"))
        .arg("10.99.0.5")
        .assert()
        .success()
        .stdout(predicate::str::contains("zone=management route=10.99.0.0/16"));
}

#[test]
fn resolve_dereferences_named_objects() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("asa-provision"));
    cmd.arg("resolve")
        .arg("--snapshot")
        .arg(fixture("fixtures/lab-snapshot"))
        .arg("lab-host-192.168.6.25_32")
        .assert()
        .success()
        .stdout(predicate::str::contains("lab-host-192.168.6.25_32 zone=lab"));
}

#[test]
fn resolve_rejects_group_literals() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("asa-provision"));
    cmd.arg("resolve")
        .arg("--snapshot")
        .arg(fixture("fixtures/lab-snapshot"))
        .arg("grp-lab-neteng-networks")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to resolve zone of grp-lab-neteng-networks"));
}

#[test]
fn group_zone_follows_first_member_reference() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("asa-provision"));
    cmd.arg("group-zone")
        .arg("--snapshot")
        .arg(fixture("fixtures/lab-snapshot"))
        .arg("grp-weblab-monitors")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "grp-weblab-monitors zone=weblab via=192.168.12.44 route=192.168.12.0/24",
        ));
}

#[test]
fn group_zone_reports_members_in_other_zones() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("asa-provision"));
    cmd.arg("group-zone")
        .arg("--snapshot")
        .arg(fixture("fixtures/lab-snapshot"))
        .arg("--check-members")
        .arg("grp-mixed")
        .assert()
        .success()
        .stdout(predicate::str::contains("grp-mixed zone=lab"))
        .stdout(predicate::str::contains(
            "WARN zone_mismatch group=grp-mixed member=192.168.12.10 expected=lab found=weblab",
        ));
}

#[test]
fn group_zone_fails_for_empty_group() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("asa-provision"));
    cmd.arg("group-zone")
        .arg("--snapshot")
        .arg(fixture("fixtures/lab-snapshot"))
        .arg("grp-empty")
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no members"));
}

#[test]
fn name_object_uses_zone_and_strips_host_prefix() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("asa-provision"));
    cmd.arg("name-object")
        .arg("--snapshot")
        .arg(fixture("fixtures/lab-snapshot"))
        .arg("192.168.6.25/32")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "lab-host-192.168.6.25_32 zone=lab kind=IPv4Address",
        ))
        .stdout(predicate::str::contains("\"kind\": \"object#NetworkObj\""));
}

#[test]
fn name_object_for_network() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("asa-provision"));
    let output = cmd
        .arg("name-object")
        .arg("--snapshot")
        .arg(fixture("fixtures/lab-snapshot"))
        .args(["--format", "json", "--description", "web farm", "192.168.12.0/26"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let draft: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(draft["name"], "weblab-network-192.168.12.0_26");
    assert_eq!(draft["host"]["kind"], "IPv4Network");
    assert_eq!(draft["description"], "web farm");
}

fn path_as_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}
