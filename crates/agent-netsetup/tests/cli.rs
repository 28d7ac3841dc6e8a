//! Integration tests for the `agent-netsetup` binary.
//!
//! Every run is rooted in a temporary directory and uses `--dry-run`, so
//! nothing on the host is touched and no commands are executed.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DHCP_SETTINGS: &str = r#"{
  "agent_id": "123",
  "networks": {
    "bosh": {
      "default": ["dns", "gateway"],
      "dns": ["10.0.0.2", "10.0.0.3"]
    }
  }
}"#;

const MANUAL_SETTINGS: &str = r#"{
  "networks": {
    "bosh": {
      "default": ["dns", "gateway"],
      "ip": "192.168.195.6",
      "netmask": "255.255.255.0",
      "gateway": "192.168.195.1",
      "mac": "22:00:0a:1f:ac:2a",
      "dns": ["10.80.130.2", "10.80.130.1"]
    }
  }
}"#;

fn write_settings(dir: &Path, content: &str) -> String {
    let path = dir.join("settings.json");
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn netsetup(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("agent-netsetup").unwrap();
    cmd.env("AGENT_LOG_LEVEL", "info");
    cmd.arg("--root").arg(root).arg("--dry-run");
    cmd
}

#[test]
fn test_setup_dhcp_writes_config_under_root() {
    let root = TempDir::new().unwrap();
    let settings = write_settings(root.path(), DHCP_SETTINGS);

    netsetup(root.path())
        .args(["setup-dhcp", "--settings", &settings])
        .assert()
        .success()
        .stderr(predicate::str::contains("[dry-run] pkill dhclient3"))
        .stderr(predicate::str::contains(
            "[dry-run] /etc/init.d/networking restart",
        ));

    let written = fs::read_to_string(root.path().join("etc/dhcp3/dhclient.conf")).unwrap();
    assert!(written.starts_with("# Generated by bosh-agent\n"));
    assert!(written.ends_with(
        "prepend domain-name-servers 10.0.0.3;\nprepend domain-name-servers 10.0.0.2;\n"
    ));
}

#[test]
fn test_setup_dhcp_twice_skips_restart() {
    let root = TempDir::new().unwrap();
    let settings = write_settings(root.path(), DHCP_SETTINGS);

    netsetup(root.path())
        .args(["setup-dhcp", "--settings", &settings])
        .assert()
        .success();

    netsetup(root.path())
        .args(["setup-dhcp", "--settings", &settings])
        .assert()
        .success()
        .stderr(predicate::str::contains("[dry-run]").not());
}

#[test]
fn test_setup_manual_writes_interfaces_and_resolv_conf() {
    let root = TempDir::new().unwrap();
    let device = root.path().join("sys/class/net/eth0");
    fs::create_dir_all(&device).unwrap();
    fs::write(device.join("address"), "22:00:0a:1f:ac:2a\n").unwrap();
    let settings = write_settings(root.path(), MANUAL_SETTINGS);

    netsetup(root.path())
        .args(["--arp-interval-ms", "1"])
        .args(["setup-manual", "--settings", &settings])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "[dry-run] service network-interface stop INTERFACE=eth0",
        ))
        .stderr(predicate::str::contains(
            "[dry-run] service network-interface start INTERFACE=eth0",
        ));

    let interfaces = fs::read_to_string(root.path().join("etc/network/interfaces")).unwrap();
    assert!(interfaces.contains("iface eth0 inet static\n    address 192.168.195.6\n"));
    assert!(interfaces.ends_with("    gateway 192.168.195.1"));
    assert_eq!(
        fs::read_to_string(root.path().join("etc/resolv.conf")).unwrap(),
        "nameserver 10.80.130.1\nnameserver 10.80.130.2\n"
    );
}

#[test]
fn test_setup_manual_centos_writes_ifcfg() {
    let root = TempDir::new().unwrap();
    let device = root.path().join("sys/class/net/eth0");
    fs::create_dir_all(&device).unwrap();
    fs::write(device.join("address"), "22:00:0a:1f:ac:2a\n").unwrap();
    let settings = write_settings(root.path(), MANUAL_SETTINGS);

    netsetup(root.path())
        .args(["--os", "centos", "--arp-interval-ms", "1"])
        .args(["setup-manual", "--settings", &settings])
        .assert()
        .success()
        .stderr(predicate::str::contains("[dry-run] service network restart"));

    let ifcfg = fs::read_to_string(
        root.path()
            .join("etc/sysconfig/network-scripts/ifcfg-eth0"),
    )
    .unwrap();
    assert!(ifcfg.starts_with("DEVICE=eth0\nBOOTPROTO=static\n"));
}

#[test]
fn test_setup_manual_unknown_mac_fails() {
    let root = TempDir::new().unwrap();
    let settings = write_settings(root.path(), MANUAL_SETTINGS);

    netsetup(root.path())
        .args(["setup-manual", "--settings", &settings])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("22:00:0a:1f:ac:2a"));

    assert!(!root.path().join("etc/network/interfaces").exists());
}

#[test]
fn test_missing_settings_file_fails() {
    let root = TempDir::new().unwrap();

    netsetup(root.path())
        .args(["setup-dhcp", "--settings", "/nonexistent/settings.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("/nonexistent/settings.json"));
}

#[test]
fn test_malformed_settings_fails() {
    let root = TempDir::new().unwrap();
    let settings = write_settings(root.path(), "{ not json");

    netsetup(root.path())
        .args(["setup-dhcp", "--settings", &settings])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid settings"));
}
