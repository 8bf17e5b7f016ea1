mod common;

use common::{TestEnv, free_port, http_server_cmd, python3_available, wait_for_listen};
use std::process::{Command, Stdio};

#[test]
fn test_status_of_unconfigured_server() {
    let env = TestEnv::new();
    let output = env.run_command(&["status", "nope"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Status: unconfigured"), "{stdout}");

    let status = env.get_status("nope");
    assert_eq!(status["status"], "unconfigured");
}

#[test]
fn test_start_unconfigured_server_fails() {
    let env = TestEnv::new();
    let (ok, outcome) = env.run_json(&["start", "ghost"]);
    assert!(!ok, "start should exit non-zero");
    assert_eq!(outcome["ok"], false);
    assert_eq!(outcome["errorKind"], "configuration_missing");
}

#[test]
fn test_start_status_stop_status() {
    if !python3_available() {
        eprintln!("skipping: python3 not available");
        return;
    }
    let env = TestEnv::new();
    let port = free_port();
    env.configure("svc-a", &http_server_cmd(port), &[port]);

    let (ok, started) = env.run_json(&["start", "svc-a"]);
    assert!(ok, "start failed: {started}");
    assert_eq!(started["replacedPorts"], serde_json::json!([]));
    let pid = started["pid"].as_u64().unwrap();
    wait_for_listen(port);

    let status = env.wait_for_status("svc-a", "running");
    assert_eq!(status["primaryPort"], port);
    // simple commands are exec'd, so the launched pid is the listener
    assert_eq!(status["pid"].as_u64(), Some(pid));

    let (ok, stopped) = env.run_json(&["stop", "svc-a"]);
    assert!(ok, "stop failed: {stopped}");
    assert_eq!(stopped["stoppedPorts"][0]["port"], port);
    assert_eq!(stopped["stoppedPorts"][0]["pids"][0].as_u64(), Some(pid));

    let status = env.wait_for_status("svc-a", "stopped");
    assert_eq!(status["primaryPort"], port);
}

#[test]
fn test_start_replaces_unrelated_listener() {
    if !python3_available() {
        eprintln!("skipping: python3 not available");
        return;
    }
    let env = TestEnv::new();
    let port = free_port();
    let mut squatter = Command::new("python3")
        .args(["-m", "http.server", &port.to_string(), "--bind", "127.0.0.1"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    wait_for_listen(port);

    env.configure("svc-b", &http_server_cmd(port), &[port]);
    let (ok, started) = env.run_json(&["start", "svc-b"]);
    let _ = squatter.wait();
    assert!(ok, "start failed: {started}");
    assert_eq!(started["replacedPorts"][0]["port"], port);
    assert_eq!(
        started["replacedPorts"][0]["pids"][0].as_u64(),
        Some(squatter.id() as u64)
    );
    assert_ne!(started["pid"].as_u64(), Some(squatter.id() as u64));

    wait_for_listen(port);
    let status = env.wait_for_status("svc-b", "running");
    assert_eq!(status["pid"], started["pid"]);
}

#[test]
fn test_restart_says_restarted() {
    if !python3_available() {
        eprintln!("skipping: python3 not available");
        return;
    }
    let env = TestEnv::new();
    let port = free_port();
    env.configure("svc", &http_server_cmd(port), &[port]);

    let output = env.run_command(&["restart", "svc"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Started svc"));
    wait_for_listen(port);
    env.wait_for_status("svc", "running");

    let output = env.run_command(&["restart", "svc"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{stdout}");
    assert!(stdout.starts_with("Restarted svc"), "{stdout}");
}

#[test]
fn test_stop_twice_is_not_running() {
    if !python3_available() {
        eprintln!("skipping: python3 not available");
        return;
    }
    let env = TestEnv::new();
    let port = free_port();
    env.configure("svc", &http_server_cmd(port), &[port]);
    assert!(env.run_command(&["start", "svc"]).status.success());
    wait_for_listen(port);

    assert!(env.run_command(&["stop", "svc"]).status.success());
    let output = env.run_command(&["stop", "svc"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("svc is not running"), "{stderr}");
}

#[test]
fn test_missing_directory_fails_start() {
    let env = TestEnv::new();
    let port = free_port();
    let gone = env.project_dir().join("gone");
    let output = env.run_command(&[
        "config",
        "set",
        "svc",
        "--dir",
        gone.to_str().unwrap(),
        "--port",
        &port.to_string(),
        "--cmd",
        "sleep 30",
    ]);
    assert!(output.status.success());

    let (ok, outcome) = env.run_json(&["start", "svc"]);
    assert!(!ok);
    assert_eq!(outcome["errorKind"], "directory_not_found");
}

#[test]
fn test_list_shows_configured_servers() {
    let env = TestEnv::new();
    env.configure("api", "sleep 30", &[free_port()]);
    env.configure("web", "sleep 30", &[free_port()]);

    let output = env.run_command(&["list", "--hide-header"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let names: Vec<_> = stdout
        .lines()
        .filter_map(|l| l.split_whitespace().next())
        .collect();
    assert_eq!(names, vec!["api", "web"]);
    assert!(stdout.contains("stopped"));
}

#[test]
fn test_operations_are_logged() {
    let env = TestEnv::new();
    env.run_command(&["start", "ghost"]);
    env.run_command(&["stop", "ghost"]);
    let logs = env.read_logs();
    assert!(logs.contains("Start requested for ghost"), "{logs}");
    assert!(logs.contains("failed to launch ghost"), "{logs}");
    assert!(logs.contains("stopping ghost"), "{logs}");
}
