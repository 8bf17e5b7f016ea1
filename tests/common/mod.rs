#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;

/// Helper struct for E2E test environment
pub struct TestEnv {
    temp_dir: TempDir,
    portwarden_bin: PathBuf,
    home_dir: PathBuf,
    /// Servers started through this env, stopped again on drop
    started: RefCell<Vec<String>>,
}

impl TestEnv {
    /// Create a new test environment with isolated directories
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let home_dir = temp_dir.path().join("home");
        fs::create_dir_all(&home_dir).unwrap();

        Self {
            temp_dir,
            portwarden_bin: PathBuf::from(env!("CARGO_BIN_EXE_portwarden")),
            home_dir,
            started: RefCell::new(vec![]),
        }
    }

    /// Get the project directory path, creating it if needed
    pub fn project_dir(&self) -> PathBuf {
        let dir = self.temp_dir.path().join("project");
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn config_dir(&self) -> PathBuf {
        self.temp_dir.path().join("config")
    }

    /// The server store the binary reads and writes
    pub fn servers_file(&self) -> PathBuf {
        self.config_dir().join("servers.toml")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.temp_dir.path().join("state")
    }

    /// Run a portwarden command and return the output
    pub fn run_command(&self, args: &[&str]) -> std::process::Output {
        self.run_command_with_env(args, &[])
    }

    /// Run a portwarden command with additional environment variables
    pub fn run_command_with_env(
        &self,
        args: &[&str],
        extra_env: &[(&str, &str)],
    ) -> std::process::Output {
        if let ["start" | "restart", id, ..] = args {
            self.started.borrow_mut().push(id.to_string());
        }
        let mut cmd = Command::new(&self.portwarden_bin);
        cmd.args(args)
            .current_dir(self.project_dir())
            .env("HOME", &self.home_dir)
            .env("PORTWARDEN_CONFIG_DIR", self.config_dir())
            .env("PORTWARDEN_STATE_DIR", self.state_dir())
            .env("PORTWARDEN_LOG", "debug")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for (key, val) in extra_env {
            cmd.env(key, val);
        }

        cmd.output().expect("Failed to execute portwarden command")
    }

    /// Run a command with `--json` and parse what it printed
    pub fn run_json(&self, args: &[&str]) -> (bool, serde_json::Value) {
        let mut args = args.to_vec();
        args.push("--json");
        let output = self.run_command(&args);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let value = serde_json::from_str(&stdout).unwrap_or_else(|e| {
            panic!(
                "invalid JSON from {args:?}: {e}\nstdout: {stdout}\nstderr: {}",
                String::from_utf8_lossy(&output.stderr)
            )
        });
        (output.status.success(), value)
    }

    /// Save a server through `portwarden config set`
    pub fn configure(&self, id: &str, cmd: &str, ports: &[u16]) {
        let ports = ports
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let dir = self.project_dir();
        let output = self.run_command(&[
            "config",
            "set",
            id,
            "--dir",
            dir.to_str().unwrap(),
            "--port",
            &ports,
            "--cmd",
            cmd,
        ]);
        assert!(
            output.status.success(),
            "config set failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// Get the status field from `portwarden status <id> --json`
    pub fn get_status(&self, id: &str) -> serde_json::Value {
        self.run_json(&["status", id]).1
    }

    /// Poll the status until it matches the expected value.
    /// Retries up to 50 times with 200ms intervals (10s total).
    pub fn wait_for_status(&self, id: &str, expected: &str) -> serde_json::Value {
        for _ in 0..50 {
            let status = self.get_status(id);
            if status["status"] == expected {
                return status;
            }
            std::thread::sleep(Duration::from_millis(200));
        }
        panic!(
            "{id} did not reach status '{expected}' after 10s: {}",
            self.get_status(id)
        );
    }

    /// Wait for a specific duration
    pub fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    /// Read the portwarden log file
    pub fn read_logs(&self) -> String {
        fs::read_to_string(self.state_dir().join("logs").join("portwarden.log"))
            .unwrap_or_default()
    }

    /// Stop every server this env started
    pub fn cleanup(&self) {
        for id in self.started.borrow().iter() {
            let _ = self.run_command(&["stop", id]);
        }
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// A port nothing is listening on right now
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Whether `python3` can be run; the OS-level tests need it to bind ports
pub fn python3_available() -> bool {
    Command::new("python3")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// A command line that serves HTTP on `port`
pub fn http_server_cmd(port: u16) -> String {
    format!("python3 -m http.server {port} --bind 127.0.0.1")
}

/// Wait until something accepts connections on `port`
pub fn wait_for_listen(port: u16) {
    for _ in 0..50 {
        if std::net::TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    panic!("nothing listening on port {port} after 5s");
}
