//! Custom diagnostic error types for rich error reporting via miette.
//!
//! `ServerError` is the reconciliation taxonomy: every failure the orchestrator
//! can turn into a structured outcome. `FileError` and `ConfigParseError`
//! cover the configuration store.

// False positive: fields are used in #[error] format strings and miette derive macros
#![allow(unused_assignments)]

use itertools::Itertools;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A single PID that could not be signalled.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TerminateFailure {
    pub pid: u32,
    pub reason: String,
}

impl std::fmt::Display for TerminateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pid {}: {}", self.pid, self.reason)
    }
}

/// Errors raised while reconciling a server's ports with live processes.
#[derive(Debug, Error, Diagnostic)]
pub enum ServerError {
    #[error("no configuration saved for '{id}'")]
    #[diagnostic(
        code(portwarden::server::configuration_missing),
        help("save one first: portwarden config set '{id}' --dir <path> --cmd <command> --port <port>")
    )]
    ConfigurationMissing { id: String },

    #[error("'{id}' has no valid port configured")]
    #[diagnostic(
        code(portwarden::server::no_ports),
        help("ports must be integers between 1 and 65535")
    )]
    NoPortsConfigured { id: String },

    #[error("working directory does not exist: {}", path.display())]
    #[diagnostic(
        code(portwarden::server::directory_not_found),
        help("create the directory or update the server's configured directory")
    )]
    DirectoryNotFound { path: PathBuf },

    #[error("port {port} is still in use by pid(s) {} after termination", pids.iter().join(", "))]
    #[diagnostic(
        code(portwarden::port::still_bound),
        help("the process may ignore SIGTERM; retry, or stop it manually with: kill -9 <pid>")
    )]
    PortStillBound { port: u16, pids: Vec<u32> },

    #[error("'{id}' is not running")]
    #[diagnostic(code(portwarden::server::not_running))]
    NotRunning { id: String },

    #[error("failed to inspect port {port}: {message}")]
    #[diagnostic(
        code(portwarden::port::probe_failed),
        help("the OS socket table could not be read; check permissions on /proc or lsof")
    )]
    ProbeFailure { port: u16, message: String },

    #[error("failed to terminate {}", failures.iter().join("; "))]
    #[diagnostic(
        code(portwarden::process::terminate_failed),
        help("the process may belong to another user. Try: sudo kill <pid>")
    )]
    TerminateFailed { failures: Vec<TerminateFailure> },

    #[error("invalid command '{command}': {reason}")]
    #[diagnostic(code(portwarden::launch::invalid_command))]
    InvalidCommand { command: String, reason: String },

    #[error("failed to launch '{command}' in {}", dir.display())]
    #[diagnostic(code(portwarden::launch::spawn_failed))]
    LaunchFailed {
        command: String,
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ServerError {
    /// Short machine-readable name, used in structured outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::ConfigurationMissing { .. } => "configuration_missing",
            ServerError::NoPortsConfigured { .. } => "no_ports_configured",
            ServerError::DirectoryNotFound { .. } => "directory_not_found",
            ServerError::PortStillBound { .. } => "port_still_bound",
            ServerError::NotRunning { .. } => "not_running",
            ServerError::ProbeFailure { .. } => "probe_failure",
            ServerError::TerminateFailed { .. } => "terminate_failed",
            ServerError::InvalidCommand { .. } => "invalid_command",
            ServerError::LaunchFailed { .. } => "launch_failed",
        }
    }
}

/// Error for configuration store parse failures with source code highlighting.
#[derive(Debug, Error, Diagnostic)]
#[error("failed to parse server configuration")]
#[diagnostic(code(portwarden::config::parse_error))]
pub struct ConfigParseError {
    /// The source file contents for display
    #[source_code]
    pub src: NamedSource<String>,

    /// The location of the error in the source
    #[label("{message}")]
    pub span: SourceSpan,

    /// The error message from the parser
    pub message: String,

    /// Additional help text
    #[help]
    pub help: Option<String>,
}

impl ConfigParseError {
    /// Create a new ConfigParseError from a toml parse error
    pub fn from_toml_error(path: &std::path::Path, contents: String, err: toml::de::Error) -> Self {
        let message = err.message().to_string();
        let span = err
            .span()
            .map(|r| SourceSpan::from(r.start..r.end))
            .unwrap_or_else(|| SourceSpan::from(0..0));

        Self {
            src: NamedSource::new(path.display().to_string(), contents),
            span,
            message,
            help: Some("check TOML syntax at https://toml.io".to_string()),
        }
    }

    /// Create a new ConfigParseError from a serde_json error
    pub fn from_json_error(
        path: &std::path::Path,
        contents: String,
        err: serde_json::Error,
    ) -> Self {
        let offset = line_col_offset(&contents, err.line(), err.column());
        Self {
            src: NamedSource::new(path.display().to_string(), contents),
            span: SourceSpan::from(offset..offset),
            message: err.to_string(),
            help: None,
        }
    }
}

/// Byte offset of a 1-based line/column pair, clamped to the input length.
fn line_col_offset(contents: &str, line: usize, column: usize) -> usize {
    let line_start: usize = contents
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(contents.len())
}

/// Errors related to file operations on the server store.
#[derive(Debug, Error, Diagnostic)]
pub enum FileError {
    #[error("failed to read file: {}", path.display())]
    #[diagnostic(code(portwarden::file::read_error))]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write file: {}", path.display())]
    #[diagnostic(code(portwarden::file::write_error))]
    WriteError {
        path: PathBuf,
        #[help]
        details: Option<String>,
    },

    #[error("failed to serialize data for file: {}", path.display())]
    #[diagnostic(
        code(portwarden::file::serialize_error),
        help("this is likely an internal error; please report it")
    )]
    SerializeError { path: PathBuf, details: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_display() {
        let err = ServerError::ConfigurationMissing {
            id: "svc-a".to_string(),
        };
        assert_eq!(err.to_string(), "no configuration saved for 'svc-a'");

        let err = ServerError::PortStillBound {
            port: 5050,
            pids: vec![10, 11],
        };
        assert_eq!(
            err.to_string(),
            "port 5050 is still in use by pid(s) 10, 11 after termination"
        );
        assert_eq!(err.kind(), "port_still_bound");

        let err = ServerError::DirectoryNotFound {
            path: PathBuf::from("/tmp/missing"),
        };
        assert!(err.to_string().contains("/tmp/missing"));
    }

    #[test]
    fn test_terminate_failed_display() {
        let err = ServerError::TerminateFailed {
            failures: vec![
                TerminateFailure {
                    pid: 1,
                    reason: "EPERM".to_string(),
                },
                TerminateFailure {
                    pid: 2,
                    reason: "EPERM".to_string(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "failed to terminate pid 1: EPERM; pid 2: EPERM"
        );
    }

    #[test]
    fn test_config_parse_error() {
        let contents = "[servers.test]\ncommand = ".to_string();
        let err = toml::from_str::<toml::Value>(&contents).unwrap_err();
        let parse_err =
            ConfigParseError::from_toml_error(std::path::Path::new("servers.toml"), contents, err);

        assert!(parse_err.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_json_parse_error_offset() {
        let contents = "{\n  \"servers\": ,\n}".to_string();
        let err = serde_json::from_str::<serde_json::Value>(&contents).unwrap_err();
        let parse_err = ConfigParseError::from_json_error(
            std::path::Path::new("servers.json"),
            contents.clone(),
            err,
        );
        assert!(parse_err.span.offset() <= contents.len());
        assert!(parse_err.span.offset() > 0);
    }

    #[test]
    fn test_file_error_display() {
        let err = FileError::ReadError {
            path: PathBuf::from("/path/to/servers.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
        };
        assert!(err.to_string().contains("failed to read file"));
        assert!(err.to_string().contains("servers.toml"));
    }
}
