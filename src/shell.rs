//! Shell abstraction for launching configured commands
//!
//! Commands are stored as a single command line. `CommandLine` validates the
//! line with POSIX quoting rules and decides how it is handed to the shell;
//! `Shell` knows how to invoke each supported interpreter.

use crate::error::ServerError;

/// Supported shell types for command execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(clippy::enum_variant_names)] // PowerShell is the correct name for this shell
pub enum Shell {
    /// POSIX-compatible shell (default on Unix)
    #[default]
    Sh,
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Windows Command Prompt
    Cmd,
    /// PowerShell (cross-platform)
    #[serde(alias = "pwsh")]
    PowerShell,
}

impl Shell {
    /// Returns the default shell for the current platform
    #[cfg(unix)]
    pub fn default_for_platform() -> Self {
        Shell::Sh
    }

    /// Returns the default shell for the current platform
    #[cfg(windows)]
    pub fn default_for_platform() -> Self {
        Shell::Cmd
    }

    /// Returns the shell program name/path
    pub fn program(&self) -> &'static str {
        match self {
            Shell::Sh => "sh",
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Cmd => "cmd",
            Shell::PowerShell => {
                // pwsh is the cross-platform PowerShell, powershell is Windows-only
                #[cfg(windows)]
                {
                    "powershell"
                }
                #[cfg(not(windows))]
                {
                    "pwsh"
                }
            }
        }
    }

    /// Whether the shell understands POSIX `exec`.
    pub fn is_posix(&self) -> bool {
        matches!(self, Shell::Sh | Shell::Bash | Shell::Zsh)
    }

    /// Returns the arguments needed to execute a command string
    pub fn exec_args(&self, command: &str) -> Vec<String> {
        match self {
            Shell::Sh | Shell::Bash | Shell::Zsh => {
                vec!["-c".to_string(), command.to_string()]
            }
            Shell::Cmd => {
                vec!["/C".to_string(), command.to_string()]
            }
            Shell::PowerShell => {
                vec!["-Command".to_string(), command.to_string()]
            }
        }
    }

    /// Creates a tokio Command configured to run the given command line
    pub fn command(&self, cmd: &CommandLine) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(self.program());
        command.args(self.exec_args(&cmd.script(*self)));
        command
    }
}

impl std::fmt::Display for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shell::Sh => write!(f, "sh"),
            Shell::Bash => write!(f, "bash"),
            Shell::Zsh => write!(f, "zsh"),
            Shell::Cmd => write!(f, "cmd"),
            Shell::PowerShell => write!(f, "powershell"),
        }
    }
}

impl std::str::FromStr for Shell {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sh" => Ok(Shell::Sh),
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            "cmd" => Ok(Shell::Cmd),
            "powershell" | "pwsh" => Ok(Shell::PowerShell),
            _ => Err(format!("unknown shell: {s}")),
        }
    }
}

/// Characters that make a command line more than a single program invocation.
const SHELL_OPERATORS: &[char] = &[';', '&', '|', '<', '>', '`', '$', '(', ')', '\n'];

/// A validated command line.
///
/// Parsing follows POSIX word rules (quotes and backslash escapes), so
/// `node "my server.js"` is two words, not three. The line itself is still
/// executed by the shell; the words are only used for validation and for
/// deciding whether the shell can `exec` straight into the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    raw: String,
    words: Vec<String>,
    compound: bool,
}

impl CommandLine {
    pub fn parse(raw: &str) -> Result<Self, ServerError> {
        let trimmed = raw.trim();
        let words = shell_words::split(trimmed).map_err(|e| ServerError::InvalidCommand {
            command: raw.to_string(),
            reason: e.to_string(),
        })?;
        if words.is_empty() {
            return Err(ServerError::InvalidCommand {
                command: raw.to_string(),
                reason: "command is empty".to_string(),
            });
        }
        let compound = trimmed.contains(SHELL_OPERATORS);
        Ok(Self {
            raw: trimmed.to_string(),
            words,
            compound,
        })
    }

    pub fn program(&self) -> &str {
        &self.words[0]
    }

    pub fn args(&self) -> &[String] {
        &self.words[1..]
    }

    /// True when the line uses pipes, redirection, substitution or chaining.
    pub fn is_compound(&self) -> bool {
        self.compound
    }

    /// The script handed to the shell. Simple commands are prefixed with
    /// `exec` on POSIX shells so the launched PID is the program itself.
    /// Leading `NAME=value` words are kept in front of the `exec` so they
    /// still apply to the program's environment.
    pub fn script(&self, shell: Shell) -> String {
        if !shell.is_posix() || self.compound {
            return self.raw.clone();
        }
        let n = self
            .words
            .iter()
            .take_while(|w| is_assignment(w))
            .count();
        match self.words.get(n).map(String::as_str) {
            None | Some("exec") => self.raw.clone(),
            Some(_) if n == 0 => format!("exec {}", self.raw),
            Some(_) => {
                let env = self.words[..n]
                    .iter()
                    .filter_map(|w| w.split_once('='))
                    .map(|(name, value)| format!("{name}={}", shell_words::quote(value)))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("{env} exec {}", shell_words::join(&self.words[n..]))
            }
        }
    }
}

/// A POSIX variable assignment word such as `PORT=5050`.
fn is_assignment(word: &str) -> bool {
    let Some((name, _)) = word.split_once('=') else {
        return false;
    };
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
