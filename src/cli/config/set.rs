use crate::Result;
use crate::error::FileError;
use crate::server_config::ServerConfig;
use crate::shell::CommandLine;
use crate::supervisor::SUPERVISOR;
use miette::{bail, ensure};
use std::path::PathBuf;

/// Save the configuration of a server
#[derive(Debug, clap::Args)]
#[clap(
    visible_alias = "add",
    verbatim_doc_comment,
    long_about = "\
Save the configuration of a server

Replaces any configuration already saved under the same identity. The
identity is an opaque name, usually the URL the server answers on.

Examples:
  portwarden config set api --port 3000 --cmd 'npm run dev'
                                Run 'npm run dev' in the current directory
  portwarden config set api --dir ~/src/api --port 3000 -- npm run dev
                                Command given as trailing arguments
  portwarden config set http://localhost:5173 --port 5173,24678 --cmd 'vite'
                                Several ports; all of them are reclaimed on start"
)]
pub struct Set {
    /// Identity of the server
    id: String,
    /// Command to run (can also be given as trailing arguments)
    #[clap(long)]
    cmd: Option<String>,
    /// Arguments of the command (alternative to --cmd)
    #[clap(allow_hyphen_values = true, trailing_var_arg = true)]
    args: Vec<String>,
    /// Working directory (defaults to the current directory)
    #[clap(long)]
    dir: Option<PathBuf>,
    /// Port the server listens on (repeatable, or comma separated)
    #[clap(long = "port", short, value_delimiter = ',', required = true)]
    ports: Vec<u16>,
}

impl Set {
    pub async fn run(&self) -> Result<()> {
        let command = if let Some(ref cmd) = self.cmd {
            cmd.clone()
        } else if !self.args.is_empty() {
            shell_words::join(&self.args)
        } else {
            bail!("Either --cmd or command arguments must be provided");
        };
        CommandLine::parse(&command)?;

        let cwd = std::env::current_dir().map_err(|e| FileError::ReadError {
            path: ".".into(),
            source: e,
        })?;
        let directory = match &self.dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd.join(dir),
            None => cwd,
        };
        let config = ServerConfig::new(directory, command, self.ports.iter().copied());
        ensure!(
            !config.ports.is_empty(),
            "at least one port between 1 and 65535 is required"
        );
        if !config.directory.is_dir() {
            warn!(
                "{} does not exist yet; start will fail until it does",
                config.directory.display()
            );
        }

        let store = SUPERVISOR.store();
        store.save(&self.id, &config)?;
        println!("saved {} to {}", self.id, store.path().display());
        Ok(())
    }
}
