use crate::Result;
use crate::error::ServerError;
use crate::supervisor::SUPERVISOR;
use itertools::Itertools;

/// Show the saved configuration of a server
#[derive(Debug, clap::Args)]
#[clap(
    verbatim_doc_comment,
    long_about = "\
Show the saved configuration of a server

Examples:
  portwarden config get api
  portwarden config get api --json

Output:
  directory: /srv/api
  command: npm run dev
  ports: 3000, 3001"
)]
pub struct Get {
    /// Identity of the server
    id: String,
    /// Print the configuration as JSON
    #[clap(long)]
    json: bool,
}

impl Get {
    pub async fn run(&self) -> Result<()> {
        let Some(config) = SUPERVISOR.store().load(&self.id)? else {
            return Err(ServerError::ConfigurationMissing {
                id: self.id.clone(),
            }
            .into());
        };
        if self.json {
            return crate::cli::print_json(&config);
        }
        println!("directory: {}", config.directory.display());
        println!("command: {}", config.command);
        println!("ports: {}", config.ports.iter().join(", "));
        Ok(())
    }
}
