use crate::Result;
use crate::supervisor::SUPERVISOR;

/// Sends a stop signal to whatever holds a server's ports
#[derive(Debug, clap::Args)]
#[clap(
    visible_alias = "kill",
    verbatim_doc_comment,
    long_about = "\
Sends a stop signal to whatever holds a server's ports

Sends SIGTERM to every process listening on one of the server's configured
ports. Stopping a server that is not running exits with status 1.

Examples:
  portwarden stop api
  portwarden kill api           Same as 'stop' (alias)"
)]
pub struct Stop {
    /// Identity of the server to stop
    id: String,
    /// Print the outcome as JSON
    #[clap(long)]
    json: bool,
}

impl Stop {
    pub async fn run(&self) -> Result<()> {
        let outcome = SUPERVISOR.stop(&self.id).await;
        super::finish(&outcome, outcome.ok, &outcome.message, self.json)
    }
}
