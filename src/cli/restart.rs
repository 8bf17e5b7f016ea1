use crate::Result;
use crate::supervisor::SUPERVISOR;

/// Restarts a server
#[derive(Debug, clap::Args)]
#[clap(
    verbatim_doc_comment,
    long_about = "\
Restarts a server

Works exactly like 'portwarden start': whatever holds the server's ports is
terminated and the configured command is launched again. The message says
\"Restarted\" when something had to be replaced.

Examples:
  portwarden restart api
  portwarden restart api --json"
)]
pub struct Restart {
    /// Identity of the server to restart
    id: String,
    /// Print the outcome as JSON
    #[clap(long)]
    json: bool,
}

impl Restart {
    pub async fn run(&self) -> Result<()> {
        let outcome = SUPERVISOR.restart(&self.id).await;
        super::finish(&outcome, outcome.ok, &outcome.message, self.json)
    }
}
