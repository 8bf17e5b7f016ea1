use crate::Result;
use crate::supervisor::SUPERVISOR;

/// Frees a server's ports and launches it
#[derive(Debug, clap::Args)]
#[clap(
    visible_alias = "s",
    verbatim_doc_comment,
    long_about = "\
Frees a server's ports and launches it

Anything already listening on one of the server's configured ports is sent
SIGTERM first, whether or not portwarden started it. If a port is still in
use after the settle delay, nothing is launched.

The server is started detached, so it keeps running after portwarden exits.

Examples:
  portwarden start api
  portwarden start api --json   Print the outcome as JSON"
)]
pub struct Start {
    /// Identity of the server to start
    id: String,
    /// Print the outcome as JSON
    #[clap(long)]
    json: bool,
}

impl Start {
    pub async fn run(&self) -> Result<()> {
        let outcome = SUPERVISOR.start(&self.id).await;
        super::finish(&outcome, outcome.ok, &outcome.message, self.json)
    }
}
