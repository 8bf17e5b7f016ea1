use crate::Result;
use crate::env;

/// Serve the JSON API for the four server operations
#[derive(Debug, clap::Args)]
#[clap(
    verbatim_doc_comment,
    long_about = "\
Serve the JSON API for the four server operations

Binds to 127.0.0.1 only. Endpoints:
  GET  /health
  GET  /api/servers
  GET  /api/status?id=<id>
  POST /api/start    {\"id\": \"<id>\"}
  POST /api/stop     {\"id\": \"<id>\"}
  POST /api/restart  {\"id\": \"<id>\"}
  GET  /api/config?id=<id>
  POST /api/config   {\"id\", \"directory\", \"command\", \"ports\"}

Examples:
  portwarden serve
  portwarden serve --port 8080"
)]
pub struct Serve {
    /// Port to listen on (defaults to PORTWARDEN_WEB_PORT or 3120)
    #[clap(long, short)]
    port: Option<u16>,
}

impl Serve {
    pub async fn run(&self) -> Result<()> {
        let port = self.port.unwrap_or(*env::PORTWARDEN_WEB_PORT);
        crate::web::serve(port).await
    }
}
