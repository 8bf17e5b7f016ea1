use crate::Result;
use crate::supervisor::SUPERVISOR;

/// Remove a server from the store
///
/// A running server is left alone; stop it first if it should go away too.
#[derive(Debug, clap::Args)]
#[clap(visible_alias = "rm", verbatim_doc_comment)]
pub struct Remove {
    /// Identity of the server to remove
    id: String,
}

impl Remove {
    pub async fn run(&self) -> Result<()> {
        let store = SUPERVISOR.store();
        if store.remove(&self.id)? {
            println!("removed {} from {}", self.id, store.path().display());
        } else {
            warn!("{} not found in {}", self.id, store.path().display());
        }
        Ok(())
    }
}
