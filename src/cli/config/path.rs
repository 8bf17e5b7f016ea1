use crate::Result;
use crate::supervisor::SUPERVISOR;

/// Print the path of the server store
#[derive(Debug, clap::Args)]
#[clap(verbatim_doc_comment)]
pub struct Path {}

impl Path {
    pub async fn run(&self) -> Result<()> {
        println!("{}", SUPERVISOR.store().path().display());
        Ok(())
    }
}
