use crate::Result;
use crate::supervisor::SUPERVISOR;

mod get;
mod path;
mod remove;
mod set;

/// manage saved server configurations
///
/// without a subcommand, prints the path of the server store
#[derive(Debug, clap::Args)]
#[clap(visible_alias = "cfg", verbatim_doc_comment)]
pub struct Config {
    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    Get(get::Get),
    Path(path::Path),
    Remove(remove::Remove),
    Set(set::Set),
}

impl Config {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Some(Commands::Get(get)) => get.run().await,
            Some(Commands::Path(path)) => path.run().await,
            Some(Commands::Remove(remove)) => remove.run().await,
            Some(Commands::Set(set)) => set.run().await,
            None => {
                println!("{}", SUPERVISOR.store().path().display());
                Ok(())
            }
        }
    }
}
