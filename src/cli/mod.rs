use crate::Result;
use clap::Parser;
use serde::Serialize;

mod config;
mod list;
mod restart;
mod serve;
mod start;
mod status;
mod stop;

#[derive(Debug, clap::Parser)]
#[clap(name = "portwarden", version, about = env!("CARGO_PKG_DESCRIPTION"))]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    Config(config::Config),
    List(list::List),
    Restart(restart::Restart),
    Serve(serve::Serve),
    Start(start::Start),
    Status(status::Status),
    Stop(stop::Stop),
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    match args.command {
        Commands::Config(config) => config.run().await,
        Commands::List(list) => list.run().await,
        Commands::Restart(restart) => restart.run().await,
        Commands::Serve(serve) => serve.run().await,
        Commands::Start(start) => start.run().await,
        Commands::Status(status) => status.run().await,
        Commands::Stop(stop) => stop.run().await,
    }
}

/// Print an operation's outcome and exit non-zero when it did not succeed.
fn finish<T: Serialize>(outcome: &T, ok: bool, message: &str, json: bool) -> Result<()> {
    if json {
        print_json(outcome)?;
    } else if ok {
        println!("{message}");
    } else {
        eprintln!("{} {message}", console::style("portwarden").red().bold());
    }
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| miette::miette!("failed to serialize output: {e}"))?;
    println!("{out}");
    Ok(())
}
