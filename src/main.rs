mod api_client;
mod config;
mod dates;
mod error;
mod input;
mod notifier;
mod query;
mod report;
mod runner;
mod sheet;
mod writer;

use clap::{Parser, Subcommand};
use config::Config;
use error::Error;
use log::error;

#[derive(Parser)]
#[command(about = "Reports budget performance for the child accounts listed in a spreadsheet")]
struct Args {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reads the Input sheet and appends budget rows to the Output sheet
    Run,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    env_logger::init();

    match &args.command {
        Command::Run => {
            if let Err(err) = runner::run_budget_report(args.config).await {
                error!("failed to report budgets: {}", err);
                std::process::exit(1);
            }
        }
    };

    Ok(())
}
