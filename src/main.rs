//! proofloop CLI entry point.

use clap::Parser;

use proofloop::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init(args) => proofloop::cli::commands::init::execute(args, cli.json).await,
        Commands::Run(args) => {
            proofloop::cli::commands::run::execute(args, cli.config, cli.json).await
        }
        Commands::Serve(args) => proofloop::cli::commands::serve::execute(args, cli.config).await,
    };

    if let Err(err) = result {
        proofloop::cli::handle_error(err, cli.json);
    }
}
