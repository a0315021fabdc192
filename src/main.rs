//! Binary entry point for the `agora` CLI.

mod cli;

use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    if let Err(e) = cli::execute(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
