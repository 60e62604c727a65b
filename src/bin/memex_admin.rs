//! Binary entry point for the `memex-admin` CLI.

use clap::Parser;
use memex::cli::Cli;

#[tokio::main]
async fn main() {
    if let Err(e) = memex::logging::init_default() {
        eprintln!("failed to initialize logging: {e}");
    }

    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("error: {e} ({})", e.kind());
        std::process::exit(1);
    }
}
