//! roast - runner for compute lifecycle scenarios.
//!
//! Lists the scenario table and runs a tag-filtered selection against a
//! live deployment or the in-memory control plane.

use anyhow::Result;
use clap::Parser;

mod commands;
mod error;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
