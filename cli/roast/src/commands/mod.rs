//! CLI commands.

mod list;
mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// roast - verify compute lifecycle behavior against a deployment.
#[derive(Debug, Parser)]
#[command(name = "roast")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "ROAST_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List scenarios and their tags.
    List(list::ListCommand),

    /// Run scenarios sequentially, one suite at a time.
    Run(run::RunCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        roast_testing::init_tracing(self.log_json);

        let ctx = CommandContext {
            format: self.format,
        };

        match self.command {
            Commands::List(cmd) => cmd.run(ctx),
            Commands::Run(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("roast {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub format: OutputFormat,
}
