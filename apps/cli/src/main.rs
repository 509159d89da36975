//! SalesETL CLI: run the sales extract/transform/load pipeline.

mod commands;
mod logging;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::run(cli).await
}
