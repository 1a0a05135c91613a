//! numberscope CLI: phone-number enrichment from the terminal.
//!
//! Extracts phone numbers from free text, queries the configured lookup
//! providers and prints a sourced, risk-classified report per number.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
