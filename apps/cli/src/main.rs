//! RoleScout CLI — finance job-posting aggregation tool.
//!
//! Scrapes employer career boards through platform plug-ins and writes
//! normalized, LLM-enriched listings to CSV or the listings database.

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
