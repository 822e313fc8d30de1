//! newsdigest CLI: daily digest of English newsletters and blogs.
//!
//! Polls RSS/Atom sources, enriches new articles with an AI backend, and
//! publishes two RSS feeds plus a static HTML page.

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
