mod analysis;
mod auth;
mod cli;
mod error;
mod insights;
mod models;
mod providers;
mod session;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting MailLens - Email Campaign Insights Tool");
    cli.execute().await?;

    Ok(())
}
