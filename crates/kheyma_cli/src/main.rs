//! Command-line client for the Kheyma campsite booking service.
//! Sessions persist between invocations in a local state directory.

use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{Context, dispatch};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    let ctx = match Context::open(&cli).await {
        Ok(ctx) => ctx,
        Err(e) => {
            log::error!("❌ Failed to start: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = dispatch(cli.command, &ctx).await {
        log::error!("❌ {:#}", e);
        std::process::exit(1);
    }
}
