use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod cli;
mod config;
mod content;
mod handlers;
mod helpers;
mod rate_limit;
mod router;
mod schemas;
mod storage;

mod openapi_tests;
mod test_utils;

use cli::Cli;

/// Main entry point for the dialysis directory.
#[tokio::main]
async fn main() -> Result<()> {
    // Environment first so clap sees values from .env
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dialysis_directory=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    cli.run().await?;

    Ok(())
}
