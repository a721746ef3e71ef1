//! Game record server binary.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tictactoe_live::remote::MemoryStore;
use tictactoe_live::server;
use tokio::net::TcpListener;
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port } => run_server(host, port).await,
    }
}

/// Binds and runs the HTTP game record server.
#[instrument]
async fn run_server(host: String, port: u16) -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let listener = TcpListener::bind((host.as_str(), port)).await?;
    info!(host, port, "Starting game record server");
    server::serve(listener, MemoryStore::default()).await?;
    Ok(())
}
