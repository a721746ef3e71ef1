//! Command-line interface for tictactoe_live.

use clap::{Parser, Subcommand};

/// Tic-tac-toe game record service
#[derive(Parser, Debug)]
#[command(name = "tictactoe_live")]
#[command(about = "Shared game record service for online tic-tac-toe", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game record server
    Serve {
        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}
