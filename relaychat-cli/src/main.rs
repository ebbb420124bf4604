//! Main entry point for the relaychat CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;

mod commands;

/// relaychat CLI
#[derive(Parser)]
#[command(name = "relaychat")]
#[command(about = "Command-line client for an IRC-bridged chat backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the relaychat CLI
#[derive(Subcommand)]
enum Commands {
    /// List the chats the signed-in user participates in
    Chats(commands::chats::ChatsArgs),

    /// Join a chat, follow its timeline, and send stdin lines as messages
    Watch(commands::watch::WatchArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Chats(args) => commands::chats::run(args).await,
        Commands::Watch(args) => commands::watch::run(args).await,
    }
}
