//! YINSH CLI - Command-line interface
//!
//! Commands:
//! - selfplay: Play bot-vs-bot games
//! - search: Choose a move for a serialized state
//! - moves: List the legal moves of a serialized state
//! - new: Print a fresh game state

mod selfplay;
mod state_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use yinsh_core::Variant;

#[derive(Parser)]
#[command(name = "yinsh")]
#[command(about = "YINSH rules engine and MCTS bot")]
struct Cli {
    /// Random seed for reproducibility
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play bot-vs-bot games
    Selfplay(selfplay::SelfplayArgs),
    /// Run MCTS on a state file
    Search(state_cmd::SearchArgs),
    /// List the legal moves of a state file
    Moves(state_cmd::StateArgs),
    /// Print a new game state as JSON
    New {
        #[arg(long, default_value = "standard")]
        variant: Variant,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Selfplay(args) => selfplay::run(args, cli.seed),
        Commands::Search(args) => state_cmd::run_search(args, cli.seed),
        Commands::Moves(args) => state_cmd::run_moves(args),
        Commands::New { variant } => state_cmd::run_new(variant),
    }
}
