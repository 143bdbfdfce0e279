//! State commands - inspect and search serialized game states
//!
//! - `new`: print a fresh game in the wire format
//! - `moves`: list the legal moves of a state file
//! - `search`: run MCTS on a state file and report the chosen move

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use yinsh_core::{GameState, Move, Variant, WireState};
use yinsh_mcts::{MctsConfig, MctsPlayer, SearchResult};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args, Clone, Debug)]
pub struct StateArgs {
    /// Game state JSON file (wire format)
    #[arg(long, value_name = "FILE")]
    pub state: PathBuf,
}

#[derive(Args, Clone, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub input: StateArgs,

    /// Maximum MCTS iterations
    #[arg(long, default_value = "1000")]
    pub iterations: u32,

    /// Time limit in seconds
    #[arg(long, default_value = "10")]
    pub time_limit: f64,

    /// UCB1 exploration constant
    #[arg(long, default_value = "1.41")]
    pub exploration: f64,

    /// Leaves simulated together per batch
    #[arg(long, default_value = "1")]
    pub batch_size: usize,

    /// Number of root moves to list
    #[arg(long, default_value = "5")]
    pub top: usize,

    /// Output the move and resulting state as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// COMMANDS
// ============================================================================

pub fn run_new(variant: Variant) -> Result<()> {
    println!("{}", GameState::new_game(variant).to_json());
    Ok(())
}

pub fn run_moves(args: StateArgs) -> Result<()> {
    let state = load_state(&args.state)?;

    println!("{}", state.board());
    println!(
        "{} to move ({}, {})",
        state.next_player(),
        state.variant(),
        if state.requires_setup() { "setup" } else { "play" }
    );
    if let Some(outcome) = state.outcome() {
        println!("Game over: {:?}", outcome);
        return Ok(());
    }

    let moves: Vec<Move> = state.legal_moves().collect();
    println!("{} legal moves:", moves.len());
    for mv in &moves {
        println!("  {}", mv);
    }
    Ok(())
}

pub fn run_search(args: SearchArgs, seed: Option<u64>) -> Result<()> {
    let state = load_state(&args.input.state)?;

    let mut config = MctsConfig::default()
        .with_iterations(args.iterations)
        .with_time_budget_secs(args.time_limit)
        .with_exploration(args.exploration)
        .with_batch_size(args.batch_size);
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    tracing::info!(
        "Searching {} to move ({} iterations, {:.1}s budget)",
        state.next_player(),
        args.iterations,
        args.time_limit
    );

    let mut player = MctsPlayer::new(config);
    let result = player.search(&state).context("Search failed")?;
    let best = result.best_move().context("Search produced no move")?;

    if args.json {
        print_json_result(&state, best)?;
    } else {
        print_text_result(&result, best, args.top);
    }
    Ok(())
}

// ============================================================================
// UTILITIES
// ============================================================================

pub fn load_state(path: &Path) -> Result<GameState> {
    GameState::load(path)
        .inspect_err(|e| tracing::warn!("Rejected state file {}: {}", path.display(), e))
        .with_context(|| format!("Failed to load game state: {}", path.display()))
}

/// The chosen move plus the state right after it, rows still on the board
#[derive(Serialize)]
struct JsonSearch {
    #[serde(rename = "move")]
    mv: Move,
    state: WireState,
}

fn print_json_result(state: &GameState, best: Move) -> Result<()> {
    let after = state.apply_move(best).context("Chosen move was rejected")?;
    let output = JsonSearch {
        mv: best,
        state: after.to_wire_with_rows(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text_result(result: &SearchResult, best: Move, top: usize) {
    println!(
        "Best move: {} ({} iterations in {:.2}s, {} nodes)",
        best,
        result.iterations,
        result.elapsed.as_secs_f64(),
        result.tree.len()
    );
    if let Some(greedy) = result.highest_winrate_move().filter(|&mv| mv != best) {
        println!("Highest win rate: {}", greedy);
    }

    let mut stats: Vec<_> = result.move_stats.iter().collect();
    stats.sort_by(|a, b| b.visits.cmp(&a.visits));
    for s in stats.into_iter().take(top) {
        println!(
            "  {:<28} visits {:>6}  win rate {:.3}",
            s.mv.to_string(),
            s.visits,
            s.win_rate
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_state_reports_path() {
        let err = load_state(Path::new("/nonexistent/state.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/state.json"));
    }

    #[test]
    fn test_json_search_shape() {
        let state = GameState::new_game(Variant::Standard);
        let output = JsonSearch {
            mv: Move::place(yinsh_core::Hex::ORIGIN),
            state: state.apply_move(Move::place(yinsh_core::Hex::ORIGIN)).unwrap().to_wire_with_rows(),
        };
        let value = serde_json::to_value(&output).unwrap();
        assert!(value.get("move").is_some());
        assert_eq!(value["state"]["color"], "b");
        assert_eq!(value["state"]["grid"]["0"], 1);
    }
}
