//! Selfplay command - play games between two bots
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_match(), report_results()
//! - Level 3: play_single_game(), compute_match_statistics()
//! - Level 4: bots, formatting utilities


use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use yinsh_core::{GameState, Move, Outcome, Player, Variant};
use yinsh_mcts::{MctsConfig, MctsPlayer};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args, Clone, Debug)]
pub struct SelfplayArgs {
    /// Game variant: standard (3 rings to win) or blitz (1 ring)
    #[arg(long, default_value = "standard")]
    pub variant: Variant,

    /// Number of games to play (colors alternate)
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Bot playing white in odd-numbered games
    #[arg(long, value_enum, default_value = "mcts")]
    pub first: BotKind,

    /// Bot playing black in odd-numbered games
    #[arg(long, value_enum, default_value = "random")]
    pub second: BotKind,

    /// MCTS iterations per move
    #[arg(long, default_value = "1000")]
    pub iterations: u32,

    /// MCTS time limit per move, in seconds
    #[arg(long)]
    pub time_limit: Option<f64>,

    /// UCB1 exploration constant
    #[arg(long, default_value = "1.41")]
    pub exploration: f64,

    /// Leaves simulated together per MCTS batch
    #[arg(long, default_value = "1")]
    pub batch_size: usize,

    /// Maximum moves per game (placements included)
    #[arg(long, default_value = "400")]
    pub max_moves: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BotKind {
    Mcts,
    Random,
}

/// Result of a single game
#[derive(Clone, Debug)]
pub struct GameRecord {
    pub game_number: usize,
    pub white: BotKind,
    pub black: BotKind,
    /// None when the move cap was hit first
    pub outcome: Option<Outcome>,
    pub removed: [u8; 2],
    pub moves: Vec<Move>,
}

/// Aggregated match results
#[derive(Clone, Debug)]
pub struct MatchResults {
    pub games: Vec<GameRecord>,
    pub white_wins: usize,
    pub black_wins: usize,
    pub draws: usize,
    pub unfinished: usize,
    /// Wins of the `--first` bot regardless of color
    pub first_wins: usize,
    pub avg_moves: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run selfplay command
///
/// 1. Play the match (multiple games)
/// 2. Report results
pub fn run(args: SelfplayArgs, seed: Option<u64>) -> Result<()> {
    tracing::info!(
        "Starting selfplay: {:?} vs {:?} ({} games, {}, {} iterations)",
        args.first,
        args.second,
        args.games,
        args.variant,
        args.iterations
    );

    let results = play_match(&args, seed)?;

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Play all games in the match
pub fn play_match(args: &SelfplayArgs, seed: Option<u64>) -> Result<MatchResults> {
    let mut rng = create_rng(seed);
    let mut games = Vec::with_capacity(args.games);

    let progress = if args.json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(args.games as u64)
    };
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} games ({elapsed})")
            .context("Invalid progress bar template")?,
    );

    for game_num in 0..args.games {
        // Alternate colors for fairness
        let (white, black) = match first_seat(game_num + 1) {
            Player::White => (args.first, args.second),
            Player::Black => (args.second, args.first),
        };

        let record = play_single_game(white, black, game_num + 1, args, &mut rng)?;

        tracing::info!(
            "Game {}: {} ({} moves)",
            record.game_number,
            outcome_label(record.outcome),
            record.moves.len()
        );

        games.push(record);
        progress.inc(1);
    }
    progress.finish_and_clear();

    Ok(compute_match_statistics(games))
}

/// Report match results
fn report_results(results: &MatchResults, args: &SelfplayArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results, args);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play a single game between two bots
fn play_single_game(
    white: BotKind,
    black: BotKind,
    game_number: usize,
    args: &SelfplayArgs,
    rng: &mut ChaCha8Rng,
) -> Result<GameRecord> {
    let mut white_bot = Bot::new(white, args, rng.gen());
    let mut black_bot = Bot::new(black, args, rng.gen());

    let mut state = GameState::new_game(args.variant);
    let mut moves = Vec::new();

    while !state.is_over() && moves.len() < args.max_moves {
        let bot = match state.next_player() {
            Player::White => &mut white_bot,
            Player::Black => &mut black_bot,
        };
        let mv = bot.choose(&state, rng)?;
        state
            .make_move(mv)
            .with_context(|| format!("Bot chose an illegal move: {}", mv))?;
        state.resolve_rows_randomly(rng);
        moves.push(mv);
    }

    Ok(GameRecord {
        game_number,
        white,
        black,
        outcome: state.outcome(),
        removed: [
            state.removed_rings(Player::White),
            state.removed_rings(Player::Black),
        ],
        moves,
    })
}

/// Compute aggregate statistics from game records
fn compute_match_statistics(games: Vec<GameRecord>) -> MatchResults {
    let white_wins = count_where(&games, |g| g.outcome == Some(Outcome::Win(Player::White)));
    let black_wins = count_where(&games, |g| g.outcome == Some(Outcome::Win(Player::Black)));
    let draws = count_where(&games, |g| g.outcome == Some(Outcome::Draw));
    let unfinished = count_where(&games, |g| g.outcome.is_none());
    let first_wins = count_where(&games, |g| {
        g.outcome.and_then(Outcome::winner) == Some(first_seat(g.game_number))
    });

    let total_moves: usize = games.iter().map(|g| g.moves.len()).sum();
    let avg_moves = if games.is_empty() {
        0.0
    } else {
        total_moves as f32 / games.len() as f32
    };

    MatchResults {
        games,
        white_wins,
        black_wins,
        draws,
        unfinished,
        first_wins,
        avg_moves,
    }
}

// ============================================================================
// LEVEL 4 - BOTS AND UTILITIES
// ============================================================================

enum Bot {
    Mcts(MctsPlayer),
    Random,
}

impl Bot {
    fn new(kind: BotKind, args: &SelfplayArgs, seed: u64) -> Self {
        match kind {
            BotKind::Mcts => {
                let mut config = MctsConfig::default()
                    .with_iterations(args.iterations)
                    .with_exploration(args.exploration)
                    .with_batch_size(args.batch_size)
                    .with_seed(seed);
                if let Some(secs) = args.time_limit {
                    config = config.with_time_budget_secs(secs);
                }
                Bot::Mcts(MctsPlayer::new(config))
            }
            BotKind::Random => Bot::Random,
        }
    }

    fn choose(&mut self, state: &GameState, rng: &mut ChaCha8Rng) -> Result<Move> {
        match self {
            Bot::Mcts(player) => Ok(player.best_move(state)?),
            Bot::Random => {
                let moves: Vec<Move> = state.legal_moves().collect();
                moves.choose(rng).copied().context("No legal moves")
            }
        }
    }
}

/// Color of the `--first` bot in 1-based game `game_number`
fn first_seat(game_number: usize) -> Player {
    if game_number % 2 == 1 {
        Player::White
    } else {
        Player::Black
    }
}

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn count_where(games: &[GameRecord], f: impl Fn(&GameRecord) -> bool) -> usize {
    games.iter().filter(|g| f(g)).count()
}

fn outcome_label(outcome: Option<Outcome>) -> &'static str {
    match outcome {
        Some(Outcome::Win(Player::White)) => "white",
        Some(Outcome::Win(Player::Black)) => "black",
        Some(Outcome::Draw) => "draw",
        None => "unfinished",
    }
}

fn percent(n: usize, total: usize) -> f32 {
    if total > 0 {
        n as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

/// Print results as JSON
fn print_json_results(results: &MatchResults) {
    #[derive(Serialize)]
    struct JsonGame {
        game_number: usize,
        white: BotKind,
        black: BotKind,
        result: &'static str,
        moves: usize,
        removed_white: u8,
        removed_black: u8,
    }

    #[derive(Serialize)]
    struct JsonOutput {
        total_games: usize,
        white_wins: usize,
        black_wins: usize,
        draws: usize,
        unfinished: usize,
        first_wins: usize,
        avg_moves: f32,
        games: Vec<JsonGame>,
    }

    let output = JsonOutput {
        total_games: results.games.len(),
        white_wins: results.white_wins,
        black_wins: results.black_wins,
        draws: results.draws,
        unfinished: results.unfinished,
        first_wins: results.first_wins,
        avg_moves: results.avg_moves,
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                white: g.white,
                black: g.black,
                result: outcome_label(g.outcome),
                moves: g.moves.len(),
                removed_white: g.removed[0],
                removed_black: g.removed[1],
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text
fn print_text_results(results: &MatchResults, args: &SelfplayArgs) {
    let total = results.games.len();

    println!("\n=== Selfplay Results ===");
    println!("Total games: {}", total);
    println!(
        "White wins:  {} ({:.1}%)",
        results.white_wins,
        percent(results.white_wins, total)
    );
    println!(
        "Black wins:  {} ({:.1}%)",
        results.black_wins,
        percent(results.black_wins, total)
    );
    println!("Draws:       {} ({:.1}%)", results.draws, percent(results.draws, total));
    println!("Unfinished:  {}", results.unfinished);
    println!(
        "{:?} wins:   {} ({:.1}%)",
        args.first,
        results.first_wins,
        percent(results.first_wins, total)
    );
    println!("Avg moves:   {:.1}", results.avg_moves);

    println!("\nGame details:");
    for game in &results.games {
        println!(
            "  Game {}: {:?} (white) vs {:?} (black): {} in {} moves, rings {}-{}",
            game.game_number,
            game.white,
            game.black,
            outcome_label(game.outcome),
            game.moves.len(),
            game.removed[0],
            game.removed[1]
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
