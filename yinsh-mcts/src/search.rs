//! MCTS Search Loop
//!
//! Implements the core MCTS algorithm:
//! 1. Selection - Use UCB1 to traverse tree, materializing the leaf's state
//! 2. Expansion - One child per legal move of the leaf
//! 3. Simulation - Random rollout from a copy of the leaf's state
//! 4. Backpropagation - Update statistics up to (not including) the root
//!
//! ## Architecture
//! - Level 2: Search loop coordination
//! - Level 3: Individual MCTS phases
//! - Level 4: Utilities

use std::time::{Duration, Instant};

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, trace};
use yinsh_core::{GameState, IllegalMove, Move};

use crate::rollout::RolloutEngine;
use crate::tree::{MctsTree, NodeId};
use crate::MctsConfig;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Game is over")]
    GameOver,

    #[error("No legal moves from the root state")]
    NoLegalMoves,

    #[error("Illegal move while expanding the tree: {0}")]
    IllegalMove(#[from] IllegalMove),
}

// ============================================================================
// SEARCH RESULT
// ============================================================================

/// Result of MCTS search
#[derive(Debug)]
pub struct SearchResult {
    /// The final tree after search
    pub tree: MctsTree,
    /// Completed iterations
    pub iterations: u32,
    pub elapsed: Duration,
    /// Statistics for each root move, in move-generation order
    pub move_stats: Vec<MoveStatistics>,
}

/// Statistics for a single move at root
#[derive(Clone, Debug)]
pub struct MoveStatistics {
    pub mv: Move,
    pub visits: u32,
    pub wins: u32,
    pub win_rate: f64,
    pub ucb1: f64,
}

impl SearchResult {
    /// Most visited move, ties broken by win rate
    pub fn best_move(&self) -> Option<Move> {
        self.tree.best_move()
    }

    pub fn highest_winrate_move(&self) -> Option<Move> {
        self.move_stats
            .iter()
            .max_by(|a, b| a.win_rate.total_cmp(&b.win_rate))
            .map(|s| s.mv)
    }

    /// All moves sorted by visits, most visited first
    pub fn moves_by_visits(&self) -> Vec<(Move, u32)> {
        let mut moves: Vec<_> = self.move_stats.iter().map(|s| (s.mv, s.visits)).collect();
        moves.sort_by(|a, b| b.1.cmp(&a.1));
        moves
    }
}

// ============================================================================
// ENTRY POINTS (Level 2 - Main Coordination)
// ============================================================================

/// Choose a move for the player to move in `state`.
///
/// Stops after `max_iterations` or once `max_seconds` have elapsed, whichever
/// comes first. `state` is never modified.
pub fn search_move(
    state: &GameState,
    max_iterations: u32,
    max_seconds: f64,
    exploration: f64,
) -> Result<Move, SearchError> {
    let config = MctsConfig::default()
        .with_iterations(max_iterations)
        .with_time_budget_secs(max_seconds)
        .with_exploration(exploration);
    let mut rng = ChaCha8Rng::from_entropy();

    let result = search(state, &config, &mut rng)?;
    result.best_move().ok_or(SearchError::NoLegalMoves)
}

/// Run MCTS from `state` with the given configuration and randomness source
pub fn search<R: Rng + ?Sized>(
    state: &GameState,
    config: &MctsConfig,
    rng: &mut R,
) -> Result<SearchResult, SearchError> {
    if !state.has_legal_moves() {
        return Err(SearchError::NoLegalMoves);
    }
    if state.is_over() {
        return Err(SearchError::GameOver);
    }

    let start = Instant::now();
    let mut tree = MctsTree::new(state.clone());
    tree.expand(tree.root());

    let engine = RolloutEngine::new(config.draw_policy);
    let iterations = if config.batch_size > 1 {
        run_batched_search(&mut tree, config, &engine, start, rng)?
    } else {
        run_sequential_search(&mut tree, config, &engine, start, rng)?
    };

    let elapsed = start.elapsed();
    let move_stats = collect_move_statistics(&tree, config.exploration);
    let result = SearchResult {
        tree,
        iterations,
        elapsed,
        move_stats,
    };

    debug!(
        iterations,
        elapsed_ms = elapsed.as_millis() as u64,
        nodes = result.tree.len(),
        best = ?result.best_move(),
        "search finished"
    );
    Ok(result)
}

fn out_of_time(config: &MctsConfig, start: Instant) -> bool {
    match config.time_limit {
        Some(limit) if start.elapsed() >= limit => {
            trace!(limit_ms = limit.as_millis() as u64, "time budget exhausted");
            true
        }
        _ => false,
    }
}

// ============================================================================
// SEQUENTIAL SEARCH (Level 3 - CPU Search)
// ============================================================================

/// Sequential MCTS (one simulation at a time)
fn run_sequential_search<R: Rng + ?Sized>(
    tree: &mut MctsTree,
    config: &MctsConfig,
    engine: &RolloutEngine,
    start: Instant,
    rng: &mut R,
) -> Result<u32, SearchError> {
    let mut done = 0;
    while done < config.iterations && !out_of_time(config, start) {
        run_single_iteration(tree, config.exploration, engine, rng)?;
        done += 1;
    }
    Ok(done)
}

/// Single MCTS iteration
fn run_single_iteration<R: Rng + ?Sized>(
    tree: &mut MctsTree,
    exploration: f64,
    engine: &RolloutEngine,
    rng: &mut R,
) -> Result<(), SearchError> {
    // Phase 1: Selection
    let leaf = tree.select_leaf(exploration);
    tree.materialize(leaf, rng)?;

    // Phase 2: Expansion (no-op for terminal nodes)
    tree.expand(leaf);

    // Phase 3: Simulation
    let winner = match tree.get(leaf).state.as_ref() {
        Some(state) => engine.simulate(state, rng),
        None => None,
    };

    // Phase 4: Backpropagation
    tree.backpropagate(leaf, winner);
    tree.record_root_visit();
    Ok(())
}

// ============================================================================
// BATCHED SEARCH (Level 3 - Parallel Rollouts)
// ============================================================================

/// Batched MCTS: select several leaves under virtual loss, then simulate them
/// together (on rayon with the `parallel` feature)
fn run_batched_search<R: Rng + ?Sized>(
    tree: &mut MctsTree,
    config: &MctsConfig,
    engine: &RolloutEngine,
    start: Instant,
    rng: &mut R,
) -> Result<u32, SearchError> {
    let mut done = 0;
    while done < config.iterations && !out_of_time(config, start) {
        let batch_size = config.batch_size.min((config.iterations - done) as usize);
        done += run_batch_iteration(tree, config.exploration, engine, batch_size, rng)?;
    }
    Ok(done)
}

fn run_batch_iteration<R: Rng + ?Sized>(
    tree: &mut MctsTree,
    exploration: f64,
    engine: &RolloutEngine,
    batch_size: usize,
    rng: &mut R,
) -> Result<u32, SearchError> {
    // Phase 1 + 2: Selection and expansion, with virtual losses
    let leaves = select_batch_leaves(tree, exploration, batch_size, rng)?;

    // Phase 3: Batch simulation
    let states: Vec<GameState> = leaves
        .iter()
        .filter_map(|&id| tree.get(id).state.clone())
        .collect();
    let winners = engine.rollout_batch(&states, rng.gen());

    // Phase 4: Backpropagation
    for &leaf in &leaves {
        tree.remove_virtual_loss(leaf);
    }
    let mut completed = 0;
    for (&leaf, winner) in leaves.iter().zip(winners) {
        tree.backpropagate(leaf, winner);
        tree.record_root_visit();
        completed += 1;
    }
    Ok(completed)
}

/// Select multiple leaves for batch processing
fn select_batch_leaves<R: Rng + ?Sized>(
    tree: &mut MctsTree,
    exploration: f64,
    batch_size: usize,
    rng: &mut R,
) -> Result<Vec<NodeId>, SearchError> {
    let mut leaves = Vec::with_capacity(batch_size);

    for _ in 0..batch_size {
        let leaf = tree.select_leaf(exploration);
        tree.materialize(leaf, rng)?;
        tree.expand(leaf);

        // Add virtual loss to steer the next selection elsewhere
        tree.add_virtual_loss(leaf);
        leaves.push(leaf);
    }

    Ok(leaves)
}

// ============================================================================
// STATISTICS COLLECTION (Level 4 - Utilities)
// ============================================================================

fn collect_move_statistics(tree: &MctsTree, exploration: f64) -> Vec<MoveStatistics> {
    let root = tree.get(tree.root());
    let parent_visits = root.stats.adjusted_visits();

    root.children
        .iter()
        .map(|&(mv, child_id)| {
            let stats = &tree.get(child_id).stats;
            MoveStatistics {
                mv,
                visits: stats.visits,
                wins: stats.wins,
                win_rate: stats.win_rate(),
                ucb1: tree.ucb1(child_id, parent_visits, exploration),
            }
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
