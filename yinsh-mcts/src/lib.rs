//! YINSH MCTS - Monte Carlo Tree Search
//!
//! This crate provides the move-search bot:
//! - Tree policy (UCB1) over an arena tree with lazily materialized states
//! - Uniform random rollouts with random row resolution
//! - Backpropagation up to the root
//! - Optional batched rollouts with virtual loss (rayon with `parallel`)

pub mod rollout;
pub mod search;
pub mod tree;

use std::time::Duration;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use yinsh_core::{GameState, Move};

pub use rollout::{cpu_rollout, DrawPolicy, RolloutEngine, RolloutResult};
pub use search::{search, search_move, MoveStatistics, SearchError, SearchResult};
pub use tree::{MctsNode, MctsTree, NodeId, NodeStats};

/// MCTS configuration
#[derive(Clone, Debug)]
pub struct MctsConfig {
    /// Maximum iterations per search
    pub iterations: u32,
    /// Wall-clock budget per search (None = iterations only)
    pub time_limit: Option<Duration>,
    /// UCB1 exploration constant
    pub exploration: f64,
    /// Leaves simulated together; 1 = plain sequential MCTS
    pub batch_size: usize,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
    pub draw_policy: DrawPolicy,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            time_limit: None,
            exploration: 1.41, // sqrt(2)
            batch_size: 1,
            seed: None,
            draw_policy: DrawPolicy::RandomWinner,
        }
    }
}

impl MctsConfig {
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Time budget in seconds. Negative budgets clamp to zero; NaN, infinite,
    /// or unrepresentable budgets mean no time limit.
    pub fn with_time_budget_secs(mut self, seconds: f64) -> Self {
        self.time_limit = if seconds.is_nan() {
            None
        } else {
            Duration::try_from_secs_f64(seconds.max(0.0)).ok()
        };
        self
    }

    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_draw_policy(mut self, draw_policy: DrawPolicy) -> Self {
        self.draw_policy = draw_policy;
        self
    }
}

/// MCTS player with its own seeded randomness source
pub struct MctsPlayer {
    config: MctsConfig,
    rng: ChaCha8Rng,
}

impl MctsPlayer {
    pub fn new(config: MctsConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { config, rng }
    }

    /// Full search result for `state`
    pub fn search(&mut self, state: &GameState) -> Result<SearchResult, SearchError> {
        search::search(state, &self.config, &mut self.rng)
    }

    /// Get best move using MCTS
    pub fn best_move(&mut self, state: &GameState) -> Result<Move, SearchError> {
        self.search(state)?
            .best_move()
            .ok_or(SearchError::NoLegalMoves)
    }

    /// Apply the best move to `state` and resolve any rows it creates
    pub fn play_turn(&mut self, state: &mut GameState) -> Result<Move, SearchError> {
        let mv = self.best_move(state)?;
        state.make_move(mv)?;
        state.resolve_rows_randomly(&mut self.rng);
        Ok(mv)
    }

    /// Play a full game against itself, stopping after `max_moves` plies
    pub fn play_game(
        &mut self,
        initial: GameState,
        max_moves: u32,
    ) -> Result<(GameState, Vec<Move>), SearchError> {
        let mut state = initial;
        let mut history = Vec::new();

        while !state.is_over() && (history.len() as u32) < max_moves {
            history.push(self.play_turn(&mut state)?);
        }

        debug!(moves = history.len(), outcome = ?state.outcome(), "self-play game finished");
        Ok((state, history))
    }
}
