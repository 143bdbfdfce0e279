//! Rollout (simulation) strategies for MCTS
//!
//! A rollout plays uniformly random legal moves, resolving every row with
//! uniformly random choices, until the game is over.
//!
//! ## Architecture
//! - Level 2: Batch rollout coordination
//! - Level 3: Single rollout implementation
//! - Level 4: Credit assignment

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use yinsh_core::{GameState, Outcome, Player};

// ============================================================================
// ROLLOUT RESULT
// ============================================================================

/// Result of a rollout simulation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RolloutResult {
    pub outcome: Outcome,
    /// Number of moves played
    pub moves_played: u32,
}

/// How a drawn simulation is credited during backpropagation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawPolicy {
    /// Pick a uniformly random winner
    #[default]
    RandomWinner,
    /// Count the visit, credit nobody
    NoCredit,
}

impl DrawPolicy {
    /// The player to credit for `outcome`
    pub fn credit<R: Rng + ?Sized>(self, outcome: Outcome, rng: &mut R) -> Option<Player> {
        match (outcome, self) {
            (Outcome::Win(player), _) => Some(player),
            (Outcome::Draw, DrawPolicy::RandomWinner) => {
                Some(if rng.gen_bool(0.5) { Player::White } else { Player::Black })
            }
            (Outcome::Draw, DrawPolicy::NoCredit) => None,
        }
    }
}

// ============================================================================
// CPU ROLLOUT (Level 3 - Single Rollout)
// ============================================================================

/// Play random moves from a copy of `state` until the game ends
pub fn cpu_rollout<R: Rng + ?Sized>(state: &GameState, rng: &mut R) -> RolloutResult {
    let mut current = state.clone();
    let mut moves_played = 0;

    while !current.is_over() {
        let legal_moves: Vec<_> = current.legal_moves().collect();
        let Some(&mv) = legal_moves.choose(rng) else {
            break;
        };
        if current.make_move(mv).is_err() {
            break;
        }
        current.resolve_rows_randomly(rng);
        moves_played += 1;
    }

    RolloutResult {
        outcome: current.outcome().unwrap_or(Outcome::Draw),
        moves_played,
    }
}

// ============================================================================
// BATCH ROLLOUT (Level 2 - Batch Coordination)
// ============================================================================

/// Runs rollouts and turns their outcomes into credited winners
#[derive(Clone, Copy, Debug, Default)]
pub struct RolloutEngine {
    draw_policy: DrawPolicy,
}

impl RolloutEngine {
    pub fn new(draw_policy: DrawPolicy) -> Self {
        Self { draw_policy }
    }

    /// One rollout; returns the credited winner
    pub fn simulate<R: Rng + ?Sized>(&self, state: &GameState, rng: &mut R) -> Option<Player> {
        let result = cpu_rollout(state, rng);
        self.draw_policy.credit(result.outcome, rng)
    }

    /// Rollouts for a batch of states.
    ///
    /// State `i` uses its own generator seeded with `seed + i`, so the result
    /// does not depend on whether the batch runs in parallel.
    pub fn rollout_batch(&self, states: &[GameState], seed: u64) -> Vec<Option<Player>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            states
                .par_iter()
                .enumerate()
                .map(|(i, state)| self.simulate_seeded(state, seed, i))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            states
                .iter()
                .enumerate()
                .map(|(i, state)| self.simulate_seeded(state, seed, i))
                .collect()
        }
    }

    fn simulate_seeded(&self, state: &GameState, seed: u64, index: usize) -> Option<Player> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(index as u64));
        self.simulate(state, &mut rng)
    }
}

// ============================================================================
// TESTS
// ============================================================================
