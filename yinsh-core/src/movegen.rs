//! Lazy legal-move generation
//!
//! Order: placements in topology order during setup; otherwise rings in
//! topology order, directions N..NW, and increasing distance along each ray.

use crate::board::{Board, Cell};
use crate::game::{GameState, Move, Player};
use crate::hex::{Direction, Hex};
use crate::topology::{self, NUM_CELLS};

/// Iterator over the legal moves of one state.
///
/// Call [`GameState::legal_moves`] again to restart.
#[derive(Clone, Debug)]
pub struct MoveGenerator<'a> {
    board: &'a Board,
    player: Player,
    phase: Phase,
}

#[derive(Clone, Debug)]
enum Phase {
    Setup { index: usize },
    Play { next_ring: usize, ray: Option<Ray> },
}

/// Walk outward from one ring in one direction
#[derive(Clone, Copy, Debug)]
struct Ray {
    src: Hex,
    direction: usize,
    cursor: Hex,
    crossed_marker: bool,
    done: bool,
}

impl Ray {
    fn new(src: Hex, direction: usize) -> Self {
        Self {
            src,
            direction,
            cursor: src,
            crossed_marker: false,
            done: false,
        }
    }

    /// Next landing hex along this ray.
    ///
    /// Vacant hexes are landings until a marker is crossed; after a marker
    /// run, only the first vacant hex is. Rings and the board edge end the ray.
    fn advance(&mut self, board: &Board) -> Option<Hex> {
        if self.done {
            return None;
        }
        let step = Direction::ALL[self.direction].unit();
        loop {
            self.cursor = self.cursor + step;
            if !topology::is_valid(self.cursor) {
                self.done = true;
                return None;
            }
            match board.get(self.cursor) {
                Cell::Ring(_) => {
                    self.done = true;
                    return None;
                }
                Cell::Marker(_) => self.crossed_marker = true,
                Cell::Empty => {
                    self.done = self.crossed_marker;
                    return Some(self.cursor);
                }
            }
        }
    }
}

impl<'a> MoveGenerator<'a> {
    pub fn new(state: &'a GameState) -> Self {
        let phase = if state.requires_setup() {
            Phase::Setup { index: 0 }
        } else {
            Phase::Play {
                next_ring: 0,
                ray: None,
            }
        };
        Self {
            board: state.board(),
            player: state.next_player(),
            phase,
        }
    }

    fn next_placement(board: &Board, index: &mut usize) -> Option<Move> {
        while *index < NUM_CELLS {
            let i = *index;
            *index += 1;
            if board.cell(i) == Some(Cell::Empty) {
                return topology::hex_at(i).map(Move::Place);
            }
        }
        None
    }

    fn next_play(
        board: &Board,
        player: Player,
        next_ring: &mut usize,
        ray: &mut Option<Ray>,
    ) -> Option<Move> {
        loop {
            if let Some(current) = ray.as_mut() {
                if let Some(dst) = current.advance(board) {
                    return Some(Move::play(current.src, dst));
                }
                let (src, direction) = (current.src, current.direction + 1);
                *ray = (direction < Direction::ALL.len()).then(|| Ray::new(src, direction));
                continue;
            }

            // Find the next ring of the player to move
            while *next_ring < NUM_CELLS {
                let i = *next_ring;
                *next_ring += 1;
                if board.cell(i) == Some(Cell::Ring(player)) {
                    *ray = topology::hex_at(i).map(|src| Ray::new(src, 0));
                    break;
                }
            }
            ray.as_ref()?;
        }
    }

    /// Number of remaining moves (consumes the generator)
    pub fn total(self) -> usize {
        self.count()
    }
}

impl Iterator for MoveGenerator<'_> {
    type Item = Move;

    fn next(&mut self) -> Option<Move> {
        match &mut self.phase {
            Phase::Setup { index } => Self::next_placement(self.board, index),
            Phase::Play { next_ring, ray } => {
                Self::next_play(self.board, self.player, next_ring, ray)
            }
        }
    }
}
