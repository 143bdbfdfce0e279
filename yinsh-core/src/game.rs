//! Game state, turn sequencing, and win detection

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Row, RINGS_PER_PLAYER};
use crate::error::{IllegalMove, InvalidInput};
use crate::hex::Hex;
use crate::movegen::MoveGenerator;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Player color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    White = 0,
    Black = 1,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::White => write!(f, "white"),
            Player::Black => write!(f, "black"),
        }
    }
}

/// Rule variant; variants differ only in the ring removals needed to win
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Standard,
    Blitz,
}

impl Variant {
    pub fn rings_to_win(self) -> u8 {
        match self {
            Variant::Standard => 3,
            Variant::Blitz => 1,
        }
    }
}

impl FromStr for Variant {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Variant::Standard),
            "blitz" => Ok(Variant::Blitz),
            other => Err(InvalidInput::UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Standard => write!(f, "standard"),
            Variant::Blitz => write!(f, "blitz"),
        }
    }
}

/// A legal move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    /// Setup-phase ring placement
    Place(Hex),
    /// Play-phase ring relocation
    Play { src: Hex, dst: Hex },
}

impl Move {
    pub fn place(hex: Hex) -> Self {
        Move::Place(hex)
    }

    pub fn play(src: Hex, dst: Hex) -> Self {
        Move::Play { src, dst }
    }

    /// Hex the move starts from (the placed hex for placements)
    pub fn src(&self) -> Hex {
        match *self {
            Move::Place(hex) => hex,
            Move::Play { src, .. } => src,
        }
    }

    pub fn dst(&self) -> Option<Hex> {
        match *self {
            Move::Place(_) => None,
            Move::Play { dst, .. } => Some(dst),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Place(hex) => write!(f, "place {}", hex),
            Move::Play { src, dst } => write!(f, "play {} -> {}", src, dst),
        }
    }
}

/// Final result of a finished game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win(Player),
    Draw,
}

impl Outcome {
    pub fn winner(self) -> Option<Player> {
        match self {
            Outcome::Win(player) => Some(player),
            Outcome::Draw => None,
        }
    }
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Game state (clone to fork)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GameState {
    board: Board,
    /// Rings each color has removed from the board, indexed by `Player as usize`
    removed: [u8; 2],
    next_player: Player,
    requires_setup: bool,
    variant: Variant,
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Empty board, white to place first
    pub fn new_game(variant: Variant) -> Self {
        Self {
            board: Board::empty(),
            removed: [0, 0],
            next_player: Player::White,
            requires_setup: true,
            variant,
        }
    }

    /// Build a state from its parts; used by deserialization
    pub fn from_parts(
        board: Board,
        removed_white: u8,
        removed_black: u8,
        next_player: Player,
        requires_setup: bool,
        variant: Variant,
    ) -> Self {
        Self {
            board,
            removed: [removed_white, removed_black],
            next_player,
            requires_setup,
            variant,
        }
    }

    /// Build a play-phase (or setup-phase) state from a position.
    ///
    /// Setup is considered finished once every ring is accounted for, either
    /// on the board or already removed.
    pub fn from_board(board: Board, next_player: Player, variant: Variant) -> Self {
        let placed = board.ring_count(Player::White) + board.ring_count(Player::Black);
        Self {
            requires_setup: placed < 2 * RINGS_PER_PLAYER,
            board,
            removed: [0, 0],
            next_player,
            variant,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Color to move next
    pub fn next_player(&self) -> Player {
        self.next_player
    }

    /// Color that made the most recent move
    pub fn last_mover(&self) -> Player {
        self.next_player.opponent()
    }

    pub fn requires_setup(&self) -> bool {
        self.requires_setup
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn rings_to_win(&self) -> u8 {
        self.variant.rings_to_win()
    }

    /// Rings `player` has removed from the board so far
    pub fn removed_rings(&self, player: Player) -> u8 {
        self.removed[player as usize]
    }

    // ========================================================================
    // MOVE GENERATION
    // ========================================================================

    /// Legal moves for the player to move, generated lazily
    pub fn legal_moves(&self) -> MoveGenerator<'_> {
        MoveGenerator::new(self)
    }

    pub fn has_legal_moves(&self) -> bool {
        self.legal_moves().next().is_some()
    }

    // ========================================================================
    // TERMINATION
    // ========================================================================

    /// Winner by reaching the ring-removal threshold
    fn threshold_winner(&self) -> Option<Player> {
        [Player::White, Player::Black]
            .into_iter()
            .find(|&p| self.removed_rings(p) >= self.rings_to_win())
    }

    pub fn is_over(&self) -> bool {
        self.threshold_winner().is_some() || !self.has_legal_moves()
    }

    /// Outcome once the game is over; `None` while it is still running
    pub fn outcome(&self) -> Option<Outcome> {
        if let Some(winner) = self.threshold_winner() {
            return Some(Outcome::Win(winner));
        }
        if self.has_legal_moves() {
            return None;
        }
        let (white, black) = (
            self.removed_rings(Player::White),
            self.removed_rings(Player::Black),
        );
        Some(match white.cmp(&black) {
            std::cmp::Ordering::Greater => Outcome::Win(Player::White),
            std::cmp::Ordering::Less => Outcome::Win(Player::Black),
            std::cmp::Ordering::Equal => Outcome::Draw,
        })
    }

    // ========================================================================
    // APPLY MOVE
    // ========================================================================

    /// Apply a move for the player to move
    pub fn make_move(&mut self, mv: Move) -> Result<(), IllegalMove> {
        match mv {
            Move::Play { .. } if self.requires_setup => return Err(IllegalMove::RequiresSetup),
            Move::Place(_) if !self.requires_setup => return Err(IllegalMove::SetupComplete),
            _ => {}
        }
        if self.is_over() {
            return Err(IllegalMove::GameOver);
        }

        match mv {
            Move::Place(hex) => {
                self.board.place_ring(self.next_player, hex)?;
                if self.board.ring_count(Player::White) == RINGS_PER_PLAYER
                    && self.board.ring_count(Player::Black) == RINGS_PER_PLAYER
                {
                    self.requires_setup = false;
                }
            }
            Move::Play { src, dst } => {
                self.board.move_ring(self.next_player, src, dst)?;
            }
        }

        self.next_player = self.next_player.opponent();
        Ok(())
    }

    /// Apply a move to a copy, leaving `self` untouched
    pub fn apply_move(&self, mv: Move) -> Result<Self, IllegalMove> {
        let mut next = self.clone();
        next.make_move(mv)?;
        Ok(next)
    }

    // ========================================================================
    // ROW RESOLUTION
    // ========================================================================

    /// Rows of `player`'s markers currently on the board
    pub fn pending_rows(&self, player: Player) -> Vec<Row> {
        self.board.rows(player)
    }

    /// Clear a completed row; returns its owner
    pub fn complete_row(&mut self, row: &[Hex]) -> Result<Player, IllegalMove> {
        if self.threshold_winner().is_some() {
            return Err(IllegalMove::GameOver);
        }
        self.board.complete_row(row)
    }

    /// Remove a ring, crediting the removal to its owner
    pub fn remove_ring(&mut self, hex: Hex) -> Result<Player, IllegalMove> {
        if self.threshold_winner().is_some() {
            return Err(IllegalMove::GameOver);
        }
        let owner = self.board.remove_ring(hex)?;
        self.removed[owner as usize] += 1;
        Ok(owner)
    }

    /// Clear `row` and remove `ring` as one step; the ring must belong to the row's owner
    pub fn resolve_row(&mut self, row: &[Hex], ring: Hex) -> Result<Player, IllegalMove> {
        if self.threshold_winner().is_some() {
            return Err(IllegalMove::GameOver);
        }
        let owner = self.board.row_owner(row)?;
        match self.board.ring_at(ring) {
            Some(p) if p == owner => {}
            Some(_) => return Err(IllegalMove::NotOwnRing(ring)),
            None => return Err(IllegalMove::NoRingToRemove(ring)),
        }
        self.complete_row(row)?;
        self.remove_ring(ring)
    }

    /// Resolve every pending row with uniformly random choices.
    ///
    /// The last mover's rows go first, then the opponent's. Each removal
    /// re-checks the win threshold, so the game can end before the
    /// opponent's rows are looked at. Returns the number of rows resolved.
    pub fn resolve_rows_randomly<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let mut resolved = 0;
        for player in [self.last_mover(), self.next_player] {
            loop {
                if self.threshold_winner().is_some() {
                    return resolved;
                }
                let rows = self.pending_rows(player);
                let Some(row) = rows.choose(rng) else {
                    break;
                };
                let rings: Vec<Hex> = self
                    .board
                    .rings()
                    .filter(|&(_, owner)| owner == player)
                    .map(|(hex, _)| hex)
                    .collect();
                let Some(&ring) = rings.choose(rng) else {
                    break;
                };
                if self.resolve_row(row, ring).is_err() {
                    break;
                }
                resolved += 1;
            }
        }
        resolved
    }
}

// ============================================================================
// TESTS
// ============================================================================
