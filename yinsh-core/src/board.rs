//! Board occupancy: rings, markers, movement, and rows
//!
//! The board is a fixed array of cells indexed by the topology index, so
//! copying a board is a flat memcpy. That copy sits on the search hot path.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IllegalMove, InvalidInput};
use crate::game::Player;
use crate::hex::{straight_line, Direction, Hex};
use crate::topology::{self, BOARD_RADIUS, NUM_CELLS};

/// Rings each player places during setup
pub const RINGS_PER_PLAYER: usize = 5;

/// Markers in a row
pub const ROW_LENGTH: usize = 5;

/// Five markers in a straight line, ordered from one end to the other
pub type Row = [Hex; ROW_LENGTH];

/// Directions scanned for rows; their opposites are never needed
const ROW_DIRECTIONS: [Direction; 3] = [Direction::SE, Direction::S, Direction::SW];

/// Contents of a single board position
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Ring(Player),
    Marker(Player),
}

impl Cell {
    /// Wire code: 0 empty, 1/2 white/black ring, 3/4 white/black marker
    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Ring(Player::White) => 1,
            Cell::Ring(Player::Black) => 2,
            Cell::Marker(Player::White) => 3,
            Cell::Marker(Player::Black) => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Cell> {
        match code {
            0 => Some(Cell::Empty),
            1 => Some(Cell::Ring(Player::White)),
            2 => Some(Cell::Ring(Player::Black)),
            3 => Some(Cell::Marker(Player::White)),
            4 => Some(Cell::Marker(Player::Black)),
            _ => None,
        }
    }

    fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Ring(Player::White) => 'W',
            Cell::Ring(Player::Black) => 'B',
            Cell::Marker(Player::White) => 'w',
            Cell::Marker(Player::Black) => 'b',
        }
    }
}

/// Ring and marker occupancy of the playable positions
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Cell; NUM_CELLS],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    pub fn empty() -> Self {
        Self {
            cells: [Cell::Empty; NUM_CELLS],
        }
    }

    /// Build a board from explicit contents (positions, not moves)
    pub fn from_cells<I>(cells: I) -> Result<Self, InvalidInput>
    where
        I: IntoIterator<Item = (Hex, Cell)>,
    {
        let mut board = Self::empty();
        for (hex, cell) in cells {
            let idx = topology::index_of(hex).ok_or(InvalidInput::OffBoard(hex))?;
            board.cells[idx] = cell;
        }
        for player in [Player::White, Player::Black] {
            if board.ring_count(player) > RINGS_PER_PLAYER {
                return Err(InvalidInput::TooManyRings(player));
            }
        }
        Ok(board)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Contents at `hex`; off-board positions read as empty
    pub fn get(&self, hex: Hex) -> Cell {
        topology::index_of(hex)
            .map(|idx| self.cells[idx])
            .unwrap_or_default()
    }

    /// Contents at a topology index
    pub fn cell(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    pub fn ring_at(&self, hex: Hex) -> Option<Player> {
        match self.get(hex) {
            Cell::Ring(player) => Some(player),
            _ => None,
        }
    }

    pub fn marker_at(&self, hex: Hex) -> Option<Player> {
        match self.get(hex) {
            Cell::Marker(player) => Some(player),
            _ => None,
        }
    }

    /// Is `hex` on the board and unoccupied?
    pub fn is_vacant(&self, hex: Hex) -> bool {
        topology::index_of(hex).is_some_and(|idx| self.cells[idx] == Cell::Empty)
    }

    /// Occupied positions in topology order
    pub fn occupied(&self) -> impl Iterator<Item = (Hex, Cell)> + '_ {
        topology::positions()
            .iter()
            .zip(self.cells.iter())
            .filter(|(_, cell)| **cell != Cell::Empty)
            .map(|(&hex, &cell)| (hex, cell))
    }

    /// Rings in topology order
    pub fn rings(&self) -> impl Iterator<Item = (Hex, Player)> + '_ {
        self.occupied().filter_map(|(hex, cell)| match cell {
            Cell::Ring(player) => Some((hex, player)),
            _ => None,
        })
    }

    /// Markers in topology order
    pub fn markers(&self) -> impl Iterator<Item = (Hex, Player)> + '_ {
        self.occupied().filter_map(|(hex, cell)| match cell {
            Cell::Marker(player) => Some((hex, player)),
            _ => None,
        })
    }

    /// Rings of one color currently on the board
    pub fn ring_count(&self, player: Player) -> usize {
        self.cells
            .iter()
            .filter(|cell| **cell == Cell::Ring(player))
            .count()
    }

    fn set(&mut self, hex: Hex, cell: Cell) {
        if let Some(idx) = topology::index_of(hex) {
            self.cells[idx] = cell;
        }
    }

    // ========================================================================
    // SETUP
    // ========================================================================

    /// Place a ring during setup
    pub fn place_ring(&mut self, player: Player, hex: Hex) -> Result<(), IllegalMove> {
        if !topology::is_valid(hex) {
            return Err(IllegalMove::OffBoard(hex));
        }
        if self.get(hex) != Cell::Empty {
            return Err(IllegalMove::Occupied(hex));
        }

        self.set(hex, Cell::Ring(player));

        // Count after writing; undo on overflow
        if self.ring_count(Player::White) > RINGS_PER_PLAYER
            || self.ring_count(Player::Black) > RINGS_PER_PLAYER
        {
            self.set(hex, Cell::Empty);
            return Err(IllegalMove::TooManyRings);
        }

        Ok(())
    }

    // ========================================================================
    // MOVEMENT
    // ========================================================================

    /// Silent form of [`Board::validate_move`]
    pub fn is_valid_move(&self, src: Hex, dst: Hex) -> bool {
        self.validate_move(src, dst).is_ok()
    }

    /// Check a ring move, reporting the first rule it breaks
    pub fn validate_move(&self, src: Hex, dst: Hex) -> Result<(), IllegalMove> {
        self.checked_path(src, dst).map(|_| ())
    }

    /// Validate a ring move and return the line from `src` to `dst`
    fn checked_path(&self, src: Hex, dst: Hex) -> Result<Vec<Hex>, IllegalMove> {
        if self.ring_at(src).is_none() {
            return Err(IllegalMove::NoRingAtSource(src));
        }
        for hex in [src, dst] {
            if !topology::is_valid(hex) {
                return Err(IllegalMove::OffBoard(hex));
            }
        }
        if src == dst {
            return Err(IllegalMove::SameHex);
        }
        if !self.is_vacant(dst) {
            return Err(IllegalMove::DestinationOccupied(dst));
        }

        let path = straight_line(src, dst).ok_or(IllegalMove::NotStraightLine)?;

        // Free travel over vacant hexes until the first marker; after that,
        // the ring lands on the first vacant hex, which must be `dst`.
        let mut crossed_marker = false;
        for &hex in &path[1..path.len() - 1] {
            match self.get(hex) {
                Cell::Ring(_) => return Err(IllegalMove::JumpsRing(hex)),
                Cell::Marker(_) => crossed_marker = true,
                Cell::Empty if crossed_marker => return Err(IllegalMove::MissedLanding(hex)),
                Cell::Empty => {}
            }
        }

        Ok(path)
    }

    /// Move `player`'s ring, leaving a marker behind and flipping jumped markers
    pub fn move_ring(&mut self, player: Player, src: Hex, dst: Hex) -> Result<(), IllegalMove> {
        let path = self.checked_path(src, dst)?;
        if self.ring_at(src) != Some(player) {
            return Err(IllegalMove::NotOwnRing(src));
        }

        self.set(src, Cell::Marker(player));
        self.set(dst, Cell::Ring(player));
        for &hex in &path[1..path.len() - 1] {
            if let Cell::Marker(owner) = self.get(hex) {
                self.set(hex, Cell::Marker(owner.opponent()));
            }
        }

        Ok(())
    }

    // ========================================================================
    // ROWS
    // ========================================================================

    /// Every five-marker window of `player`'s color.
    ///
    /// A run longer than five yields one entry per window, so the owner can
    /// choose which five to clear.
    pub fn rows(&self, player: Player) -> Vec<Row> {
        let mut rows = Vec::new();

        for (start, owner) in self.markers() {
            if owner != player {
                continue;
            }
            for dir in ROW_DIRECTIONS {
                let row: Row = std::array::from_fn(|k| start + dir.unit().scale(k as i8));
                if row[1..].iter().all(|&hex| self.marker_at(hex) == Some(player)) {
                    rows.push(row);
                }
            }
        }

        rows
    }

    /// Check that `row` is five same-colored markers in a line; returns their owner
    pub fn row_owner(&self, row: &[Hex]) -> Result<Player, IllegalMove> {
        if row.len() != ROW_LENGTH {
            return Err(IllegalMove::NotARow);
        }
        let owner = self.marker_at(row[0]).ok_or(IllegalMove::NotARow)?;
        if row.iter().any(|&hex| self.marker_at(hex) != Some(owner)) {
            return Err(IllegalMove::NotARow);
        }
        match straight_line(row[0], row[ROW_LENGTH - 1]) {
            Some(line) if line == row => Ok(owner),
            _ => Err(IllegalMove::NotARow),
        }
    }

    /// Clear the markers of a completed row; returns the row's owner
    pub fn complete_row(&mut self, row: &[Hex]) -> Result<Player, IllegalMove> {
        let owner = self.row_owner(row)?;
        for &hex in row {
            self.set(hex, Cell::Empty);
        }
        Ok(owner)
    }

    /// Take a ring off the board; returns its owner
    pub fn remove_ring(&mut self, hex: Hex) -> Result<Player, IllegalMove> {
        let owner = self.ring_at(hex).ok_or(IllegalMove::NoRingToRemove(hex))?;
        self.set(hex, Cell::Empty);
        Ok(owner)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.occupied()).finish()
    }
}

/// Text rendering: one line per `r`, markers lowercase, rings uppercase
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in -BOARD_RADIUS..=BOARD_RADIUS {
            write!(f, "{:>3} {}", r, " ".repeat(r.unsigned_abs() as usize))?;
            let q_min = (-BOARD_RADIUS).max(-BOARD_RADIUS - r);
            let q_max = BOARD_RADIUS.min(BOARD_RADIUS - r);
            for q in q_min..=q_max {
                let hex = Hex::new(q, r);
                let symbol = if topology::is_valid(hex) {
                    self.get(hex).symbol()
                } else {
                    ' '
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
