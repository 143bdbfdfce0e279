//! JSON wire format shared with the browser client
//!
//! Cells are addressed by topology index and encoded with [`Cell::code`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Cell, RINGS_PER_PLAYER};
use crate::error::InvalidInput;
use crate::game::{GameState, Player, Variant};
use crate::topology;

/// Removed-ring counts per color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingCounts {
    pub white: u8,
    pub black: u8,
}

/// Pending rows per color, as lists of five topology indices
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRows {
    pub w: Vec<[usize; 5]>,
    pub b: Vec<[usize; 5]>,
}

/// Serialized game state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireState {
    /// Occupied cells: topology index -> cell code
    pub grid: BTreeMap<usize, u8>,
    pub rings: RingCounts,
    /// Player to move: "w" or "b"
    pub color: String,
    #[serde(default)]
    pub variant: Variant,
    pub requires_setup: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<WireRows>,
}

fn color_code(player: Player) -> &'static str {
    match player {
        Player::White => "w",
        Player::Black => "b",
    }
}

fn parse_color(color: &str) -> Result<Player, InvalidInput> {
    match color {
        "w" => Ok(Player::White),
        "b" => Ok(Player::Black),
        other => Err(InvalidInput::UnknownColor(other.to_string())),
    }
}

fn row_indices(rows: Vec<crate::board::Row>) -> Vec<[usize; 5]> {
    rows.into_iter()
        .map(|row| row.map(|hex| topology::index_of(hex).unwrap_or_default()))
        .collect()
}

impl WireState {
    /// Decode into a game state, validating indices, codes, and ring counts
    pub fn to_game_state(&self) -> Result<GameState, InvalidInput> {
        let mut cells = Vec::with_capacity(self.grid.len());
        for (&index, &code) in &self.grid {
            let hex = topology::hex_at(index).ok_or(InvalidInput::UnknownIndex(index))?;
            let cell = Cell::from_code(code).ok_or(InvalidInput::UnknownCellCode { index, code })?;
            cells.push((hex, cell));
        }
        let board = Board::from_cells(cells)?;
        self.check_ring_totals(&board)?;

        Ok(GameState::from_parts(
            board,
            self.rings.white,
            self.rings.black,
            parse_color(&self.color)?,
            self.requires_setup,
            self.variant,
        ))
    }

    /// Every ring is on the board, removed, or not yet placed; setup lasts
    /// until all ten are accounted for and removes nothing.
    fn check_ring_totals(&self, board: &Board) -> Result<(), InvalidInput> {
        let mut placed = 0;
        for (player, removed) in [
            (Player::White, self.rings.white),
            (Player::Black, self.rings.black),
        ] {
            let total = board.ring_count(player) + removed as usize;
            if total > RINGS_PER_PLAYER {
                return Err(InvalidInput::RingTotal(player));
            }
            placed += total;
        }

        let in_setup = placed < 2 * RINGS_PER_PLAYER;
        if self.requires_setup != in_setup {
            return Err(InvalidInput::SetupMismatch {
                claimed: self.requires_setup,
                placed,
            });
        }
        if in_setup && (self.rings.white > 0 || self.rings.black > 0) {
            return Err(InvalidInput::RemovedDuringSetup);
        }
        Ok(())
    }
}

impl GameState {
    /// Encode without the pending-rows annotation
    pub fn to_wire(&self) -> WireState {
        let grid = self
            .board()
            .occupied()
            .filter_map(|(hex, cell)| topology::index_of(hex).map(|i| (i, cell.code())))
            .collect();

        WireState {
            grid,
            rings: RingCounts {
                white: self.removed_rings(Player::White),
                black: self.removed_rings(Player::Black),
            },
            color: color_code(self.next_player()).to_string(),
            variant: self.variant(),
            requires_setup: self.requires_setup(),
            rows: None,
        }
    }

    /// Encode including both colors' pending rows
    pub fn to_wire_with_rows(&self) -> WireState {
        WireState {
            rows: Some(WireRows {
                w: row_indices(self.pending_rows(Player::White)),
                b: row_indices(self.pending_rows(Player::Black)),
            }),
            ..self.to_wire()
        }
    }

    pub fn from_wire(wire: &WireState) -> Result<Self, InvalidInput> {
        wire.to_game_state()
    }

    pub fn to_json(&self) -> String {
        // Plain maps of integers and strings always serialize
        serde_json::to_string(&self.to_wire_with_rows()).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, InvalidInput> {
        let wire: WireState = serde_json::from_str(json)?;
        Self::from_wire(&wire)
    }

    /// Load a serialized state from a JSON file
    pub fn load(path: &Path) -> Result<Self, InvalidInput> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Move, Outcome};
    use crate::hex::Hex;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;
    use rustc_hash::FxHashSet;

    fn random_position(seed: u64, plies: usize) -> GameState {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut game = GameState::new_game(Variant::Standard);
        for _ in 0..plies {
            if game.is_over() {
                break;
            }
            let moves: Vec<Move> = game.legal_moves().collect();
            let mv = *moves.choose(&mut rng).unwrap();
            game.make_move(mv).unwrap();
            game.resolve_rows_randomly(&mut rng);
        }
        game
    }

    #[test]
    fn test_round_trip_preserves_moves_and_outcome() {
        for seed in 0..8 {
            let game = random_position(seed, 10 + seed as usize * 6);
            let decoded = GameState::from_json(&game.to_json()).unwrap();

            assert_eq!(decoded, game);
            let a: FxHashSet<Move> = game.legal_moves().collect();
            let b: FxHashSet<Move> = decoded.legal_moves().collect();
            assert_eq!(a, b);
            assert_eq!(game.outcome(), decoded.outcome());
        }
    }

    #[test]
    fn test_browser_payload() {
        let json = r#"{
            "grid": {"0": 1, "1": 2, "2": 3, "3": 4, "4": 0,
                     "5": 1, "6": 1, "7": 1, "8": 2, "9": 2, "10": 2, "11": 2},
            "rings": {"white": 1, "black": 0},
            "color": "b",
            "variant": "blitz",
            "requiresSetup": false
        }"#;
        let game = GameState::from_json(json).unwrap();
        assert_eq!(game.board().get(Hex::ORIGIN), Cell::Ring(Player::White));
        assert_eq!(game.board().get(Hex::new(-5, 1)), Cell::Ring(Player::Black));
        assert_eq!(game.board().get(Hex::new(-5, 2)), Cell::Marker(Player::White));
        assert_eq!(game.board().get(Hex::new(-5, 3)), Cell::Marker(Player::Black));
        assert_eq!(game.board().get(Hex::new(-5, 4)), Cell::Empty);
        assert_eq!(game.next_player(), Player::Black);
        assert_eq!(game.removed_rings(Player::White), 1);
        assert_eq!(game.outcome(), Some(Outcome::Win(Player::White)));
    }

    #[test]
    fn test_rows_annotation() {
        let cells: Vec<_> = (0..5).map(|r| (Hex::new(0, r), Cell::Marker(Player::Black))).collect();
        let board = Board::from_cells(cells).unwrap();
        let game = GameState::from_parts(board, 0, 0, Player::White, false, Variant::Standard);
        let wire = game.to_wire_with_rows();
        let rows = wire.rows.unwrap();
        assert!(rows.w.is_empty());
        assert_eq!(rows.b.len(), 1);
        assert_eq!(rows.b[0][0], 0);
    }

    #[test]
    fn test_malformed_input() {
        let bad_index = r#"{"grid": {"85": 1}, "rings": {"white": 0, "black": 0}, "color": "w", "requiresSetup": true}"#;
        assert!(matches!(
            GameState::from_json(bad_index),
            Err(InvalidInput::UnknownIndex(85))
        ));

        let bad_code = r#"{"grid": {"3": 9}, "rings": {"white": 0, "black": 0}, "color": "w", "requiresSetup": true}"#;
        assert!(matches!(
            GameState::from_json(bad_code),
            Err(InvalidInput::UnknownCellCode { index: 3, code: 9 })
        ));

        let bad_color = r#"{"grid": {}, "rings": {"white": 0, "black": 0}, "color": "x", "requiresSetup": true}"#;
        assert!(matches!(
            GameState::from_json(bad_color),
            Err(InvalidInput::UnknownColor(_))
        ));

        assert!(matches!(GameState::from_json("{"), Err(InvalidInput::Json(_))));

        let too_many = r#"{"grid": {"1": 1, "2": 1, "3": 1, "4": 1, "5": 1, "6": 1},
            "rings": {"white": 0, "black": 0}, "color": "w", "requiresSetup": true}"#;
        assert!(matches!(
            GameState::from_json(too_many),
            Err(InvalidInput::TooManyRings(Player::White))
        ));
    }

    #[test]
    fn test_inconsistent_ring_totals() {
        let setup_flag_wrong = r#"{"grid": {"0": 1, "5": 1, "6": 1, "7": 1, "8": 1,
                                            "1": 2, "2": 2, "3": 2, "4": 2, "9": 2},
            "rings": {"white": 0, "black": 0}, "color": "w", "requiresSetup": true}"#;
        assert!(matches!(
            GameState::from_json(setup_flag_wrong),
            Err(InvalidInput::SetupMismatch { claimed: true, placed: 10 })
        ));

        let seven_white = r#"{"grid": {"0": 1, "5": 1, "6": 1, "7": 1, "8": 1,
                                       "1": 2, "2": 2, "3": 2, "4": 2, "9": 2},
            "rings": {"white": 2, "black": 0}, "color": "w", "requiresSetup": false}"#;
        assert!(matches!(
            GameState::from_json(seven_white),
            Err(InvalidInput::RingTotal(Player::White))
        ));

        let early_removal = r#"{"grid": {"0": 1}, "rings": {"white": 1, "black": 0},
            "color": "b", "requiresSetup": true}"#;
        assert!(matches!(
            GameState::from_json(early_removal),
            Err(InvalidInput::RemovedDuringSetup)
        ));

        let mid_setup = r#"{"grid": {"0": 1, "1": 2, "5": 1}, "rings": {"white": 0, "black": 0},
            "color": "b", "requiresSetup": true}"#;
        let game = GameState::from_json(mid_setup).unwrap();
        assert!(game.requires_setup());
        assert!(game.legal_moves().all(|mv| game.apply_move(mv).is_ok()));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = GameState::load(Path::new("/nonexistent/yinsh-state.json")).unwrap_err();
        assert!(matches!(err, InvalidInput::Io(_)));
        assert!(err.to_string().starts_with("Cannot read state"));
    }
}
