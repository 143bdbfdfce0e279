//! YINSH Core - Rules engine
//!
//! This crate provides the game logic for YINSH on the 85-cell hex board:
//! - Hex geometry (cube coordinates, line drawing)
//! - Board topology (cell enumeration and index lookup)
//! - Board contents, ring moves, marker flips and rows
//! - Game state, phases, termination and lazy move generation
//! - JSON wire format shared with the browser client

pub mod hex;
pub mod topology;
pub mod board;
pub mod game;
pub mod movegen;
pub mod error;
pub mod wire;

// Re-exports for convenient access
pub use hex::{Direction, Hex, DIRECTIONS};
pub use topology::{BOARD_RADIUS, NUM_CELLS};
pub use board::{Board, Cell, Row, RINGS_PER_PLAYER, ROW_LENGTH};
pub use game::{GameState, Move, Outcome, Player, Variant};
pub use movegen::MoveGenerator;
pub use error::{IllegalMove, InvalidInput};
pub use wire::WireState;
