//! Error types for the rules engine

use thiserror::Error;

use crate::game::Player;
use crate::hex::Hex;

/// A move, placement, or row resolution rejected by the rules.
///
/// Rejections never modify the game state; callers treat them as
/// "move rejected, try again".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum IllegalMove {
    #[error("Board requires setup")]
    RequiresSetup,

    #[error("Max rings reached")]
    SetupComplete,

    #[error("Game is over")]
    GameOver,

    #[error("Hex {0} is not on the board")]
    OffBoard(Hex),

    #[error("Hex {0} is already occupied")]
    Occupied(Hex),

    #[error("Too many rings of one color")]
    TooManyRings,

    #[error("No ring at source hex {0}")]
    NoRingAtSource(Hex),

    #[error("Ring at {0} belongs to the other player")]
    NotOwnRing(Hex),

    #[error("Source and destination are the same hex")]
    SameHex,

    #[error("Destination hex {0} is occupied")]
    DestinationOccupied(Hex),

    #[error("Destination is not in a straight line from the source")]
    NotStraightLine,

    #[error("Ring cannot jump over ring at {0}")]
    JumpsRing(Hex),

    #[error("Ring must stop at the first vacant space after markers, not beyond {0}")]
    MissedLanding(Hex),

    #[error("Not a row of five same-colored markers")]
    NotARow,

    #[error("No ring at {0} to remove")]
    NoRingToRemove(Hex),
}

/// Malformed external input, rejected at construction time
#[derive(Debug, Error)]
pub enum InvalidInput {
    #[error("Variant must be 'standard' or 'blitz', got '{0}'")]
    UnknownVariant(String),

    #[error("Coordinates must sum to 0, got ({q}, {r}, {s})")]
    CoordinateSum { q: i8, r: i8, s: i8 },

    #[error("Hex {0} is not on the board")]
    OffBoard(Hex),

    #[error("Unknown board index: {0}")]
    UnknownIndex(usize),

    #[error("Unknown cell code {code} at index {index}")]
    UnknownCellCode { index: usize, code: u8 },

    #[error("Too many rings for {0}")]
    TooManyRings(Player),

    #[error("{0} has more than five rings on the board and removed combined")]
    RingTotal(Player),

    #[error("requiresSetup is {claimed} but {placed} of 10 rings are accounted for")]
    SetupMismatch { claimed: bool, placed: usize },

    #[error("Rings removed before setup finished")]
    RemovedDuringSetup,

    #[error("Unknown player color '{0}'")]
    UnknownColor(String),

    #[error("Cannot read state: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed state: {0}")]
    Json(#[from] serde_json::Error),
}
