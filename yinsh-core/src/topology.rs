//! Board topology: the 85 playable positions and their dense indices
//!
//! The playable region is the radius-5 hexagon without its six corners.
//! Index 0 is the center; the remaining positions follow in axial order
//! (q ascending, then r ascending). This mapping is part of the wire format
//! and must never change.

use crate::hex::Hex;

/// Board radius (distance from center to the furthest playable hex)
pub const BOARD_RADIUS: i8 = 5;

/// Number of playable positions
pub const NUM_CELLS: usize = 85;

const SPAN: usize = (2 * BOARD_RADIUS + 1) as usize;
const NO_INDEX: u8 = u8::MAX;

const fn is_corner_or_center(q: i8, r: i8) -> bool {
    (q == BOARD_RADIUS || q == -BOARD_RADIUS || q == 0)
        && (r == BOARD_RADIUS || r == -BOARD_RADIUS || r == 0)
}

const fn build_positions() -> [Hex; NUM_CELLS] {
    let mut positions = [Hex::ORIGIN; NUM_CELLS];
    let mut idx = 1;
    let mut q = -BOARD_RADIUS;
    while q <= BOARD_RADIUS {
        let mut r = -BOARD_RADIUS;
        while r <= BOARD_RADIUS {
            let s = -q - r;
            if s >= -BOARD_RADIUS && s <= BOARD_RADIUS && !is_corner_or_center(q, r) {
                positions[idx] = Hex::new(q, r);
                idx += 1;
            }
            r += 1;
        }
        q += 1;
    }
    positions
}

const fn build_index() -> [[u8; SPAN]; SPAN] {
    let positions = build_positions();
    let mut table = [[NO_INDEX; SPAN]; SPAN];
    let mut i = 0;
    while i < NUM_CELLS {
        let hex = positions[i];
        table[(hex.q + BOARD_RADIUS) as usize][(hex.r + BOARD_RADIUS) as usize] = i as u8;
        i += 1;
    }
    table
}

static POSITIONS: [Hex; NUM_CELLS] = build_positions();
static INDEX: [[u8; SPAN]; SPAN] = build_index();

/// Dense index of `hex`, or `None` if it is not a playable position
#[inline]
pub fn index_of(hex: Hex) -> Option<usize> {
    let q = hex.q as i16 + BOARD_RADIUS as i16;
    let r = hex.r as i16 + BOARD_RADIUS as i16;
    if !(0..SPAN as i16).contains(&q) || !(0..SPAN as i16).contains(&r) {
        return None;
    }
    match INDEX[q as usize][r as usize] {
        NO_INDEX => None,
        idx => Some(idx as usize),
    }
}

/// Position at a dense index
#[inline]
pub fn hex_at(index: usize) -> Option<Hex> {
    POSITIONS.get(index).copied()
}

/// Is `hex` a playable position?
#[inline]
pub fn is_valid(hex: Hex) -> bool {
    index_of(hex).is_some()
}

/// All playable positions in index order
pub fn positions() -> &'static [Hex; NUM_CELLS] {
    &POSITIONS
}

/// On-board neighbours of `hex`
pub fn neighbours(hex: Hex) -> impl Iterator<Item = Hex> {
    crate::hex::Direction::ALL
        .into_iter()
        .map(move |dir| hex.neighbour(dir))
        .filter(|h| is_valid(*h))
}
