//! Hex geometry with cube/axial coordinates
//!
//! Coordinates are stored in axial form `(q, r)`; the cube component
//! `s = -q - r` is derived, so the `q + r + s = 0` invariant always holds.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::error::InvalidInput;

/// Axial hex coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub q: i8,
    pub r: i8,
}

impl Hex {
    pub const ORIGIN: Hex = Hex::new(0, 0);

    pub const fn new(q: i8, r: i8) -> Self {
        Self { q, r }
    }

    /// Build from full cube coordinates, rejecting triples that do not sum to zero
    pub fn from_cube(q: i8, r: i8, s: i8) -> Result<Self, InvalidInput> {
        if q as i16 + r as i16 + s as i16 != 0 {
            return Err(InvalidInput::CoordinateSum { q, r, s });
        }
        Ok(Self::new(q, r))
    }

    pub const fn s(&self) -> i8 {
        -self.q - self.r
    }

    /// Hex length: `(|q| + |r| + |s|) / 2`, which equals the largest component
    pub fn length(&self) -> i8 {
        self.q.abs().max(self.r.abs()).max(self.s().abs())
    }

    /// Distance between two hexes
    pub fn distance_to(&self, other: Hex) -> i8 {
        (*self - other).length()
    }

    /// Scale by an integer factor
    pub fn scale(&self, k: i8) -> Hex {
        Hex::new(self.q * k, self.r * k)
    }

    /// Neighbour in the given direction (may be off the board)
    pub fn neighbour(&self, direction: Direction) -> Hex {
        *self + direction.unit()
    }
}

impl Add for Hex {
    type Output = Hex;

    fn add(self, other: Hex) -> Hex {
        Hex::new(self.q + other.q, self.r + other.r)
    }
}

impl Sub for Hex {
    type Output = Hex;

    fn sub(self, other: Hex) -> Hex {
        Hex::new(self.q - other.q, self.r - other.r)
    }
}

impl Mul<i8> for Hex {
    type Output = Hex;

    fn mul(self, k: i8) -> Hex {
        self.scale(k)
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// The six principal directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    N,
    NE,
    SE,
    S,
    SW,
    NW,
}

impl Direction {
    /// Index order: 0=N, 1=NE, 2=SE, 3=S, 4=SW, 5=NW
    pub const ALL: [Direction; 6] = [
        Direction::N,
        Direction::NE,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::NW,
    ];

    /// Unit vector for this direction
    pub const fn unit(self) -> Hex {
        let (dq, dr) = DIRECTIONS[self as usize];
        Hex::new(dq, dr)
    }

    pub const fn opposite(self) -> Direction {
        Direction::ALL[(self as usize + 3) % 6]
    }
}

/// Direction vectors in axial coordinates (dq, dr)
pub const DIRECTIONS: [(i8, i8); 6] = [
    (0, -1),  // N
    (1, -1),  // NE
    (1, 0),   // SE
    (0, 1),   // S
    (-1, 1),  // SW
    (-1, 0),  // NW
];

/// Hex with fractional components, used while interpolating
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractionalHex {
    pub q: f64,
    pub r: f64,
    pub s: f64,
}

impl From<Hex> for FractionalHex {
    fn from(hex: Hex) -> Self {
        Self {
            q: hex.q as f64,
            r: hex.r as f64,
            s: hex.s() as f64,
        }
    }
}

/// Distance between two hexes
pub fn distance(a: Hex, b: Hex) -> i8 {
    a.distance_to(b)
}

/// Neighbour of `hex` in `direction`
pub fn neighbour(hex: Hex, direction: Direction) -> Hex {
    hex.neighbour(direction)
}

/// Linear interpolation, rounded to 7 decimals so exact lattice points stay exact
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let value = a + (b - a) * t;
    (value * 1e7).round_ties_even() / 1e7
}

pub fn hex_lerp(a: Hex, b: Hex, t: f64) -> FractionalHex {
    let (a, b) = (FractionalHex::from(a), FractionalHex::from(b));
    FractionalHex {
        q: lerp(a.q, b.q, t),
        r: lerp(a.r, b.r, t),
        s: lerp(a.s, b.s, t),
    }
}

/// Round to the nearest hex, recomputing the axis with the largest rounding error.
/// Halves round to even.
pub fn hex_round(hex: FractionalHex) -> Hex {
    let mut rq = hex.q.round_ties_even();
    let mut rr = hex.r.round_ties_even();
    let rs = hex.s.round_ties_even();

    let q_diff = (rq - hex.q).abs();
    let r_diff = (rr - hex.r).abs();
    let s_diff = (rs - hex.s).abs();

    if q_diff > r_diff && q_diff > s_diff {
        rq = -rr - rs;
    } else if r_diff > s_diff {
        rr = -rq - rs;
    }

    Hex::new(rq as i8, rr as i8)
}

/// All hexes from `a` to `b` inclusive
pub fn hex_linedraw(a: Hex, b: Hex) -> Vec<Hex> {
    let n = distance(a, b);
    if n == 0 {
        return vec![a];
    }
    let step = 1.0 / n as f64;
    (0..=n)
        .map(|i| hex_round(hex_lerp(a, b, step * i as f64)))
        .collect()
}

/// Direction and distance from `a` to `b`, if `b - a` is a multiple of a unit direction
pub fn line_direction(a: Hex, b: Hex) -> Option<(Direction, i8)> {
    let n = distance(a, b);
    if n == 0 {
        return None;
    }
    Direction::ALL
        .into_iter()
        .find(|dir| a + dir.unit().scale(n) == b)
        .map(|dir| (dir, n))
}

/// Line from `a` to `b` if they lie along one of the six principal directions
pub fn straight_line(a: Hex, b: Hex) -> Option<Vec<Hex>> {
    if a == b || line_direction(a, b).is_some() {
        Some(hex_linedraw(a, b))
    } else {
        None
    }
}
