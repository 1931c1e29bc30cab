//! Axial hex grid coordinates used for body plans.
//!
//! Cells are laid out on a flat-top hex grid addressed with axial `(q, r)`
//! coordinates. Cartesian conversion uses the x/z plane with "forward"
//! pointing towards negative z, so a part at `(0, -1)` sits at the front.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Distance between two adjacent hex centers in cartesian units.
pub const HEX_SIZE: f32 = 0.75;

/// The six sides of a hex, clockwise from the front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HexSide {
    /// Towards negative r (the front of the cell).
    Top,
    /// Front right.
    TopRight,
    /// Back right.
    BottomRight,
    /// Towards positive r (the back of the cell).
    Bottom,
    /// Back left.
    BottomLeft,
    /// Front left.
    TopLeft,
}

impl HexSide {
    /// All sides, clockwise from the top.
    pub const ALL: [HexSide; 6] = [
        HexSide::Top,
        HexSide::TopRight,
        HexSide::BottomRight,
        HexSide::Bottom,
        HexSide::BottomLeft,
        HexSide::TopLeft,
    ];

    /// Unit offset to the neighbour on this side.
    pub fn offset(self) -> Hex {
        match self {
            HexSide::Top => Hex::new(0, -1),
            HexSide::TopRight => Hex::new(1, -1),
            HexSide::BottomRight => Hex::new(1, 0),
            HexSide::Bottom => Hex::new(0, 1),
            HexSide::BottomLeft => Hex::new(-1, 1),
            HexSide::TopLeft => Hex::new(-1, 0),
        }
    }

    /// Whether placing something on this side grows the cell forwards.
    pub fn is_forward(self) -> bool {
        matches!(self, HexSide::Top | HexSide::TopRight | HexSide::TopLeft)
    }
}

/// An axial hex coordinate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Hex {
    /// Column.
    pub q: i32,
    /// Row.
    pub r: i32,
}

impl Hex {
    /// The cell origin.
    pub const ORIGIN: Hex = Hex { q: 0, r: 0 };

    /// Creates a hex coordinate.
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Number of steps between two hexes.
    pub fn distance(self, other: Hex) -> i32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        (dq.abs() + dr.abs() + (dq + dr).abs()) / 2
    }

    /// The six neighbours, in [`HexSide::ALL`] order.
    pub fn neighbours(self) -> [Hex; 6] {
        HexSide::ALL.map(|side| self + side.offset())
    }

    /// Rotates around the origin by `times` sixty degree clockwise steps.
    pub fn rotated(self, times: u8) -> Hex {
        let mut hex = self;
        for _ in 0..(times % 6) {
            hex = Hex::new(-hex.r, hex.q + hex.r);
        }
        hex
    }

    /// Center of this hex in the x/z plane.
    pub fn to_cartesian(self) -> Array1<f32> {
        let q = self.q as f32;
        let r = self.r as f32;
        let sqrt3 = 3.0f32.sqrt();
        Array1::from_vec(vec![
            q * HEX_SIZE * 1.5,
            r * HEX_SIZE * sqrt3 + q * HEX_SIZE * sqrt3 / 2.0,
        ])
    }

    /// The unit step from `self` that gets closest to `target`.
    ///
    /// Returns [`Hex::ORIGIN`] when the two coincide.
    pub fn step_towards(self, target: Hex) -> Hex {
        if self == target {
            return Hex::ORIGIN;
        }
        let current = self.distance(target);
        HexSide::ALL
            .into_iter()
            .map(HexSide::offset)
            .find(|offset| (self + *offset).distance(target) < current)
            .unwrap_or(Hex::ORIGIN)
    }
}

impl Add for Hex {
    type Output = Hex;

    fn add(self, rhs: Hex) -> Hex {
        Hex::new(self.q + rhs.q, self.r + rhs.r)
    }
}

impl Sub for Hex {
    type Output = Hex;

    fn sub(self, rhs: Hex) -> Hex {
        Hex::new(self.q - rhs.q, self.r - rhs.r)
    }
}

impl Neg for Hex {
    type Output = Hex;

    fn neg(self) -> Hex {
        Hex::new(-self.q, -self.r)
    }
}

impl Mul<i32> for Hex {
    type Output = Hex;

    fn mul(self, rhs: i32) -> Hex {
        Hex::new(self.q * rhs, self.r * rhs)
    }
}

/// Unit vector pointing forwards in the x/z plane.
pub fn forward() -> Array1<f32> {
    Array1::from_vec(vec![0.0, -1.0])
}

/// Unit vector pointing right in the x/z plane.
pub fn right() -> Array1<f32> {
    Array1::from_vec(vec![1.0, 0.0])
}

/// Returns `v` scaled to unit length, or a zero vector if `v` is zero.
pub fn normalized(v: &Array1<f32>) -> Array1<f32> {
    let length = v.dot(v).sqrt();
    if length <= f32::EPSILON {
        Array1::zeros(v.len())
    } else {
        v / length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_cycles_back_after_six_steps() {
        let hex = Hex::new(2, -1);
        assert_eq!(hex.rotated(6), hex);
        assert_eq!(hex.rotated(3), -hex);
    }

    #[test]
    fn step_towards_reduces_distance() {
        let from = Hex::new(3, -2);
        let to = Hex::new(-1, 2);
        let step = from.step_towards(to);
        assert_eq!((from + step).distance(to), from.distance(to) - 1);
    }
}
