//! Fixed-Point 3D Vector
//!
//! Deterministic 3D vector for impulse math. The combat core never integrates
//! positions itself (the physics body collaborator owns that); it only hands
//! out impulse vectors, so the operation set stays small.

use std::fmt;
use std::ops::{Add, Neg};

use serde::{Deserialize, Serialize};

use super::fixed::{fixed_mul, to_float, Fixed, FIXED_ONE, FIXED_SCALE};

/// 3D vector with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedVec3 {
    /// X component (Q16.16 fixed-point)
    pub x: Fixed,
    /// Y component (Q16.16 fixed-point)
    pub y: Fixed,
    /// Z component (Q16.16 fixed-point)
    pub z: Fixed,
}

impl FixedVec3 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    /// Unit vector pointing up (+Y)
    pub const UP: Self = Self {
        x: 0,
        y: FIXED_ONE,
        z: 0,
    };

    /// Unit vector pointing forward (+Z)
    pub const FORWARD: Self = Self {
        x: 0,
        y: 0,
        z: FIXED_ONE,
    };

    /// Create a new vector from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Create a vector from integer components.
    #[inline]
    pub const fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self {
            x: x << FIXED_SCALE,
            y: y << FIXED_SCALE,
            z: z << FIXED_SCALE,
        }
    }

    /// Add another vector.
    #[inline]
    pub fn add(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_add(other.x),
            y: self.y.wrapping_add(other.y),
            z: self.z.wrapping_add(other.z),
        }
    }

    /// Scale by a fixed-point scalar.
    #[inline]
    pub fn scale(self, scalar: Fixed) -> Self {
        Self {
            x: fixed_mul(self.x, scalar),
            y: fixed_mul(self.y, scalar),
            z: fixed_mul(self.z, scalar),
        }
    }

    /// Convert to floats for display/logging only.
    pub fn to_floats(self) -> (f32, f32, f32) {
        (to_float(self.x), to_float(self.y), to_float(self.z))
    }
}

impl Add for FixedVec3 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        FixedVec3::add(self, rhs)
    }
}

impl Neg for FixedVec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self {
            x: self.x.wrapping_neg(),
            y: self.y.wrapping_neg(),
            z: self.z.wrapping_neg(),
        }
    }
}

impl fmt::Debug for FixedVec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, z) = self.to_floats();
        write!(f, "FixedVec3({:.4}, {:.4}, {:.4})", x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::LAUNCH_IMPULSE;

    #[test]
    fn test_up_scale() {
        let launch = FixedVec3::UP.scale(LAUNCH_IMPULSE);
        assert_eq!(launch.x, 0);
        assert_eq!(launch.y, LAUNCH_IMPULSE);
        assert_eq!(launch.z, 0);
    }

    #[test]
    fn test_add() {
        let a = FixedVec3::from_ints(1, 2, 3);
        let b = FixedVec3::from_ints(4, 5, 6);
        assert_eq!(a.add(b), FixedVec3::from_ints(5, 7, 9));
        assert_eq!(a + b, FixedVec3::from_ints(5, 7, 9));
    }

    #[test]
    fn test_neg() {
        let v = FixedVec3::from_ints(1, -2, 3);
        assert_eq!(-v, FixedVec3::from_ints(-1, 2, -3));
    }
}
