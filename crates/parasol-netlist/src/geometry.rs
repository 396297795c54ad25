//! Integral layout coordinates

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Database unit. All placement coordinates and wirelengths are integral.
pub type Dbu = i64;

/// A point in database units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DbuPoint {
    pub x: Dbu,
    pub y: Dbu,
}

impl DbuPoint {
    pub const fn new(x: Dbu, y: Dbu) -> Self {
        Self { x, y }
    }

    /// Rectilinear distance to another point
    pub fn manhattan_distance(&self, other: &DbuPoint) -> Dbu {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl Add for DbuPoint {
    type Output = DbuPoint;

    fn add(self, rhs: DbuPoint) -> DbuPoint {
        DbuPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for DbuPoint {
    type Output = DbuPoint;

    fn sub(self, rhs: DbuPoint) -> DbuPoint {
        DbuPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for DbuPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
