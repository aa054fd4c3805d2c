use nalgebra::{Point2, Vector2};

/// 2d point with `f64` coordinates. World and screen positions both use this type.
pub type Point2d = Point2<f64>;

/// 2d vector with `f64` coordinates, used for offsets between points.
pub type Vector2d = Vector2<f64>;

/// A point in 2d cartesian space.
pub trait CartesianPoint2d {
    /// X coordinate.
    fn x(&self) -> f64;
    /// Y coordinate.
    fn y(&self) -> f64;

    /// Returns true if both coordinates are finite numbers.
    fn is_finite(&self) -> bool {
        self.x().is_finite() && self.y().is_finite()
    }

    /// Sum of absolute coordinate differences between two points.
    fn taxicab_distance(&self, other: &impl CartesianPoint2d) -> f64 {
        (self.x() - other.x()).abs() + (self.y() - other.y()).abs()
    }
}

impl CartesianPoint2d for Point2d {
    fn x(&self) -> f64 {
        self.x
    }

    fn y(&self) -> f64 {
        self.y
    }
}

impl CartesianPoint2d for (f64, f64) {
    fn x(&self) -> f64 {
        self.0
    }

    fn y(&self) -> f64 {
        self.1
    }
}
