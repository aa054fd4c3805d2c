use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};

use crate::cartesian::{CartesianPoint2d, Point2d};

/// Axis-aligned rectangle in world coordinates `(x_min, y_min, x_max, y_max)`.
///
/// This is the extent type of layers and of the map view. The constructor orders the corners so
/// that `x_min <= x_max` and `y_min <= y_max` always hold. Zero-area rectangles are allowed.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

impl Rect {
    /// Creates a rectangle from its corner coordinates.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min: x_min.min(x_max),
            y_min: y_min.min(y_max),
            x_max: x_max.max(x_min),
            y_max: y_max.max(y_min),
        }
    }

    /// Minimum X.
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Maximum X.
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// Minimum Y.
    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    /// Maximum Y.
    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Returns true if both width and height are greater than zero.
    pub fn has_area(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// Center point.
    pub fn center(&self) -> Point2d {
        Point2d::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn merge(&self, other: Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Overlapping part of two rectangles, or `None` if they do not overlap.
    pub fn intersection(&self, other: Self) -> Option<Self> {
        let x_min = self.x_min.max(other.x_min);
        let y_min = self.y_min.max(other.y_min);
        let x_max = self.x_max.min(other.x_max);
        let y_max = self.y_max.min(other.y_max);

        if x_min > x_max || y_min > y_max {
            return None;
        }

        Some(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    /// Zero-sized rectangle at the given point.
    pub fn from_point(p: &impl CartesianPoint2d) -> Self {
        Self {
            x_min: p.x(),
            x_max: p.x(),
            y_min: p.y(),
            y_max: p.y(),
        }
    }

    /// Bounding rectangle of the points, or `None` if the iterator is empty.
    pub fn from_points<'a, P: CartesianPoint2d + 'a>(
        mut points: impl Iterator<Item = &'a P>,
    ) -> Option<Self> {
        let first = points.next()?;
        Some(points.fold(Self::from_point(first), |rect, p| {
            rect.merge(Self::from_point(p))
        }))
    }

    /// Returns true if the point lies inside the rectangle or on its border.
    pub fn contains(&self, point: &impl CartesianPoint2d) -> bool {
        self.x_min <= point.x()
            && self.x_max >= point.x()
            && self.y_min <= point.y()
            && self.y_max >= point.y()
    }

    /// Scales the rectangle by `factor` around its center.
    pub fn magnify(&self, factor: f64) -> Self {
        let center = self.center();
        let half_width = self.width() / 2.0 * factor;
        let half_height = self.height() / 2.0 * factor;
        Self {
            x_min: center.x - half_width,
            x_max: center.x + half_width,
            y_min: center.y - half_height,
            y_max: center.y + half_height,
        }
    }

    /// Grows every side of the rectangle by `fraction` of the corresponding dimension.
    ///
    /// A fraction of `0.05` adds 5% of the width on the left and on the right, and 5% of the
    /// height on the top and on the bottom.
    pub fn expand(&self, fraction: f64) -> Self {
        let margin_x = self.width() * fraction;
        let margin_y = self.height() * fraction;
        Self {
            x_min: self.x_min - margin_x,
            y_min: self.y_min - margin_y,
            x_max: self.x_max + margin_x,
            y_max: self.y_max + margin_y,
        }
    }

    /// Moves the rectangle by the given offset.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x_min: self.x_min + dx,
            y_min: self.y_min + dy,
            x_max: self.x_max + dx,
            y_max: self.y_max + dy,
        }
    }

    /// Rectangle of the given size centered at the point.
    pub fn centered_at(center: Point2d, width: f64, height: f64) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            center.x + width / 2.0,
            center.y + height / 2.0,
        )
    }

    /// Corner points, counterclockwise starting from `(x_min, y_min)`.
    pub fn into_quadrangle(self) -> [Point2d; 4] {
        [
            Point2d::new(self.x_min, self.y_min),
            Point2d::new(self.x_max, self.y_min),
            Point2d::new(self.x_max, self.y_max),
            Point2d::new(self.x_min, self.y_max),
        ]
    }

    /// Raw bit patterns of the four coordinates. Two rectangles with equal bits are the same
    /// rectangle down to the last ulp.
    pub fn to_bits(&self) -> [u64; 4] {
        [
            self.x_min.to_bits(),
            self.y_min.to_bits(),
            self.x_max.to_bits(),
            self.y_max.to_bits(),
        ]
    }
}

impl AbsDiffEq for Rect {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.x_min.abs_diff_eq(&other.x_min, epsilon)
            && self.y_min.abs_diff_eq(&other.y_min, epsilon)
            && self.x_max.abs_diff_eq(&other.x_max, epsilon)
            && self.y_max.abs_diff_eq(&other.y_max, epsilon)
    }
}

impl RelativeEq for Rect {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.x_min.relative_eq(&other.x_min, epsilon, max_relative)
            && self.y_min.relative_eq(&other.y_min, epsilon, max_relative)
            && self.x_max.relative_eq(&other.x_max, epsilon, max_relative)
            && self.y_max.relative_eq(&other.y_max, epsilon, max_relative)
    }
}
