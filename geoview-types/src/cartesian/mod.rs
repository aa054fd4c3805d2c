//! Types and functions on geometries in cartesian coordinates.

mod point;
mod rect;
mod size;

pub use point::{CartesianPoint2d, Point2d, Vector2d};
pub use rect::Rect;
pub use size::Size;
