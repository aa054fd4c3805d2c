//! Contour is a sequence of points.
//!
//! Contours can be:
//! * **open** - the first and the last points are not connected (a road, a digitized line);
//! * **closed** - the first and the last points are connected (a polygon ring).
//!
//! Unlike an OGC `LineString`, a closed contour does not repeat its first point at the end. Use
//! [`Contour::iter_points_closing`] to get the closing point back when drawing.

use serde::{Deserialize, Serialize};

use crate::cartesian::{CartesianPoint2d, Rect};
use crate::geo::Projection;

/// Sequence of points that is either open or closed. See module level documentation.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Contour<P> {
    points: Vec<P>,
    is_closed: bool,
}

impl<P> Contour<P> {
    /// Creates a new contour.
    pub fn new(points: Vec<P>, is_closed: bool) -> Self {
        Self { points, is_closed }
    }

    /// Creates a new open contour.
    pub fn open(points: Vec<P>) -> Self {
        Self::new(points, false)
    }

    /// Creates a new closed contour.
    pub fn closed(points: Vec<P>) -> Self {
        Self::new(points, true)
    }

    /// Whether the last point is connected to the first one.
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// Points of the contour without the closing point.
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// Number of points in the contour.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the contour has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates over the points. For closed contours the first point is repeated at the end.
    pub fn iter_points_closing(&self) -> impl Iterator<Item = &P> {
        let closing = if self.is_closed {
            self.points.first()
        } else {
            None
        };
        self.points.iter().chain(closing)
    }

    /// Converts the contour into a [`ClosedContour`], or returns `None` if it is open.
    pub fn into_closed(self) -> Option<ClosedContour<P>> {
        if self.is_closed {
            Some(ClosedContour {
                points: self.points,
            })
        } else {
            None
        }
    }

    /// Projects all points of the contour. Returns `None` if any point cannot be projected.
    pub fn project_points<Proj>(&self, projection: &Proj) -> Option<Contour<Proj::OutPoint>>
    where
        Proj: Projection<InPoint = P> + ?Sized,
    {
        Some(Contour {
            points: self
                .points
                .iter()
                .map(|p| projection.project(p))
                .collect::<Option<Vec<_>>>()?,
            is_closed: self.is_closed,
        })
    }
}

impl<P: CartesianPoint2d> Contour<P> {
    /// Bounding rectangle of the points, `None` for an empty contour.
    pub fn bounding_rectangle(&self) -> Option<Rect> {
        Rect::from_points(self.points.iter())
    }
}

impl<P> From<ClosedContour<P>> for Contour<P> {
    fn from(value: ClosedContour<P>) -> Self {
        Self::closed(value.points)
    }
}

/// Contour that is always closed. Polygon rings are closed contours.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClosedContour<P> {
    points: Vec<P>,
}

impl<P> ClosedContour<P> {
    /// Creates a closed contour from the ring points.
    ///
    /// If the last point repeats the first one (as in GeoJSON rings), the duplicate is dropped.
    pub fn new(mut points: Vec<P>) -> Self
    where
        P: PartialEq,
    {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Self { points }
    }

    /// Ring points without the closing point.
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// Number of distinct points in the ring.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the ring has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates over the ring points with the first point repeated at the end.
    pub fn iter_points_closing(&self) -> impl Iterator<Item = &P> {
        self.points.iter().chain(self.points.first())
    }

    /// Projects all points of the ring.
    pub fn project_points<Proj>(&self, projection: &Proj) -> Option<ClosedContour<Proj::OutPoint>>
    where
        Proj: Projection<InPoint = P> + ?Sized,
    {
        Some(ClosedContour {
            points: self
                .points
                .iter()
                .map(|p| projection.project(p))
                .collect::<Option<Vec<_>>>()?,
        })
    }
}

impl<P: CartesianPoint2d> ClosedContour<P> {
    /// Bounding rectangle of the ring.
    pub fn bounding_rectangle(&self) -> Option<Rect> {
        Rect::from_points(self.points.iter())
    }
}
