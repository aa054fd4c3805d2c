use serde::{Deserialize, Serialize};

use crate::cartesian::{CartesianPoint2d, Rect};
use crate::contour::Contour;
use crate::geo::Projection;
use crate::geometry_type::GeometryType;
use crate::polygon::Polygon;

/// Set of points.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MultiPoint<P>(pub Vec<P>);

/// Set of contours (multi line string).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MultiContour<P>(pub Vec<Contour<P>>);

/// Set of polygons.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MultiPolygon<P>(pub Vec<Polygon<P>>);

/// Any of the supported geometries.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Geom<P> {
    /// Point.
    Point(P),
    /// MultiPoint.
    MultiPoint(MultiPoint<P>),
    /// Contour (line string).
    Contour(Contour<P>),
    /// MultiContour.
    MultiContour(MultiContour<P>),
    /// Polygon.
    Polygon(Polygon<P>),
    /// MultiPolygon.
    MultiPolygon(MultiPolygon<P>),
}

impl<P> Geom<P> {
    /// Type of the geometry.
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geom::Point(_) => GeometryType::Point,
            Geom::MultiPoint(_) => GeometryType::MultiPoint,
            Geom::Contour(_) => GeometryType::LineString,
            Geom::MultiContour(_) => GeometryType::MultiLineString,
            Geom::Polygon(_) => GeometryType::Polygon,
            Geom::MultiPolygon(_) => GeometryType::MultiPolygon,
        }
    }

    /// Projects the geometry with the given projection. Returns `None` if any of the points
    /// cannot be projected.
    pub fn project<Proj>(&self, projection: &Proj) -> Option<Geom<Proj::OutPoint>>
    where
        Proj: Projection<InPoint = P> + ?Sized,
    {
        Some(match self {
            Geom::Point(p) => Geom::Point(projection.project(p)?),
            Geom::MultiPoint(MultiPoint(points)) => Geom::MultiPoint(MultiPoint(
                points
                    .iter()
                    .map(|p| projection.project(p))
                    .collect::<Option<_>>()?,
            )),
            Geom::Contour(c) => Geom::Contour(c.project_points(projection)?),
            Geom::MultiContour(MultiContour(contours)) => Geom::MultiContour(MultiContour(
                contours
                    .iter()
                    .map(|c| c.project_points(projection))
                    .collect::<Option<_>>()?,
            )),
            Geom::Polygon(p) => Geom::Polygon(p.project_points(projection)?),
            Geom::MultiPolygon(MultiPolygon(polygons)) => Geom::MultiPolygon(MultiPolygon(
                polygons
                    .iter()
                    .map(|p| p.project_points(projection))
                    .collect::<Option<_>>()?,
            )),
        })
    }
}

impl<P: CartesianPoint2d> Geom<P> {
    /// Bounding rectangle of the geometry, `None` if it has no points.
    pub fn bounding_rectangle(&self) -> Option<Rect> {
        match self {
            Geom::Point(p) => Some(Rect::from_point(p)),
            Geom::MultiPoint(MultiPoint(points)) => Rect::from_points(points.iter()),
            Geom::Contour(c) => c.bounding_rectangle(),
            Geom::MultiContour(MultiContour(contours)) => {
                merge_all(contours.iter().map(Contour::bounding_rectangle))
            }
            Geom::Polygon(p) => p.bounding_rectangle(),
            Geom::MultiPolygon(MultiPolygon(polygons)) => {
                merge_all(polygons.iter().map(Polygon::bounding_rectangle))
            }
        }
    }
}

fn merge_all(rects: impl Iterator<Item = Option<Rect>>) -> Option<Rect> {
    rects.flatten().reduce(|acc, r| acc.merge(r))
}

impl<P> From<Contour<P>> for Geom<P> {
    fn from(value: Contour<P>) -> Self {
        Self::Contour(value)
    }
}

impl<P> From<Polygon<P>> for Geom<P> {
    fn from(value: Polygon<P>) -> Self {
        Self::Polygon(value)
    }
}

impl<P> From<MultiPolygon<P>> for Geom<P> {
    fn from(value: MultiPolygon<P>) -> Self {
        Self::MultiPolygon(value)
    }
}
