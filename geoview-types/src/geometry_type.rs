use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Kind of geometry stored in a feature or declared by a vector source.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum GeometryType {
    /// Single point.
    Point,
    /// Set of points.
    MultiPoint,
    /// Line string.
    LineString,
    /// Set of line strings.
    MultiLineString,
    /// Polygon.
    Polygon,
    /// Set of polygons.
    MultiPolygon,
    /// Source mixes several geometry kinds, or has no features.
    Unknown,
}

impl GeometryType {
    /// Geometry type that describes a collection of features with the given types.
    ///
    /// Returns the common type if all features share it, [`GeometryType::Unknown`] otherwise.
    pub fn common(types: impl IntoIterator<Item = GeometryType>) -> GeometryType {
        let mut iter = types.into_iter();
        let Some(first) = iter.next() else {
            return GeometryType::Unknown;
        };

        if iter.all(|t| t == first) {
            first
        } else {
            GeometryType::Unknown
        }
    }
}

impl Display for GeometryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GeometryType::Point => "Point",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::LineString => "LineString",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}
