//! Conversion of [`geojson`] geometries into [`Geom`] values.
//!
//! Positions are read as `(x, y)`; additional ordinates are ignored.

use geojson::{LineStringType, PolygonType, Position, Value};

use crate::cartesian::Point2d;
use crate::error::GeoviewTypesError;
use crate::geo::Crs;
use crate::{ClosedContour, Contour, Geom, MultiContour, MultiPoint, MultiPolygon, Polygon};

impl TryFrom<&geojson::Geometry> for Geom<Point2d> {
    type Error = GeoviewTypesError;

    fn try_from(geometry: &geojson::Geometry) -> Result<Self, Self::Error> {
        Geom::try_from(&geometry.value)
    }
}

impl TryFrom<&Value> for Geom<Point2d> {
    type Error = GeoviewTypesError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Ok(match value {
            Value::Point(p) => Geom::Point(convert_position(p)?),
            Value::MultiPoint(points) => Geom::MultiPoint(MultiPoint(
                points
                    .iter()
                    .map(convert_position)
                    .collect::<Result<_, _>>()?,
            )),
            Value::LineString(line) => Geom::Contour(convert_contour(line)?),
            Value::MultiLineString(lines) => Geom::MultiContour(MultiContour(
                lines
                    .iter()
                    .map(convert_contour)
                    .collect::<Result<_, _>>()?,
            )),
            Value::Polygon(polygon) => Geom::Polygon(convert_polygon(polygon)?),
            Value::MultiPolygon(polygons) => Geom::MultiPolygon(MultiPolygon(
                polygons
                    .iter()
                    .map(convert_polygon)
                    .collect::<Result<_, _>>()?,
            )),
            Value::GeometryCollection(_) => {
                return Err(GeoviewTypesError::Conversion(
                    "geometry collections are not supported".into(),
                ))
            }
        })
    }
}

fn convert_position(position: &Position) -> Result<Point2d, GeoviewTypesError> {
    match position.as_slice() {
        [x, y, ..] => Ok(Point2d::new(*x, *y)),
        _ => Err(GeoviewTypesError::Conversion(format!(
            "position must have at least 2 ordinates, got {}",
            position.len()
        ))),
    }
}

fn convert_contour(line: &LineStringType) -> Result<Contour<Point2d>, GeoviewTypesError> {
    Ok(Contour::open(
        line.iter()
            .map(convert_position)
            .collect::<Result<_, _>>()?,
    ))
}

fn convert_ring(ring: &LineStringType) -> Result<ClosedContour<Point2d>, GeoviewTypesError> {
    Ok(ClosedContour::new(
        ring.iter()
            .map(convert_position)
            .collect::<Result<_, _>>()?,
    ))
}

fn convert_polygon(polygon: &PolygonType) -> Result<Polygon<Point2d>, GeoviewTypesError> {
    let Some((outer, inner)) = polygon.split_first() else {
        return Err(GeoviewTypesError::Conversion(
            "polygon must have an outer ring".into(),
        ));
    };

    Ok(Polygon::new(
        convert_ring(outer)?,
        inner.iter().map(convert_ring).collect::<Result<_, _>>()?,
    ))
}

/// Reads the legacy `crs` member of a GeoJSON object (GeoJSON 2008), e.g.
/// `{"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3857"}}`.
///
/// Returns `None` if the member is absent or cannot be understood.
pub fn crs_from_foreign_members(members: &geojson::JsonObject) -> Option<Crs> {
    let name = members
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;
    Crs::parse(name).ok()
}
