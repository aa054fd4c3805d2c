//! Value types shared by the `geoview` map compositor: points, extents, simple geometries and
//! coordinate reference systems.
//!
//! All coordinates are `f64`. A [`Rect`](cartesian::Rect) is the extent type used throughout the
//! engine, [`Geom`] is the closed set of geometries a vector layer can contain and
//! [`Crs`](geo::Crs) identifies the coordinate system a layer is stored in.

pub mod cartesian;
pub mod error;
pub mod geo;
#[cfg(feature = "geojson")]
pub mod geojson;

mod contour;
mod geometry;
mod geometry_type;
mod polygon;

pub use contour::{ClosedContour, Contour};
pub use geometry::{Geom, MultiContour, MultiPoint, MultiPolygon};
pub use geometry_type::GeometryType;
pub use polygon::Polygon;
