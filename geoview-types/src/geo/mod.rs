//! Coordinate reference systems and conversion of coordinates between them (see [`Projection`]).
//!
//! Geographic coordinates are stored in [`Point2d`](crate::cartesian::Point2d) values with
//! longitude as `x` and latitude as `y`, both in degrees.

mod crs;
mod datum;
#[cfg(feature = "geodesy")]
mod geodesy;
mod projection;

pub use crs::{Crs, PointTransform, ProjectionType, UtmZone};
pub use datum::Datum;
#[cfg(feature = "geodesy")]
pub use geodesy::GeodesyProjection;
pub use projection::{
    ChainProjection, IdentityProjection, InvertedProjection, Projection, WebMercator,
    WEB_MERCATOR_MAX_LAT,
};
