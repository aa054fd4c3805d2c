use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::cartesian::Point2d;
use crate::geo::Datum;

/// Latitude at which the Web Mercator world becomes a square.
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Conversion of points from one coordinate system to another.
pub trait Projection {
    /// Type of the input point.
    type InPoint;
    /// Type of the output point.
    type OutPoint;

    /// Converts a point into the output coordinate system. Returns `None` if the point cannot be
    /// represented there.
    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint>;

    /// Converts a point back into the input coordinate system.
    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint>;
}

impl<In, Out> Projection for Box<dyn Projection<InPoint = In, OutPoint = Out>> {
    type InPoint = In;
    type OutPoint = Out;

    fn project(&self, input: &In) -> Option<Out> {
        self.as_ref().project(input)
    }

    fn unproject(&self, input: &Out) -> Option<In> {
        self.as_ref().unproject(input)
    }
}

/// Projection that returns the point unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProjection;

impl Projection for IdentityProjection {
    type InPoint = Point2d;
    type OutPoint = Point2d;

    fn project(&self, input: &Point2d) -> Option<Point2d> {
        Some(*input)
    }

    fn unproject(&self, input: &Point2d) -> Option<Point2d> {
        Some(*input)
    }
}

/// Spherical Web Mercator (EPSG:3857). Input points are `(lon, lat)` in degrees, output points are
/// meters.
///
/// Latitudes beyond [`WEB_MERCATOR_MAX_LAT`] are clamped to it, so the poles map to the edges of
/// the square world. Latitudes outside of `-90..=90` cannot be projected.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator {
    datum: Datum,
}

impl WebMercator {
    /// Creates the projection for the given datum.
    pub fn new(datum: Datum) -> Self {
        Self { datum }
    }
}

impl Projection for WebMercator {
    type InPoint = Point2d;
    type OutPoint = Point2d;

    fn project(&self, input: &Point2d) -> Option<Point2d> {
        if !(-90.0..=90.0).contains(&input.y) {
            return None;
        }

        let lat = input.y.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT);
        let r = self.datum.semimajor();
        let x = r * input.x.to_radians();
        let y = r * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();

        if x.is_finite() && y.is_finite() {
            Some(Point2d::new(x, y))
        } else {
            None
        }
    }

    fn unproject(&self, input: &Point2d) -> Option<Point2d> {
        let r = self.datum.semimajor();
        let lat = FRAC_PI_2 - 2.0 * (-input.y / r).exp().atan();
        let lon = input.x / r;

        let result = Point2d::new(lon.to_degrees(), lat.to_degrees());
        (result.x.is_finite() && result.y.is_finite()).then_some(result)
    }
}

/// Swaps `project` and `unproject` of the wrapped projection.
pub struct InvertedProjection<P> {
    inner: P,
}

impl<P> InvertedProjection<P> {
    /// Wraps the projection.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: Projection> Projection for InvertedProjection<P> {
    type InPoint = P::OutPoint;
    type OutPoint = P::InPoint;

    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint> {
        self.inner.unproject(input)
    }

    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint> {
        self.inner.project(input)
    }
}

/// Applies two projections one after another.
pub struct ChainProjection<First, Second> {
    first: First,
    second: Second,
}

impl<First, Second> ChainProjection<First, Second> {
    /// Creates a chain that applies `first` and then `second`.
    pub fn new(first: First, second: Second) -> Self {
        Self { first, second }
    }
}

impl<First, Second> Projection for ChainProjection<First, Second>
where
    First: Projection,
    Second: Projection<InPoint = First::OutPoint>,
{
    type InPoint = First::InPoint;
    type OutPoint = Second::OutPoint;

    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint> {
        self.second.project(&self.first.project(input)?)
    }

    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint> {
        self.first.unproject(&self.second.unproject(input)?)
    }
}
