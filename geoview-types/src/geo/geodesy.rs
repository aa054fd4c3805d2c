use geodesy::prelude::*;

use crate::cartesian::Point2d;
use crate::geo::projection::Projection;

/// Projection defined by a `geodesy` operator, e.g. `utm zone=23 south ellps=GRS80`.
///
/// Input points are `(lon, lat)` in degrees, output points are in the units of the operator.
pub struct GeodesyProjection {
    context: Minimal,
    op: OpHandle,
}

impl GeodesyProjection {
    /// Creates the projection. Returns `None` if the definition cannot be parsed.
    pub fn new(definition: &str) -> Option<Self> {
        let mut context = Minimal::new();
        let op = context.op(definition).ok()?;
        Some(Self { context, op })
    }
}

impl Projection for GeodesyProjection {
    type InPoint = Point2d;
    type OutPoint = Point2d;

    fn project(&self, input: &Point2d) -> Option<Point2d> {
        let mut data = [Coor2D::geo(input.y, input.x)];
        self.context.apply(self.op, Fwd, &mut data).ok()?;

        let [x, y] = data[0].0;
        (x.is_finite() && y.is_finite()).then(|| Point2d::new(x, y))
    }

    fn unproject(&self, input: &Point2d) -> Option<Point2d> {
        let mut data = [Coor2D([input.x, input.y])];
        self.context.apply(self.op, Inv, &mut data).ok()?;

        let [lon, lat] = data[0].0;
        let result = Point2d::new(lon.to_degrees(), lat.to_degrees());
        (result.x.is_finite() && result.y.is_finite()).then_some(result)
    }
}
