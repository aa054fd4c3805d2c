use serde::{Deserialize, Serialize};

/// Geodetic datum of a coordinate system, identified by its reference ellipsoid.
///
/// The datums known here differ by less than a meter, so coordinates are never shifted between
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum Datum {
    /// World Geodetic System 1984.
    #[default]
    WGS84,
    /// SIRGAS 2000, realized on the GRS80 ellipsoid.
    SIRGAS2000,
}

impl Datum {
    /// Semi-major axis of the ellipsoid in meters.
    pub fn semimajor(&self) -> f64 {
        6_378_137.0
    }

    /// Name of the ellipsoid as used in projection definitions (`ellps=`).
    pub fn ellipsoid_name(&self) -> &'static str {
        match self {
            Self::WGS84 => "WGS84",
            Self::SIRGAS2000 => "GRS80",
        }
    }
}
