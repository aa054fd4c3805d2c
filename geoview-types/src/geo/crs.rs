use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::cartesian::Point2d;
use crate::error::GeoviewTypesError;
use crate::geo::datum::Datum;
#[cfg(feature = "geodesy")]
use crate::geo::geodesy::GeodesyProjection;
use crate::geo::projection::{
    ChainProjection, IdentityProjection, InvertedProjection, Projection, WebMercator,
};

const WGS84_UTM_NORTH: u32 = 32600;
const WGS84_UTM_SOUTH: u32 = 32700;
const SIRGAS2000_UTM_NORTH: u32 = 31954;
const SIRGAS2000_UTM_SOUTH: u32 = 31960;

/// Coordinate reference system of a layer or of the map.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Crs {
    datum: Datum,
    projection_type: ProjectionType,
}

/// Projection part of a [`Crs`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ProjectionType {
    /// Geographic coordinates (longitude, latitude in degrees).
    None,
    /// Spherical Web Mercator.
    WebMercator,
    /// Universal Transverse Mercator.
    Utm(UtmZone),
    /// Any other system known by its EPSG code. Coordinates can only be used as they are.
    Epsg(u32),
    /// System known only by its textual definition.
    Other(String),
}

/// Zone of the Universal Transverse Mercator system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct UtmZone {
    /// Zone number, `1..=60`.
    pub zone: u8,
    /// Southern hemisphere (false northing of 10 000 km).
    pub south: bool,
}

impl UtmZone {
    /// Zone containing the given geographic position, `None` for coordinates out of range.
    ///
    /// Norway and Svalbard zone exceptions are not applied.
    pub fn containing(lon: f64, lat: f64) -> Option<Self> {
        if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
            return None;
        }

        let zone = (((lon + 180.0) / 6.0).floor() as u8 + 1).min(60);
        Some(Self {
            zone,
            south: lat < 0.0,
        })
    }

    /// EPSG code of the zone on the WGS84 datum.
    pub fn epsg_code(&self) -> u32 {
        let base = if self.south {
            WGS84_UTM_SOUTH
        } else {
            WGS84_UTM_NORTH
        };
        base + self.zone as u32
    }

    /// WGS84 based CRS of the zone.
    pub fn crs(&self) -> Crs {
        Crs::new(Datum::WGS84, ProjectionType::Utm(*self))
    }

    /// Longitude of the central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        self.zone as f64 * 6.0 - 183.0
    }
}

/// Function converting points between two coordinate systems.
pub type PointTransform = Box<dyn Projection<InPoint = Point2d, OutPoint = Point2d>>;

impl Crs {
    /// Geographic WGS84 coordinates (EPSG:4326).
    pub const WGS84: Crs = Crs {
        datum: Datum::WGS84,
        projection_type: ProjectionType::None,
    };

    /// Web Mercator (EPSG:3857).
    pub const EPSG3857: Crs = Crs {
        datum: Datum::WGS84,
        projection_type: ProjectionType::WebMercator,
    };

    /// Creates a new CRS.
    pub fn new(datum: Datum, projection_type: ProjectionType) -> Self {
        Self {
            datum,
            projection_type,
        }
    }

    /// CRS with the given EPSG code.
    ///
    /// WGS84 UTM zones (326xx, 327xx) and SIRGAS 2000 UTM zones (31965..=31985) are recognized,
    /// other codes are kept as [`ProjectionType::Epsg`].
    pub fn from_epsg(code: u32) -> Self {
        let utm = |datum, zone: u32, south| {
            Self::new(
                datum,
                ProjectionType::Utm(UtmZone {
                    zone: zone as u8,
                    south,
                }),
            )
        };

        match code {
            4326 => Self::WGS84,
            4674 => Self::new(Datum::SIRGAS2000, ProjectionType::None),
            3857 | 3785 | 900913 => Self::EPSG3857,
            32601..=32660 => utm(Datum::WGS84, code - WGS84_UTM_NORTH, false),
            32701..=32760 => utm(Datum::WGS84, code - WGS84_UTM_SOUTH, true),
            31965..=31976 => utm(Datum::SIRGAS2000, code - SIRGAS2000_UTM_NORTH, false),
            31977..=31985 => utm(Datum::SIRGAS2000, code - SIRGAS2000_UTM_SOUTH, true),
            _ => Self::new(Datum::WGS84, ProjectionType::Epsg(code)),
        }
    }

    /// Parses a CRS identifier.
    ///
    /// Accepts `EPSG:xxxx`, `urn:ogc:def:crs:EPSG::xxxx` and `urn:ogc:def:crs:OGC:1.3:CRS84`.
    /// Any other non-empty text is kept as [`ProjectionType::Other`].
    pub fn parse(definition: &str) -> Result<Self, GeoviewTypesError> {
        let definition = definition.trim();
        if definition.is_empty() {
            return Err(GeoviewTypesError::UnsupportedCrs(
                "empty CRS definition".into(),
            ));
        }

        if definition.ends_with("CRS84") {
            return Ok(Self::WGS84);
        }

        let upper = definition.to_ascii_uppercase();
        if let Some(pos) = upper.rfind("EPSG:") {
            let code = upper[pos + 5..].trim_start_matches(':');
            return code.parse::<u32>().map(Self::from_epsg).map_err(|_| {
                GeoviewTypesError::UnsupportedCrs(format!("invalid EPSG code in '{definition}'"))
            });
        }

        Ok(Self::new(
            Datum::WGS84,
            ProjectionType::Other(definition.to_string()),
        ))
    }

    /// Datum of the CRS.
    pub fn datum(&self) -> Datum {
        self.datum
    }

    /// Projection type of the CRS.
    pub fn projection_type(&self) -> &ProjectionType {
        &self.projection_type
    }

    /// EPSG code of the CRS, if it is known.
    pub fn epsg_code(&self) -> Option<u32> {
        match (&self.projection_type, self.datum) {
            (ProjectionType::None, Datum::WGS84) => Some(4326),
            (ProjectionType::None, Datum::SIRGAS2000) => Some(4674),
            (ProjectionType::WebMercator, _) => Some(3857),
            (ProjectionType::Utm(zone), Datum::WGS84) => Some(zone.epsg_code()),
            (ProjectionType::Utm(zone), Datum::SIRGAS2000) => Some(
                zone.zone as u32
                    + if zone.south {
                        SIRGAS2000_UTM_SOUTH
                    } else {
                        SIRGAS2000_UTM_NORTH
                    },
            ),
            (ProjectionType::Epsg(code), _) => Some(*code),
            (ProjectionType::Other(_), _) => None,
        }
    }

    /// Returns true if coordinates are longitude and latitude.
    pub fn is_geographic(&self) -> bool {
        self.projection_type == ProjectionType::None
    }

    /// Returns true if coordinates are planar (projected). Systems known only by a code or a
    /// definition that is not understood are reported as not projected.
    pub fn is_projected(&self) -> bool {
        matches!(
            self.projection_type,
            ProjectionType::WebMercator | ProjectionType::Utm(_)
        )
    }

    /// Projection from geographic coordinates into this CRS, if it is supported.
    pub fn get_projection(&self) -> Option<PointTransform> {
        match &self.projection_type {
            ProjectionType::None => Some(Box::new(IdentityProjection)),
            ProjectionType::WebMercator => Some(Box::new(WebMercator::new(self.datum))),
            #[cfg(feature = "geodesy")]
            ProjectionType::Utm(zone) => {
                let definition = format!(
                    "utm zone={}{} ellps={}",
                    zone.zone,
                    if zone.south { " south" } else { "" },
                    self.datum.ellipsoid_name()
                );
                GeodesyProjection::new(&definition).map(|p| Box::new(p) as PointTransform)
            }
            _ => None,
        }
    }

    /// Transformation of points from this CRS into `target`.
    ///
    /// Equal systems always get an identity transformation, even if the projection itself is not
    /// supported. Returns `None` if no conversion is known.
    pub fn transformation_to(&self, target: &Crs) -> Option<PointTransform> {
        if self == target {
            return Some(Box::new(IdentityProjection));
        }

        let from = self.get_projection()?;
        let to = target.get_projection()?;
        Some(Box::new(ChainProjection::new(
            InvertedProjection::new(from),
            to,
        )))
    }
}

impl Display for Crs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.projection_type, self.epsg_code()) {
            (_, Some(code)) => write!(f, "EPSG:{code}"),
            (ProjectionType::Other(definition), None) => f.write_str(definition),
            _ => f.write_str("unknown CRS"),
        }
    }
}
