use geoview_types::cartesian::Point2d;
use geoview_types::Geom;
use serde_json::{Map, Value};

/// One geometry of a vector layer together with its attributes.
///
/// Features are immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    geometry: Geom<Point2d>,
    attributes: Map<String, Value>,
}

impl Feature {
    /// Creates a new feature.
    pub fn new(geometry: Geom<Point2d>, attributes: Map<String, Value>) -> Self {
        Self {
            geometry,
            attributes,
        }
    }

    /// Geometry of the feature in the layer CRS.
    pub fn geometry(&self) -> &Geom<Point2d> {
        &self.geometry
    }

    /// All attributes.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Value of a single attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

impl From<Geom<Point2d>> for Feature {
    fn from(geometry: Geom<Point2d>) -> Self {
        Self::new(geometry, Map::new())
    }
}
