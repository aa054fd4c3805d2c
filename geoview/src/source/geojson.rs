use std::path::Path;

use geojson::GeoJson;
use geoview_types::cartesian::Point2d;
use geoview_types::geojson::crs_from_foreign_members;
use geoview_types::Geom;

use super::{SourceConfig, VectorData, VectorSource};
use crate::error::GeoviewError;
use crate::layer::Feature;

/// Reader of GeoJSON files.
///
/// Accepts a feature collection, a single feature or a bare geometry. The CRS is taken from the
/// legacy `crs` member when present, otherwise [`SourceConfig::default_vector_crs`] is used.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonSource {
    config: SourceConfig,
}

impl GeoJsonSource {
    /// Creates a reader with the given settings.
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    /// Parses GeoJSON text.
    pub fn parse(&self, text: &str) -> Result<VectorData, GeoviewError> {
        let geojson = text.parse::<GeoJson>()?;

        let (raw_features, crs) = match geojson {
            GeoJson::FeatureCollection(collection) => {
                let crs = collection
                    .foreign_members
                    .as_ref()
                    .and_then(crs_from_foreign_members);
                (collection.features, crs)
            }
            GeoJson::Feature(feature) => {
                let crs = feature
                    .foreign_members
                    .as_ref()
                    .and_then(crs_from_foreign_members);
                (vec![feature], crs)
            }
            GeoJson::Geometry(geometry) => {
                let crs = geometry
                    .foreign_members
                    .as_ref()
                    .and_then(crs_from_foreign_members);
                (vec![geojson::Feature::from(geometry)], crs)
            }
        };

        let mut features = Vec::with_capacity(raw_features.len());
        for (index, feature) in raw_features.into_iter().enumerate() {
            let Some(geometry) = &feature.geometry else {
                log::debug!("Feature {index} has no geometry, skipping");
                continue;
            };

            match Geom::<Point2d>::try_from(geometry) {
                Ok(geom) => {
                    features.push(Feature::new(geom, feature.properties.unwrap_or_default()))
                }
                Err(err) if self.config.skip_invalid_features() => {
                    log::warn!("Skipping feature {index}: {err}");
                }
                Err(err) => return Err(err.into()),
            }
        }

        let crs = crs.unwrap_or_else(|| self.config.default_vector_crs().clone());
        Ok(VectorData::from_features(features, Some(crs)))
    }
}

impl VectorSource for GeoJsonSource {
    fn open(&self, path: &Path) -> Result<VectorData, GeoviewError> {
        let text = std::fs::read_to_string(path).map_err(|err| GeoviewError::load(path, err))?;
        let data = self
            .parse(&text)
            .map_err(|err| GeoviewError::load(path, err))?;

        log::debug!(
            "Read {} features from {}",
            data.features.len(),
            path.display()
        );
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use geoview_types::cartesian::Rect;
    use geoview_types::geo::Crs;
    use geoview_types::GeometryType;

    const POINTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"name": "a"}, "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}},
            {"type": "Feature", "properties": {"name": "b"}, "geometry": {"type": "Point", "coordinates": [5.0, -3.0]}},
            {"type": "Feature", "properties": {"name": "c"}, "geometry": null}
        ]
    }"#;

    #[test]
    fn reads_feature_collection() {
        let data = GeoJsonSource::default().parse(POINTS).unwrap();
        assert_eq!(data.features.len(), 2);
        assert_eq!(data.extent, Some(Rect::new(1.0, -3.0, 5.0, 2.0)));
        assert_eq!(data.geometry_type, GeometryType::Point);
        assert_eq!(data.crs, Some(Crs::WGS84));
        assert_eq!(data.features[1].attributes()["name"], "b");
    }

    #[test]
    fn reads_legacy_crs() {
        let text = r#"{
            "type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3857"}},
            "features": [
                {"type": "Feature", "properties": null, "geometry": {"type": "LineString", "coordinates": [[0, 0], [10, 10]]}}
            ]
        }"#;
        let data = GeoJsonSource::default().parse(text).unwrap();
        assert_eq!(data.crs, Some(Crs::EPSG3857));
        assert_eq!(data.geometry_type, GeometryType::LineString);
    }

    #[test]
    fn invalid_geometry_handling() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {}, "geometry": {"type": "GeometryCollection", "geometries": []}},
            {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [0, 0]}}
        ]}"#;

        let data = GeoJsonSource::default().parse(text).unwrap();
        assert_eq!(data.features.len(), 1);

        let strict = GeoJsonSource::new(SourceConfig::default().with_skip_invalid_features(false));
        assert_matches!(strict.parse(text), Err(GeoviewError::Types(_)));
    }

    #[test]
    fn missing_file_is_load_error() {
        let result = GeoJsonSource::default().open(Path::new("/definitely/not/here.geojson"));
        assert_matches!(result, Err(GeoviewError::Load { .. }));
    }

    #[test]
    fn broken_json_is_load_error() {
        assert_matches!(
            GeoJsonSource::default().parse("{not json"),
            Err(GeoviewError::GeoJson(_))
        );
    }
}
