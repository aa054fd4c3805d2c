use std::path::PathBuf;

use geoview_types::cartesian::Rect;
use geoview_types::geo::Crs;
use geoview_types::GeometryType;

use super::{Feature, LayerProperties};
use crate::error::GeoviewError;
use crate::render::VectorStyle;
use crate::source::{open_vector, SourceConfig, VectorData, VectorSource};

/// Layer of vector features.
#[derive(Debug, Clone)]
pub struct VectorLayer {
    pub(crate) properties: LayerProperties,
    crs: Option<Crs>,
    extent: Option<Rect>,
    geometry_type: GeometryType,
    features: Vec<Feature>,
    style: Option<VectorStyle>,
}

impl VectorLayer {
    /// Creates a layer that is not loaded yet.
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            properties: LayerProperties::new(name, source),
            crs: None,
            extent: None,
            geometry_type: GeometryType::Unknown,
            features: vec![],
            style: None,
        }
    }

    /// Creates a valid layer from already read data.
    pub fn from_data(
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        data: VectorData,
    ) -> Self {
        let mut layer = Self::new(name, source);
        layer.apply(data);
        layer
    }

    /// Reads the features with the reader matching the source file extension.
    pub fn load(&mut self, config: &SourceConfig) -> Result<(), GeoviewError> {
        if self.properties.valid {
            return Ok(());
        }

        let data = open_vector(&self.properties.source, config)?;
        self.apply(data);
        Ok(())
    }

    /// Reads the features with the given reader.
    pub fn load_from(&mut self, source: &dyn VectorSource) -> Result<(), GeoviewError> {
        if self.properties.valid {
            return Ok(());
        }

        let data = source.open(&self.properties.source)?;
        self.apply(data);
        Ok(())
    }

    fn apply(&mut self, data: VectorData) {
        log::info!(
            "Vector layer '{}' loaded: {} features, {}",
            self.properties.name,
            data.features.len(),
            data.geometry_type
        );

        self.crs = data.crs;
        self.extent = data.extent;
        self.geometry_type = data.geometry_type;
        self.features = data.features;
        self.properties.valid = true;
    }

    /// Coordinate system of the features.
    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// Bounding rectangle of all features.
    pub fn extent(&self) -> Option<Rect> {
        self.extent
    }

    /// Geometry type declared by the source.
    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    /// Features in source order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Number of features.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Style used instead of the renderer default, if set.
    pub fn style(&self) -> Option<&VectorStyle> {
        self.style.as_ref()
    }

    /// Sets a style used instead of the renderer default.
    pub fn set_style(&mut self, style: Option<VectorStyle>) {
        self.style = style;
    }

    /// Sets a style used instead of the renderer default.
    pub fn with_style(mut self, style: VectorStyle) -> Self {
        self.style = Some(style);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryVectorSource;
    use geoview_types::cartesian::Point2d;
    use geoview_types::Geom;

    #[test]
    fn load_from_source() {
        let source = MemoryVectorSource::new(
            vec![
                Geom::Point(Point2d::new(0.0, 0.0)).into(),
                Geom::Point(Point2d::new(10.0, 5.0)).into(),
            ],
            Some(Crs::EPSG3857),
        );

        let mut layer = VectorLayer::new("points", "memory");
        assert!(layer.extent().is_none());
        layer.load_from(&source).unwrap();

        assert!(layer.properties.valid);
        assert_eq!(layer.feature_count(), 2);
        assert_eq!(layer.extent(), Some(Rect::new(0.0, 0.0, 10.0, 5.0)));
        assert_eq!(layer.crs(), Some(&Crs::EPSG3857));
        assert_eq!(layer.geometry_type(), GeometryType::Point);
    }

    #[test]
    fn extent_is_fixed_after_load() {
        let first = MemoryVectorSource::new(vec![Geom::Point(Point2d::new(1.0, 1.0)).into()], None);
        let second =
            MemoryVectorSource::new(vec![Geom::Point(Point2d::new(50.0, 50.0)).into()], None);

        let mut layer = VectorLayer::new("points", "memory");
        layer.load_from(&first).unwrap();
        layer.load_from(&second).unwrap();
        assert_eq!(layer.extent(), Some(Rect::new(1.0, 1.0, 1.0, 1.0)));
    }
}
