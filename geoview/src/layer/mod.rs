//! [Layers](Layer) are the units the map is composed of: a vector feature set or a raster grid,
//! each in its own CRS, with visibility and opacity.

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use geoview_types::cartesian::Rect;
use geoview_types::geo::Crs;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::GeoviewError;
use crate::source::SourceConfig;

mod feature;
mod raster_layer;
mod vector_layer;

pub use feature::Feature;
pub use raster_layer::RasterLayer;
pub use vector_layer::VectorLayer;

/// Kind of data a layer holds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LayerKind {
    /// Vector features.
    Vector,
    /// Raster grid.
    Raster,
}

impl LayerKind {
    /// Guesses the kind from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        if crate::source::is_raster_path(path) {
            Some(Self::Raster)
        } else if crate::source::is_vector_path(path) {
            Some(Self::Vector)
        } else {
            None
        }
    }
}

impl Display for LayerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerKind::Vector => f.write_str("vector"),
            LayerKind::Raster => f.write_str("raster"),
        }
    }
}

/// Name of a layer loaded from the path: the file name without extension.
pub fn layer_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Properties shared by all layer kinds.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LayerProperties {
    pub(crate) name: String,
    pub(crate) source: PathBuf,
    pub(crate) visible: bool,
    pub(crate) opacity: f32,
    pub(crate) valid: bool,
}

impl LayerProperties {
    pub(crate) fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            visible: true,
            opacity: 1.0,
            valid: false,
        }
    }

    pub(crate) fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_nan() {
            0.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }
}

/// A map layer.
///
/// A layer is valid only after its data was loaded successfully. Invalid layers are never
/// rendered and do not contribute to the combined extent of a map, but they can still be
/// looked up and removed.
#[derive(Debug)]
pub enum Layer {
    /// Vector feature layer.
    Vector(VectorLayer),
    /// Raster layer.
    Raster(RasterLayer),
}

impl Layer {
    /// Creates a layer that is not loaded yet. Call [`Layer::load`] to read the data.
    pub fn unloaded(name: impl Into<String>, source: impl Into<PathBuf>, kind: LayerKind) -> Self {
        match kind {
            LayerKind::Vector => Layer::Vector(VectorLayer::new(name, source)),
            LayerKind::Raster => Layer::Raster(RasterLayer::new(name, source)),
        }
    }

    /// Creates and loads a layer from a file.
    pub fn open(
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        kind: LayerKind,
        config: &SourceConfig,
    ) -> Result<Self, GeoviewError> {
        let mut layer = Self::unloaded(name, source, kind);
        layer.load(config)?;
        Ok(layer)
    }

    /// Reads the layer data from its source. Loading a valid layer again does nothing.
    pub fn load(&mut self, config: &SourceConfig) -> Result<(), GeoviewError> {
        match self {
            Layer::Vector(layer) => layer.load(config),
            Layer::Raster(layer) => layer.load(config),
        }
    }

    fn properties(&self) -> &LayerProperties {
        match self {
            Layer::Vector(layer) => &layer.properties,
            Layer::Raster(layer) => &layer.properties,
        }
    }

    fn properties_mut(&mut self) -> &mut LayerProperties {
        match self {
            Layer::Vector(layer) => &mut layer.properties,
            Layer::Raster(layer) => &mut layer.properties,
        }
    }

    /// Name of the layer. Names are unique within a registry.
    pub fn name(&self) -> &str {
        &self.properties().name
    }

    /// Path the layer is loaded from.
    pub fn source(&self) -> &Path {
        &self.properties().source
    }

    /// Kind of the layer.
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Vector(_) => LayerKind::Vector,
            Layer::Raster(_) => LayerKind::Raster,
        }
    }

    /// Coordinate system of the layer data.
    pub fn crs(&self) -> Option<&Crs> {
        match self {
            Layer::Vector(layer) => layer.crs(),
            Layer::Raster(layer) => layer.crs(),
        }
    }

    /// Extent of the layer data, computed at load.
    pub fn extent(&self) -> Option<Rect> {
        match self {
            Layer::Vector(layer) => layer.extent(),
            Layer::Raster(layer) => layer.extent(),
        }
    }

    /// Returns true if the data was loaded successfully.
    pub fn is_valid(&self) -> bool {
        self.properties().valid
    }

    /// Returns true if the layer should be drawn.
    pub fn is_visible(&self) -> bool {
        self.properties().visible
    }

    /// Shows or hides the layer.
    pub fn set_visible(&mut self, visible: bool) {
        self.properties_mut().visible = visible;
    }

    /// Opacity in `[0.0, 1.0]`.
    pub fn opacity(&self) -> f32 {
        self.properties().opacity
    }

    /// Sets opacity. Values outside of `[0.0, 1.0]` are clamped.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.properties_mut().set_opacity(opacity);
    }

    /// Returns the vector layer, if this is one.
    pub fn as_vector(&self) -> Option<&VectorLayer> {
        match self {
            Layer::Vector(layer) => Some(layer),
            Layer::Raster(_) => None,
        }
    }

    /// Returns the vector layer, if this is one.
    pub fn as_vector_mut(&mut self) -> Option<&mut VectorLayer> {
        match self {
            Layer::Vector(layer) => Some(layer),
            Layer::Raster(_) => None,
        }
    }

    /// Returns the raster layer, if this is one.
    pub fn as_raster(&self) -> Option<&RasterLayer> {
        match self {
            Layer::Raster(layer) => Some(layer),
            Layer::Vector(_) => None,
        }
    }
}

impl From<VectorLayer> for Layer {
    fn from(value: VectorLayer) -> Self {
        Self::Vector(value)
    }
}

impl From<RasterLayer> for Layer {
    fn from(value: RasterLayer) -> Self {
        Self::Raster(value)
    }
}
