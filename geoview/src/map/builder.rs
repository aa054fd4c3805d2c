use geoview_types::cartesian::{Rect, Size};

use super::Map;
use crate::layer::Layer;
use crate::render::RenderConfig;
use crate::source::SourceConfig;
use crate::view::{MapView, ViewConfig};
use crate::Messenger;

const DEFAULT_SIZE: Size<u32> = Size::new(800, 600);

/// Convenience type to initialize a [Map].
///
/// ```no_run
/// use geoview::layer::{Layer, LayerKind};
/// use geoview::source::SourceConfig;
/// use geoview::MapBuilder;
///
/// let roads = Layer::open("roads", "roads.geojson", LayerKind::Vector, &SourceConfig::default())
///     .unwrap();
/// let map = MapBuilder::default()
///     .with_size(1024, 768)
///     .with_layer(roads)
///     .build();
///
/// assert!(map.view().extent().is_some());
/// ```
#[derive(Default)]
pub struct MapBuilder {
    size: Option<Size<u32>>,
    extent: Option<Rect>,
    view_config: ViewConfig,
    render_config: RenderConfig,
    source_config: SourceConfig,
    layers: Vec<Layer>,
    messenger: Option<Box<dyn Messenger>>,
}

impl MapBuilder {
    /// Sets the size of the map image in pixels.
    ///
    /// Defaults to 800x600.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }

    /// Sets the initial extent of the map. If not set, the map is zoomed to the combined extent
    /// of its layers.
    pub fn with_extent(mut self, extent: Rect) -> Self {
        self.extent = Some(extent);
        self
    }

    /// Sets the view configuration.
    pub fn with_view_config(mut self, config: ViewConfig) -> Self {
        self.view_config = config;
        self
    }

    /// Sets the render configuration.
    pub fn with_render_config(mut self, config: RenderConfig) -> Self {
        self.render_config = config;
        self
    }

    /// Sets the configuration used by [`Map::add_layer`] to open files.
    pub fn with_source_config(mut self, config: SourceConfig) -> Self {
        self.source_config = config;
        self
    }

    /// Adds a layer to the map. Layers are stacked in the order they are added.
    pub fn with_layer(mut self, layer: impl Into<Layer>) -> Self {
        self.layers.push(layer.into());
        self
    }

    /// Sets the event messenger of the map.
    pub fn with_messenger(mut self, messenger: impl Messenger + 'static) -> Self {
        self.messenger = Some(Box::new(messenger));
        self
    }

    /// Creates the map.
    ///
    /// Layers with duplicate names are skipped with a warning.
    pub fn build(self) -> Map {
        let view = MapView::new(self.size.unwrap_or(DEFAULT_SIZE), self.view_config);
        let mut map = Map::new(view, self.messenger);
        map.set_render_config(self.render_config);
        map.set_source_config(self.source_config);

        for layer in self.layers {
            let name = layer.name().to_string();
            if let Err(err) = map.add_loaded_layer(layer) {
                log::warn!("Layer '{name}' is not added to the map: {err}");
            }
        }

        match self.extent {
            Some(extent) => map.set_view(map.view().with_extent(extent)),
            None => {
                map.zoom_to_full_extent();
            }
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::raster_layer;
    use approx::assert_abs_diff_eq;

    #[test]
    fn builds_map_with_layers() {
        let map = MapBuilder::default()
            .with_size(100, 50)
            .with_layer(raster_layer("a", Rect::new(0.0, 0.0, 10.0, 10.0)))
            .with_layer(raster_layer("b", Rect::new(10.0, 10.0, 20.0, 20.0)))
            .with_layer(raster_layer("a", Rect::new(50.0, 50.0, 60.0, 60.0)))
            .build();

        assert_eq!(map.layers().len(), 2);
        assert_eq!(map.view().size(), Size::new(100, 50));
        assert_abs_diff_eq!(
            map.view().extent().unwrap(),
            Rect::new(-1.0, -1.0, 21.0, 21.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn explicit_extent_is_kept() {
        let extent = Rect::new(0.0, 0.0, 1.0, 1.0);
        let map = MapBuilder::default()
            .with_extent(extent)
            .with_layer(raster_layer("a", Rect::new(0.0, 0.0, 10.0, 10.0)))
            .build();

        assert_eq!(map.view().extent(), Some(extent));
        assert_eq!(map.view().size(), DEFAULT_SIZE);
    }
}
