//! [`Map`] combines the layers, the view, the renderer and the active map tool.

use std::path::Path;

use geoview_types::cartesian::{Point2d, Size};
use image::{ImageFormat, RgbaImage};

use crate::control::{self, MapInputEvent, MapTool, MapToolKind, ToolOutcome, ViewportControl};
use crate::error::GeoviewError;
use crate::layer::{layer_name, Layer, LayerKind};
use crate::messenger::{MapEvent, Messenger};
use crate::render::{self, Compositor, RenderConfig};
use crate::source::SourceConfig;
use crate::view::MapView;

mod builder;
mod layer_registry;

pub use builder::MapBuilder;
pub use layer_registry::LayerRegistry;

/// Map session: an ordered set of layers, the view that should be rendered, and the active
/// interaction tool.
///
/// All state changes happen through `&mut self` on a single thread. Loading a file is blocking;
/// use [`LayerLoader`](crate::loader::LayerLoader) to load layers in background and register them
/// with [`Map::add_loaded_layer`].
pub struct Map {
    view: MapView,
    layers: LayerRegistry,
    compositor: Compositor,
    tool: MapTool,
    source_config: SourceConfig,
    messenger: Option<Box<dyn Messenger>>,
    last_image: Option<RgbaImage>,
}

impl Map {
    /// Creates a new map without layers.
    pub fn new(view: MapView, messenger: Option<Box<dyn Messenger + 'static>>) -> Self {
        Self {
            view,
            layers: LayerRegistry::new(),
            compositor: Compositor::default(),
            tool: MapTool::default(),
            source_config: SourceConfig::default(),
            messenger,
            last_image: None,
        }
    }

    fn notify(&self, event: MapEvent) {
        if let Some(messenger) = &self.messenger {
            messenger.notify(event);
        }
    }

    fn status(&self, message: String) {
        log::info!("{message}");
        self.notify(MapEvent::StatusMessage(message));
    }

    /// Current view of the map.
    pub fn view(&self) -> &MapView {
        &self.view
    }

    /// Changes the view of the map to the given one.
    pub fn set_view(&mut self, view: MapView) {
        self.view = view;
    }

    /// Returns the list of map's layers.
    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    /// Layer compositor with its image cache.
    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Replaces the render configuration.
    pub fn set_render_config(&mut self, config: RenderConfig) {
        self.compositor.set_config(config);
    }

    /// Configuration used to open data sources.
    pub fn source_config(&self) -> &SourceConfig {
        &self.source_config
    }

    /// Sets the configuration used to open data sources.
    pub fn set_source_config(&mut self, config: SourceConfig) {
        self.source_config = config;
    }

    /// Sets the new event messenger for the map.
    pub fn set_messenger(&mut self, messenger: Option<impl Messenger + 'static>) {
        self.messenger = messenger.map(|m| Box::new(m) as Box<dyn Messenger>);
    }

    /// Loads a layer from the file and puts it on top of the stack. The layer is named after the
    /// file name without extension.
    ///
    /// On failure the registry is not changed and a status message describing the error is sent.
    pub fn add_layer(
        &mut self,
        path: impl AsRef<Path>,
        kind: LayerKind,
    ) -> Result<usize, GeoviewError> {
        let path = path.as_ref();
        let name = layer_name(path);

        if self.layers.get(&name).is_some() {
            self.status(format!("Layer '{name}' already exists"));
            return Err(GeoviewError::DuplicateName(name));
        }

        log::debug!("Loading {kind} layer '{name}' from {}", path.display());
        match Layer::open(name, path, kind, &self.source_config) {
            Ok(layer) => self.add_loaded_layer(layer),
            Err(err) => {
                log::warn!("{err}");
                self.notify(MapEvent::StatusMessage(format!(
                    "Failed to load {}: {err}",
                    path.display()
                )));
                Err(err)
            }
        }
    }

    /// Puts an already loaded layer on top of the stack.
    ///
    /// If the map has no extent yet, or this is the only layer, the view is zoomed to the layer.
    pub fn add_loaded_layer(&mut self, layer: Layer) -> Result<usize, GeoviewError> {
        let name = layer.name().to_string();
        let extent = layer.extent().filter(|_| layer.is_valid());

        let index = self.layers.add(layer, None)?;
        self.compositor.clear_cache();

        if let Some(extent) = extent {
            if self.view.extent().is_none() || self.layers.len() == 1 {
                if let Some(view) = self.view.zoom_to_extent(extent) {
                    self.view = view;
                }
            }
        }

        self.notify(MapEvent::LayerCountChanged(self.layers.len()));
        self.status(format!("Layer '{name}' added"));

        Ok(index)
    }

    /// Removes the layer from the map.
    pub fn remove_layer(&mut self, name: &str) -> Result<Layer, GeoviewError> {
        let layer = self
            .layers
            .remove(name)
            .ok_or_else(|| GeoviewError::NotFound(name.to_string()))?;
        self.compositor.clear_cache();

        self.notify(MapEvent::LayerCountChanged(self.layers.len()));
        self.status(format!("Layer '{name}' removed"));

        Ok(layer)
    }

    /// Moves the layer to the given position in the stack.
    pub fn move_layer(&mut self, name: &str, index: usize) -> bool {
        self.layers.move_layer(name, index)
    }

    /// Shows or hides the layer.
    pub fn set_visibility(&mut self, name: &str, visible: bool) -> bool {
        self.layers.set_visibility(name, visible)
    }

    /// Sets the layer opacity.
    pub fn set_opacity(&mut self, name: &str, opacity: f32) -> bool {
        self.layers.set_opacity(name, opacity)
    }

    /// Active map tool.
    pub fn tool(&self) -> &MapTool {
        &self.tool
    }

    /// Replaces the active map tool.
    pub fn set_tool(&mut self, kind: MapToolKind) {
        self.tool.deactivate();
        self.tool = MapTool::new(kind).with_zoom_factor(self.view.config().zoom_factor());
        self.tool.activate();
    }

    /// Zooms the map in by one step around the view center.
    pub fn zoom_in(&mut self) -> bool {
        self.update_view(self.view.zoom_in(None))
    }

    /// Zooms the map out by one step around the view center.
    pub fn zoom_out(&mut self) -> bool {
        self.update_view(self.view.zoom_out(None))
    }

    /// Zooms the view to show all valid layers.
    pub fn zoom_to_full_extent(&mut self) -> bool {
        let view = self
            .layers
            .combined_extent()
            .and_then(|extent| self.view.zoom_to_extent(extent));
        self.update_view(view)
    }

    fn update_view(&mut self, view: Option<MapView>) -> bool {
        match view {
            Some(view) => {
                self.view = view;
                true
            }
            None => false,
        }
    }

    /// Sets the size of the output image in pixels. The visible extent is kept.
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.view = self.view.with_size(Size::new(width, height));
    }

    /// Renders the map. Returns `None` if the view has no extent or zero size.
    pub fn render(&mut self) -> Option<RgbaImage> {
        let context = self.view.render_context()?;
        let mut image = self.compositor.compose(&self.layers, &context);

        let vertices = self.tool.vertices();
        if !vertices.is_empty() {
            if let Err(err) = render::draw_sketch(
                &mut image,
                vertices,
                self.tool.is_closed_sketch(),
                self.compositor.config().sketch_color(),
                &context,
            ) {
                log::warn!("Sketch is not drawn: {err}");
            }
        }

        self.last_image = Some(image.clone());
        self.notify(MapEvent::ImageUpdated);

        Some(image)
    }

    /// Image produced by the last [`Map::render`] call.
    pub fn last_image(&self) -> Option<&RgbaImage> {
        self.last_image.as_ref()
    }

    /// Saves the last rendered image as PNG.
    pub fn save_image(&self, path: impl AsRef<Path>) -> Result<(), GeoviewError> {
        let image = self
            .last_image
            .as_ref()
            .ok_or_else(|| GeoviewError::NotFound("rendered image".into()))?;
        image.save_with_format(path.as_ref(), ImageFormat::Png)?;
        log::info!("Map image saved to {}", path.as_ref().display());

        Ok(())
    }

    /// Processes a user input event.
    ///
    /// Wheel events zoom the map around the pointer whatever tool is active. All other events go to
    /// the active tool. Digitized geometries and identified positions are sent to the messenger.
    pub fn handle_event(&mut self, event: MapInputEvent) -> ToolOutcome {
        if let MapInputEvent::Wheel { delta, position } = event {
            let zoom_factor = self.view.config().zoom_factor();
            return if control::wheel_zoom(&mut self.view, delta, position, zoom_factor) {
                ToolOutcome::ViewChanged
            } else {
                ToolOutcome::Ignored
            };
        }

        let outcome = self.tool.handle_event(&event, &mut self.view);
        match &outcome {
            ToolOutcome::GeometryAdded(geometry) => {
                log::debug!("{} added by the map tool", geometry.kind);
                self.notify(MapEvent::GeometryAdded(geometry.clone()));
            }
            ToolOutcome::Identified(position) => {
                self.notify(MapEvent::Identified(*position));
            }
            _ => {}
        }

        outcome
    }
}

impl ViewportControl for Map {
    fn pixel_to_world(&self, px: f64, py: f64) -> Option<Point2d> {
        self.view.pixel_to_world(px, py)
    }

    fn pan(&mut self, dx: f64, dy: f64) -> bool {
        ViewportControl::pan(&mut self.view, dx, dy)
    }

    fn zoom(&mut self, factor: f64, center: Option<Point2d>) -> bool {
        ViewportControl::zoom(&mut self.view, factor, center)
    }
}
