use std::ops::Index;

use ahash::HashMap;
use geoview_types::cartesian::Rect;
use geoview_types::geo::Crs;

use crate::error::GeoviewError;
use crate::layer::Layer;
use crate::source::transform_extent;

/// Ordered stack of uniquely named layers.
///
/// Index `0` is the bottom of the stack: when the map is rendered, layers are drawn starting from
/// index `0`, so the last layer is drawn on top of all others. Hidden layers keep their place in
/// the stack but are not drawn.
///
/// Layer names are unique within the registry, and all operations that address a single layer
/// take its name.
///
/// ```no_run
/// use geoview::layer::{Layer, LayerKind};
/// use geoview::LayerRegistry;
///
/// let mut registry = LayerRegistry::new();
/// registry.add(Layer::unloaded("roads", "roads.geojson", LayerKind::Vector), None).unwrap();
/// registry.add(Layer::unloaded("dem", "dem.tif", LayerKind::Raster), Some(0)).unwrap();
///
/// assert_eq!(registry.index_of("dem"), Some(0));
/// assert!(registry.move_to_top("dem"));
/// assert_eq!(registry.index_of("dem"), Some(1));
/// ```
#[derive(Debug, Default)]
pub struct LayerRegistry {
    layers: Vec<Layer>,
    index: HashMap<String, usize>,
}

impl LayerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, layer) in self.layers.iter().enumerate() {
            self.index.insert(layer.name().to_string(), i);
        }
    }

    /// Adds the layer at the `position` (on top if `None`). Positions past the end are clamped.
    ///
    /// Fails without changing the registry if a layer with the same name exists.
    pub fn add(&mut self, layer: Layer, position: Option<usize>) -> Result<usize, GeoviewError> {
        if self.index.contains_key(layer.name()) {
            return Err(GeoviewError::DuplicateName(layer.name().to_string()));
        }

        let position = position.unwrap_or(self.layers.len()).min(self.layers.len());
        log::debug!("Layer '{}' added at position {position}", layer.name());
        self.layers.insert(position, layer);
        self.rebuild_index();

        Ok(position)
    }

    /// Removes the layer with the given name.
    pub fn remove(&mut self, name: &str) -> Option<Layer> {
        let index = self.index_of(name)?;
        self.remove_at(index)
    }

    /// Removes the layer at the index.
    pub fn remove_at(&mut self, index: usize) -> Option<Layer> {
        if index >= self.layers.len() {
            return None;
        }

        let layer = self.layers.remove(index);
        self.rebuild_index();
        log::debug!("Layer '{}' removed", layer.name());

        Some(layer)
    }

    /// Moves the layer to the `index`, clamped to the last position. Returns false if there is no
    /// such layer.
    pub fn move_layer(&mut self, name: &str, index: usize) -> bool {
        let Some(current) = self.index_of(name) else {
            return false;
        };

        let layer = self.layers.remove(current);
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
        self.rebuild_index();

        true
    }

    /// Moves the layer one position up. Returns false if the layer is already on top.
    pub fn move_up(&mut self, name: &str) -> bool {
        match self.index_of(name) {
            Some(index) if index + 1 < self.layers.len() => self.move_layer(name, index + 1),
            _ => false,
        }
    }

    /// Moves the layer one position down. Returns false if the layer is already at the bottom.
    pub fn move_down(&mut self, name: &str) -> bool {
        match self.index_of(name) {
            Some(index) if index > 0 => self.move_layer(name, index - 1),
            _ => false,
        }
    }

    /// Moves the layer to the top of the stack.
    pub fn move_to_top(&mut self, name: &str) -> bool {
        self.move_layer(name, self.layers.len())
    }

    /// Moves the layer to the bottom of the stack.
    pub fn move_to_bottom(&mut self, name: &str) -> bool {
        self.move_layer(name, 0)
    }

    /// Shows or hides the layer. Returns false if there is no such layer.
    pub fn set_visibility(&mut self, name: &str, visible: bool) -> bool {
        match self.get_mut(name) {
            Some(layer) => {
                layer.set_visible(visible);
                true
            }
            None => false,
        }
    }

    /// Sets the opacity of the layer, clamped to `[0, 1]`. Returns false if there is no such
    /// layer.
    pub fn set_opacity(&mut self, name: &str, opacity: f32) -> bool {
        match self.get_mut(name) {
            Some(layer) => {
                layer.set_opacity(opacity);
                true
            }
            None => false,
        }
    }

    /// Union of the extents of all valid layers. Layer coordinate systems are not taken into
    /// account.
    pub fn combined_extent(&self) -> Option<Rect> {
        self.layers
            .iter()
            .filter(|layer| layer.is_valid())
            .filter_map(|layer| layer.extent())
            .reduce(|a, b| a.merge(b))
    }

    /// Union of the extents of all valid layers converted into the `crs`. Layers without a known
    /// CRS are taken as is, layers that cannot be converted are skipped.
    pub fn combined_extent_in(&self, crs: &Crs) -> Option<Rect> {
        self.layers
            .iter()
            .filter(|layer| layer.is_valid())
            .filter_map(|layer| {
                let extent = layer.extent()?;
                match layer.crs() {
                    Some(layer_crs) => {
                        let converted = transform_extent(extent, layer_crs, crs);
                        if converted.is_none() {
                            log::debug!(
                                "Extent of '{}' cannot be converted from {layer_crs} to {crs}",
                                layer.name()
                            );
                        }
                        converted
                    }
                    None => Some(extent),
                }
            })
            .reduce(|a, b| a.merge(b))
    }

    /// Layer with the given name.
    pub fn get(&self, name: &str) -> Option<&Layer> {
        self.index.get(name).map(|&i| &self.layers[i])
    }

    /// Layer at the given index.
    pub fn get_at(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Mutable reference to the layer with the given name.
    ///
    /// The layer must not be renamed through this reference.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Layer> {
        let index = *self.index.get(name)?;
        self.layers.get_mut(index)
    }

    /// Position of the layer in the stack.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// True if there are no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Iterates over the layers from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.iter()
    }

    /// Iterates over the layers that should be drawn (visible and loaded), from bottom to top.
    pub fn iter_visible(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers
            .iter()
            .filter(|layer| layer.is_visible() && layer.is_valid())
    }

    /// Removes all layers.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.index.clear();
    }

    /// Text listing of the stack, top layer first. Used for debugging.
    pub fn layer_tree(&self) -> String {
        self.layers
            .iter()
            .enumerate()
            .rev()
            .map(|(index, layer)| {
                let visible = if layer.is_visible() { 'x' } else { ' ' };
                let invalid = if layer.is_valid() { "" } else { " invalid" };
                format!(
                    "{index}: [{visible}] {} ({}, opacity {:.2}{invalid})",
                    layer.name(),
                    layer.kind(),
                    layer.opacity()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Index<usize> for LayerRegistry {
    type Output = Layer;

    fn index(&self, index: usize) -> &Self::Output {
        &self.layers[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerKind;
    use crate::tests::raster_layer;
    use assert_matches::assert_matches;

    fn unloaded(name: &str) -> Layer {
        Layer::unloaded(name, format!("{name}.geojson"), LayerKind::Vector)
    }

    fn names(registry: &LayerRegistry) -> Vec<&str> {
        registry.iter().map(|l| l.name()).collect()
    }

    fn registry(names: &[&str]) -> LayerRegistry {
        let mut registry = LayerRegistry::new();
        for name in names {
            registry.add(unloaded(name), None).unwrap();
        }
        registry
    }

    #[test]
    fn add_rejects_duplicate_names() {
        let mut registry = registry(&["a", "b"]);
        let result = registry.add(unloaded("a"), Some(0));
        assert_matches!(result, Err(GeoviewError::DuplicateName(name)) if name == "a");
        assert_eq!(names(&registry), ["a", "b"]);
    }

    #[test]
    fn add_clamps_position() {
        let mut registry = registry(&["a", "b"]);
        assert_eq!(registry.add(unloaded("c"), Some(10)).unwrap(), 2);
        assert_eq!(registry.add(unloaded("d"), Some(0)).unwrap(), 0);
        assert_eq!(names(&registry), ["d", "a", "b", "c"]);
        assert_eq!(registry.index_of("c"), Some(3));
        assert_eq!(registry[0].name(), "d");
    }

    #[test]
    fn remove_updates_index() {
        let mut registry = registry(&["a", "b", "c"]);
        assert_eq!(registry.remove("a").unwrap().name(), "a");
        assert!(registry.remove("a").is_none());
        assert_eq!(registry.index_of("c"), Some(1));

        assert_eq!(registry.remove_at(0).unwrap().name(), "b");
        assert!(registry.remove_at(5).is_none());
        assert_eq!(names(&registry), ["c"]);
    }

    #[test]
    fn move_layers() {
        let mut registry = registry(&["a", "b", "c"]);

        assert!(registry.move_layer("a", 100));
        assert_eq!(names(&registry), ["b", "c", "a"]);

        assert!(!registry.move_up("a"));
        assert!(registry.move_down("a"));
        assert_eq!(names(&registry), ["b", "a", "c"]);

        assert!(!registry.move_down("b"));
        assert!(registry.move_up("b"));
        assert_eq!(names(&registry), ["a", "b", "c"]);

        assert!(registry.move_to_top("a"));
        assert!(registry.move_to_bottom("c"));
        assert_eq!(names(&registry), ["c", "b", "a"]);
        assert_eq!(registry.index_of("a"), Some(2));

        assert!(!registry.move_layer("missing", 0));
    }

    #[test]
    fn visibility_and_opacity() {
        let mut registry = registry(&["a"]);
        assert!(registry.set_visibility("a", false));
        assert!(!registry.get("a").unwrap().is_visible());
        assert!(registry.set_opacity("a", 1.5));
        assert_eq!(registry.get("a").unwrap().opacity(), 1.0);
        assert!(!registry.set_opacity("missing", 0.5));
    }

    #[test]
    fn combined_extent_of_valid_layers() {
        let mut registry = LayerRegistry::new();
        assert!(registry.combined_extent().is_none());

        registry
            .add(raster_layer("a", Rect::new(0.0, 0.0, 10.0, 10.0)), None)
            .unwrap();
        registry
            .add(raster_layer("b", Rect::new(5.0, 5.0, 20.0, 20.0)), None)
            .unwrap();
        registry.add(unloaded("c"), None).unwrap();
        registry.set_visibility("b", false);

        assert_eq!(
            registry.combined_extent(),
            Some(Rect::new(0.0, 0.0, 20.0, 20.0))
        );
    }

    #[test]
    fn combined_extent_in_other_crs() {
        let mut registry = LayerRegistry::new();
        registry
            .add(raster_layer("a", Rect::new(0.0, 0.0, 10.0, 10.0)), None)
            .unwrap();

        let extent = registry.combined_extent_in(&Crs::EPSG3857).unwrap();
        assert!(extent.x_max() > 1_000_000.0);
        assert_eq!(
            registry.combined_extent_in(&Crs::WGS84),
            Some(Rect::new(0.0, 0.0, 10.0, 10.0))
        );
    }

    #[test]
    fn visible_layers_are_valid() {
        let mut registry = registry(&["a"]);
        registry
            .add(raster_layer("b", Rect::new(0.0, 0.0, 1.0, 1.0)), None)
            .unwrap();
        let visible: Vec<_> = registry.iter_visible().map(|l| l.name()).collect();
        assert_eq!(visible, ["b"]);
    }

    #[test]
    fn layer_tree_lists_top_first() {
        let mut registry = registry(&["a"]);
        registry
            .add(raster_layer("b", Rect::new(0.0, 0.0, 1.0, 1.0)), None)
            .unwrap();
        registry.set_visibility("a", false);

        let tree = registry.layer_tree();
        let lines: Vec<_> = tree.lines().collect();
        assert_eq!(lines[0], "1: [x] b (raster, opacity 1.00)");
        assert_eq!(lines[1], "0: [ ] a (vector, opacity 1.00 invalid)");

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get("a").is_none());
    }
}
