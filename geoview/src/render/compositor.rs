use std::sync::Arc;

use image::{Rgba, RgbaImage};

use super::{LayerRenderer, RenderCache, RenderConfig, RenderContext};
use crate::layer::Layer;
use crate::map::LayerRegistry;

/// Combines rendered layer images into the map image.
///
/// Layers are drawn bottom to top over the background color. Layer images are rendered at full
/// opacity and cached by the layer name; the layer opacity is applied when the image is blended.
#[derive(Debug, Default)]
pub struct Compositor {
    renderer: LayerRenderer,
    cache: RenderCache,
    config: RenderConfig,
}

impl Compositor {
    /// Creates a new compositor.
    pub fn new(config: RenderConfig) -> Self {
        Self {
            renderer: LayerRenderer::new(*config.vector_style()),
            cache: RenderCache::new(),
            config,
        }
    }

    /// Render configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Replaces the configuration. Cached images are dropped.
    pub fn set_config(&mut self, config: RenderConfig) {
        self.renderer.set_style(*config.vector_style());
        self.config = config;
        self.cache.clear();
    }

    /// Layer image cache.
    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Drops the cached image of one layer.
    pub fn invalidate(&mut self, name: &str) {
        if self.cache.remove(name) {
            log::debug!("Render cache entry of '{name}' invalidated");
        }
    }

    /// Drops all cached images.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Image of a single layer for the context, from the cache if it is up to date.
    pub fn layer_image(
        &mut self,
        layer: &Layer,
        context: &RenderContext,
    ) -> Option<Arc<RgbaImage>> {
        let name = layer.name();
        let extent = context.extent();

        if self.config.cache_enabled() {
            if let Some(image) = self.cache.get(name, &extent, context.size()) {
                log::trace!("Render cache hit for '{name}'");
                return Some(image);
            }
            log::trace!("Render cache miss for '{name}'");
        }

        let image = Arc::new(self.renderer.render(layer, context)?);
        if self.config.cache_enabled() {
            self.cache
                .insert(name, &extent, context.size(), image.clone());
        }

        Some(image)
    }

    /// Renders all visible and valid layers of the registry into one image.
    pub fn compose(&mut self, registry: &LayerRegistry, context: &RenderContext) -> RgbaImage {
        let mut target = RgbaImage::from_pixel(
            context.width(),
            context.height(),
            self.config.background().to_pixel(),
        );

        for layer in registry.iter_visible() {
            match self.layer_image(layer, context) {
                Some(image) => blend_over(&mut target, &image, layer.opacity()),
                None => log::debug!("Layer '{}' skipped in composition", layer.name()),
            }
        }

        target
    }
}

/// Blends `layer` over `target` with straight alpha, scaling the layer alpha by `opacity`.
/// Images must have the same dimensions; extra pixels of the larger one are ignored.
pub(crate) fn blend_over(target: &mut RgbaImage, layer: &RgbaImage, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity == 0.0 {
        return;
    }

    for (dst, src) in target.pixels_mut().zip(layer.pixels()) {
        *dst = blend_pixel(*dst, *src, opacity);
    }
}

fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let src_a = src.0[3] as f32 / 255.0 * opacity;
    if src_a <= 0.0 {
        return dst;
    }

    let dst_a = dst.0[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (src.0[i] as f32 * src_a + dst.0[i] as f32 * dst_a * (1.0 - src_a)) / out_a;
        out[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;

    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{raster_layer, vector_layer_with_points};
    use crate::Color;
    use geoview_types::cartesian::{Rect, Size};

    fn context() -> RenderContext {
        RenderContext::new(Size::new(20, 20), Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap()
    }

    #[test]
    fn blend_pixel_over_opaque() {
        let dst = Rgba([0, 0, 0, 255]);
        assert_eq!(blend_pixel(dst, Rgba([200, 100, 50, 255]), 1.0), Rgba([200, 100, 50, 255]));
        assert_eq!(blend_pixel(dst, Rgba([200, 100, 50, 255]), 0.5), Rgba([100, 50, 25, 255]));
        assert_eq!(blend_pixel(dst, Rgba([200, 100, 50, 0]), 1.0), dst);
    }

    #[test]
    fn blend_pixel_over_transparent() {
        let out = blend_pixel(Rgba([0, 0, 0, 0]), Rgba([200, 100, 50, 255]), 0.5);
        assert_eq!(out, Rgba([200, 100, 50, 128]));
    }

    #[test]
    fn empty_registry_gives_background() {
        let mut compositor = Compositor::default();
        let image = compositor.compose(&LayerRegistry::new(), &context());
        assert_eq!(image.dimensions(), (20, 20));
        assert!(image.pixels().all(|p| *p == Color::WHITE.to_pixel()));
    }

    #[test]
    fn hidden_and_invalid_layers_are_skipped() {
        let mut registry = LayerRegistry::new();
        registry
            .add(raster_layer("raster", Rect::new(0.0, 0.0, 100.0, 100.0)), None)
            .unwrap();
        registry
            .add(
                Layer::unloaded("missing", "missing.tif", crate::layer::LayerKind::Raster),
                None,
            )
            .unwrap();
        registry.set_visibility("raster", false);

        let mut compositor = Compositor::default();
        let image = compositor.compose(&registry, &context());
        assert!(image.pixels().all(|p| *p == Color::WHITE.to_pixel()));
        assert!(compositor.cache().is_empty());
    }

    #[test]
    fn opacity_is_applied_at_composite_time() {
        let mut registry = LayerRegistry::new();
        registry
            .add(raster_layer("raster", Rect::new(0.0, 0.0, 100.0, 100.0)), None)
            .unwrap();
        let ctx = context();

        let mut compositor = Compositor::new(RenderConfig::default().with_background(Color::BLACK));
        let opaque = compositor.compose(&registry, &ctx);

        registry.set_opacity("raster", 0.0);
        let hidden = compositor.compose(&registry, &ctx);
        assert!(hidden.pixels().all(|p| *p == Color::BLACK.to_pixel()));

        // cached image is stored at full opacity
        let cached = compositor
            .cache()
            .get("raster", &ctx.extent(), ctx.size())
            .unwrap();
        assert_eq!(cached.get_pixel(19, 19), opaque.get_pixel(19, 19));
    }

    #[test]
    fn layer_image_is_cached_per_extent() {
        let layer = vector_layer_with_points("points", &[(50.0, 50.0)]);
        let ctx = context();
        let mut compositor = Compositor::default();

        let first = compositor.layer_image(&layer, &ctx).unwrap();
        let second = compositor.layer_image(&layer, &ctx).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let moved = RenderContext::new(ctx.size(), ctx.extent().translate(1.0, 0.0)).unwrap();
        let third = compositor.layer_image(&layer, &moved).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));

        compositor.invalidate("points");
        assert!(compositor.cache().is_empty());
    }

    #[test]
    fn disabled_cache_renders_every_time() {
        let layer = vector_layer_with_points("points", &[(50.0, 50.0)]);
        let ctx = context();
        let mut compositor =
            Compositor::new(RenderConfig::default().with_cache_enabled(false));

        let first = compositor.layer_image(&layer, &ctx).unwrap();
        let second = compositor.layer_image(&layer, &ctx).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(compositor.cache().is_empty());
    }
}
