use geoview_types::cartesian::{Point2d, Rect, Size};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::control::ViewportControl;
use crate::render::RenderContext;

/// Configuration of a [`MapView`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ViewConfig {
    zoom_factor: f64,
    min_extent_size: f64,
    margin: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            zoom_factor: 1.2,
            min_extent_size: 1e-6,
            margin: 0.05,
        }
    }
}

impl ViewConfig {
    /// Factor of a single zoom in or zoom out step.
    ///
    /// For example, the value of `1.2` means that zooming out makes the visible extent 1.2 times
    /// larger, and zooming in makes it 1.2 times smaller.
    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    /// Sets the factor of a single zoom step.
    pub fn with_zoom_factor(mut self, factor: f64) -> Self {
        self.zoom_factor = factor;
        self
    }

    /// Sets the factor of a single zoom step.
    pub fn set_zoom_factor(&mut self, factor: f64) {
        self.zoom_factor = factor;
    }

    /// Smallest allowed width and height of the visible extent in world units. Zooming in further
    /// is refused.
    pub fn min_extent_size(&self) -> f64 {
        self.min_extent_size
    }

    /// Sets the smallest allowed extent size.
    pub fn with_min_extent_size(mut self, size: f64) -> Self {
        self.min_extent_size = size;
        self
    }

    /// Sets the smallest allowed extent size.
    pub fn set_min_extent_size(&mut self, size: f64) {
        self.min_extent_size = size;
    }

    /// Margin added on each side of an extent the view is zoomed to, as a fraction of the extent
    /// dimension.
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Sets the zoom-to-extent margin.
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Sets the zoom-to-extent margin.
    pub fn set_margin(&mut self, margin: f64) {
        self.margin = margin;
    }
}

/// Visible part of the map: world extent and output pixel size.
///
/// The view starts without an extent. Until an extent is set, all navigation operations do
/// nothing and coordinate conversions return `None`.
///
/// Navigation methods do not change the view but return a new one, or `None` if the operation
/// is not possible.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MapView {
    extent: Option<Rect>,
    size: Size<u32>,
    config: ViewConfig,
}

impl MapView {
    /// Creates a view without extent.
    pub fn new(size: Size<u32>, config: ViewConfig) -> Self {
        Self {
            extent: None,
            size,
            config,
        }
    }

    /// Visible world extent.
    pub fn extent(&self) -> Option<Rect> {
        self.extent
    }

    /// Output size in pixels.
    pub fn size(&self) -> Size<u32> {
        self.size
    }

    /// Configuration of the view.
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Returns the view with another configuration.
    pub fn with_config(&self, config: ViewConfig) -> Self {
        Self { config, ..*self }
    }

    /// Returns the view with another pixel size. The extent stays the same.
    pub fn with_size(&self, size: Size<u32>) -> Self {
        Self { size, ..*self }
    }

    /// Returns the view showing exactly the given extent.
    pub fn with_extent(&self, extent: Rect) -> Self {
        Self {
            extent: Some(extent),
            ..*self
        }
    }

    /// Sets the visible extent as is.
    pub fn set_extent(&mut self, extent: Rect) {
        self.extent = Some(extent);
    }

    /// Returns the view showing the extent with a margin around it.
    ///
    /// An extent with zero width or height (e.g. a single point) gets the missing dimension from
    /// the other one, or one world unit if both are zero.
    pub fn zoom_to_extent(&self, extent: Rect) -> Option<Self> {
        let coords = [extent.x_min(), extent.y_min(), extent.x_max(), extent.y_max()];
        if coords.iter().any(|c| !c.is_finite()) {
            return None;
        }

        let extent = if extent.has_area() {
            extent
        } else {
            let side = extent.width().max(extent.height());
            let side = if side > 0.0 { side } else { 1.0 };
            Rect::centered_at(
                extent.center(),
                extent.width().max(side),
                extent.height().max(side),
            )
        };

        Some(self.with_extent(extent.expand(self.config.margin)))
    }

    /// Scales the extent by the `factor` around `center` (the extent center if not given).
    /// Factors below 1 zoom in.
    ///
    /// Returns `None` without an extent, or if the new extent would be smaller than the minimum
    /// extent size.
    pub fn zoom(&self, factor: f64, center: Option<Point2d>) -> Option<Self> {
        let extent = self.extent?;
        if !factor.is_finite() || factor <= 0.0 {
            return None;
        }

        let width = extent.width() * factor;
        let height = extent.height() * factor;
        let min_size = self.config.min_extent_size;
        if width < min_size || height < min_size {
            log::debug!("Zoom refused: {width}x{height} is below the minimum extent size");
            return None;
        }

        let center = center.unwrap_or_else(|| extent.center());
        Some(self.with_extent(Rect::centered_at(center, width, height)))
    }

    /// One zoom step in.
    pub fn zoom_in(&self, center: Option<Point2d>) -> Option<Self> {
        self.zoom(1.0 / self.config.zoom_factor, center)
    }

    /// One zoom step out.
    pub fn zoom_out(&self, center: Option<Point2d>) -> Option<Self> {
        self.zoom(self.config.zoom_factor, center)
    }

    /// Moves the map content by the given number of pixels. Positive `dx` moves the content right,
    /// positive `dy` moves it down.
    pub fn pan(&self, dx: f64, dy: f64) -> Option<Self> {
        let extent = self.extent?;
        if self.size.is_zero() {
            return None;
        }

        let world_dx = -(dx / self.size.width() as f64) * extent.width();
        let world_dy = (dy / self.size.height() as f64) * extent.height();
        Some(self.with_extent(extent.translate(world_dx, world_dy)))
    }

    /// World position of the screen pixel position.
    pub fn pixel_to_world(&self, px: f64, py: f64) -> Option<Point2d> {
        Some(self.render_context()?.pixel_to_world(px, py))
    }

    /// Screen pixel containing the world position. Coordinates are truncated toward zero.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        Some(self.render_context()?.world_to_pixel(x, y))
    }

    /// Render context of the current extent and size.
    pub fn render_context(&self) -> Option<RenderContext> {
        RenderContext::new(self.size, self.extent?)
    }
}

impl ViewportControl for MapView {
    fn pixel_to_world(&self, px: f64, py: f64) -> Option<Point2d> {
        MapView::pixel_to_world(self, px, py)
    }

    fn pan(&mut self, dx: f64, dy: f64) -> bool {
        match MapView::pan(self, dx, dy) {
            Some(view) => {
                *self = view;
                true
            }
            None => false,
        }
    }

    fn zoom(&mut self, factor: f64, center: Option<Point2d>) -> bool {
        match MapView::zoom(self, factor, center) {
            Some(view) => {
                *self = view;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn view(extent: Rect, width: u32, height: u32) -> MapView {
        MapView::new(Size::new(width, height), ViewConfig::default()).with_extent(extent)
    }

    #[test]
    fn zoom_to_extent_adds_margin() {
        let view = MapView::default()
            .zoom_to_extent(Rect::new(0.0, 0.0, 100.0, 200.0))
            .unwrap();
        assert_abs_diff_eq!(
            view.extent().unwrap(),
            Rect::new(-5.0, -10.0, 105.0, 210.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn zoom_to_point_extent() {
        let view = MapView::default()
            .zoom_to_extent(Rect::new(10.0, 10.0, 10.0, 10.0))
            .unwrap();
        let extent = view.extent().unwrap();
        assert!(extent.has_area());
        assert_abs_diff_eq!(extent.center().x, 10.0, epsilon = 1e-9);

        assert!(MapView::default()
            .zoom_to_extent(Rect::new(0.0, 0.0, f64::INFINITY, 1.0))
            .is_none());
    }

    #[test]
    fn zoom_keeps_center() {
        let view = view(Rect::new(0.0, 0.0, 100.0, 100.0), 100, 100);
        let zoomed = view.zoom(0.5, None).unwrap();
        assert_abs_diff_eq!(
            zoomed.extent().unwrap(),
            Rect::new(25.0, 25.0, 75.0, 75.0),
            epsilon = 1e-9
        );

        let zoomed = view.zoom(2.0, Some(Point2d::new(0.0, 0.0))).unwrap();
        assert_abs_diff_eq!(
            zoomed.extent().unwrap(),
            Rect::new(-100.0, -100.0, 100.0, 100.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn zoom_in_and_out_use_factor() {
        let view = view(Rect::new(0.0, 0.0, 120.0, 120.0), 100, 100);
        assert_abs_diff_eq!(
            view.zoom_in(None).unwrap().extent().unwrap().width(),
            100.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            view.zoom_out(None).unwrap().extent().unwrap().width(),
            144.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn zoom_below_minimum_size_is_refused() {
        let view = view(Rect::new(0.0, 0.0, 1e-6, 1e-6), 100, 100);
        assert!(view.zoom(0.5, None).is_none());
        assert!(view.zoom(2.0, None).is_some());
        assert!(view.zoom(f64::NAN, None).is_none());
        assert!(view.zoom(0.0, None).is_none());
    }

    #[test]
    fn repeated_zoom_in_stops_at_minimum_size() {
        let config = ViewConfig::default().with_min_extent_size(0.01);
        let mut view =
            MapView::new(Size::new(100, 100), config).with_extent(Rect::new(0.0, 0.0, 1.0, 1.0));

        let mut refused_at = None;
        for step in 0..100 {
            match view.zoom_in(None) {
                Some(next) => {
                    assert!(refused_at.is_none(), "zoom accepted after a refusal");
                    view = next;
                }
                None => {
                    refused_at.get_or_insert(step);
                }
            }
        }
        assert_eq!(refused_at, Some(25));

        let extent = view.extent().unwrap();
        assert!(extent.has_area());
        assert!(extent.width() >= 0.01 && extent.width() < 0.012);
        assert_abs_diff_eq!(extent.center(), Point2d::new(0.5, 0.5), epsilon = 1e-9);

        assert!(!ViewportControl::zoom(&mut view, 0.5, None));
        assert_eq!(view.extent(), Some(extent));
    }

    #[test]
    fn no_extent_is_noop() {
        let view = MapView::new(Size::new(100, 100), ViewConfig::default());
        assert!(view.zoom(0.5, None).is_none());
        assert!(view.pan(10.0, 10.0).is_none());
        assert!(view.pixel_to_world(0.0, 0.0).is_none());
        assert!(view.world_to_pixel(0.0, 0.0).is_none());
    }

    #[test]
    fn pan_round_trip() {
        let extent = Rect::new(0.0, 0.0, 100.0, 100.0);
        let view = view(extent, 100, 100);

        let panned = view.pan(10.0, -20.0).unwrap();
        assert_eq!(
            panned.extent().unwrap(),
            Rect::new(-10.0, -20.0, 90.0, 80.0)
        );

        let back = panned.pan(-10.0, 20.0).unwrap();
        assert_eq!(back.extent().unwrap(), extent);
    }

    #[test]
    fn pan_with_zero_size_is_refused() {
        let view = view(Rect::new(0.0, 0.0, 100.0, 100.0), 0, 0);
        assert!(view.pan(1.0, 1.0).is_none());
        assert!(view.pixel_to_world(0.0, 0.0).is_none());
    }

    #[test]
    fn pixel_world_conversion() {
        let view = view(Rect::new(0.0, 0.0, 200.0, 100.0), 100, 100);
        let world = view.pixel_to_world(50.0, 25.0).unwrap();
        assert_abs_diff_eq!(world, Point2d::new(100.0, 75.0), epsilon = 1e-9);
        assert_eq!(view.world_to_pixel(101.9, 75.0), Some((50, 25)));
    }

    #[test]
    fn resize_keeps_extent() {
        let extent = Rect::new(0.0, 0.0, 100.0, 100.0);
        let resized = view(extent, 100, 100).with_size(Size::new(300, 200));
        assert_eq!(resized.extent(), Some(extent));
        assert_eq!(resized.size(), Size::new(300, 200));
    }

    #[test]
    fn viewport_control_mutates_view() {
        let mut view = view(Rect::new(0.0, 0.0, 100.0, 100.0), 100, 100);
        assert!(ViewportControl::pan(&mut view, 50.0, 0.0));
        assert_eq!(view.extent().unwrap(), Rect::new(-50.0, 0.0, 50.0, 100.0));

        let mut empty = MapView::default();
        assert!(!ViewportControl::zoom(&mut empty, 0.5, None));
    }
}
