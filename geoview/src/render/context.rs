use geoview_types::cartesian::{Point2d, Rect, Size};

/// Target of a render pass: pixel size and the world extent mapped onto it.
///
/// The Y axis is inverted: `extent.y_max()` maps to pixel row 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    size: Size<u32>,
    extent: Rect,
    scale_x: f64,
    scale_y: f64,
}

impl RenderContext {
    /// Creates a context. Returns `None` if the extent has no area or the size is zero.
    pub fn new(size: Size<u32>, extent: Rect) -> Option<Self> {
        if size.is_zero() || !extent.has_area() {
            return None;
        }

        let scale_x = size.width() as f64 / extent.width();
        let scale_y = size.height() as f64 / extent.height();
        if !scale_x.is_finite() || !scale_y.is_finite() {
            return None;
        }

        Some(Self {
            size,
            extent,
            scale_x,
            scale_y,
        })
    }

    /// Pixel size of the output.
    pub fn size(&self) -> Size<u32> {
        self.size
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.size.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.size.height()
    }

    /// World extent drawn.
    pub fn extent(&self) -> Rect {
        self.extent
    }

    /// Pixels per world unit along X.
    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    /// Pixels per world unit along Y.
    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// Pixel containing the world position. Coordinates are truncated toward zero.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (i64, i64) {
        let screen = self.world_to_screen(x, y);
        (screen.x as i64, screen.y as i64)
    }

    /// Sub-pixel screen position of the world position.
    pub fn world_to_screen(&self, x: f64, y: f64) -> Point2d {
        Point2d::new(
            (x - self.extent.x_min()) * self.scale_x,
            (self.extent.y_max() - y) * self.scale_y,
        )
    }

    /// World position of the screen position.
    pub fn pixel_to_world(&self, px: f64, py: f64) -> Point2d {
        Point2d::new(
            self.extent.x_min() + px / self.scale_x,
            self.extent.y_max() - py / self.scale_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_contexts() {
        let extent = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(RenderContext::new(Size::new(0, 10), extent).is_none());
        assert!(RenderContext::new(Size::new(10, 10), Rect::new(0.0, 0.0, 0.0, 10.0)).is_none());
        assert!(RenderContext::new(Size::new(10, 10), extent).is_some());
    }

    #[test]
    fn world_to_pixel_inverts_y() {
        let ctx =
            RenderContext::new(Size::new(200, 100), Rect::new(0.0, 0.0, 100.0, 50.0)).unwrap();
        assert_eq!(ctx.scale_x(), 2.0);
        assert_eq!(ctx.world_to_pixel(0.0, 50.0), (0, 0));
        assert_eq!(ctx.world_to_pixel(100.0, 0.0), (200, 100));
        assert_eq!(ctx.world_to_pixel(10.7, 40.0), (21, 20));
        assert_eq!(ctx.pixel_to_world(20.0, 20.0), Point2d::new(10.0, 40.0));
    }
}
