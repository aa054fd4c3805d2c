//! Map interaction: input events, the viewport interface and map tools.
//!
//! The UI converts its native events into [`MapInputEvent`]s and gives them to the
//! [`Map`](crate::Map). Wheel events always zoom the map. All other events are interpreted by the
//! active [`MapTool`], which changes the viewport through the [`ViewportControl`] trait or
//! produces a [`ToolOutcome`] for the application.

use geoview_types::cartesian::Point2d;

mod tool;

pub use tool::{CursorHint, DrawnGeometry, MapTool, MapToolKind, ToolOutcome};

/// Mouse button enum.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Middle button or wheel click.
    Middle,
    /// Secondary button.
    Right,
    /// Any other button.
    Other,
}

/// Keyboard keys the map tools react to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Key {
    /// Cancels the geometry being digitized.
    Escape,
    /// Finishes the geometry being digitized.
    Enter,
    /// Any other key.
    Other,
}

/// User input event in screen pixel coordinates (from the top-left corner of the map image).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapInputEvent {
    /// A mouse button was pressed.
    ButtonPressed {
        /// Button.
        button: MouseButton,
        /// Pointer position.
        position: Point2d,
    },
    /// A mouse button was released.
    ButtonReleased {
        /// Button.
        button: MouseButton,
        /// Pointer position.
        position: Point2d,
    },
    /// Mouse pointer moved.
    PointerMoved {
        /// New pointer position.
        position: Point2d,
    },
    /// Mouse wheel was turned. Positive delta means scrolling up (away from the user).
    Wheel {
        /// Scroll amount.
        delta: f64,
        /// Pointer position.
        position: Point2d,
    },
    /// A key was pressed.
    KeyPressed(Key),
}

/// Viewport operations available to map tools.
pub trait ViewportControl {
    /// World position of the screen pixel, or `None` if the viewport has no extent.
    fn pixel_to_world(&self, px: f64, py: f64) -> Option<Point2d>;
    /// Moves the map content by the given number of pixels. Returns false if nothing changed.
    fn pan(&mut self, dx: f64, dy: f64) -> bool;
    /// Scales the visible extent around the `center`. Returns false if nothing changed.
    fn zoom(&mut self, factor: f64, center: Option<Point2d>) -> bool;
}

/// Zooms the viewport around the pointer: in for positive `delta`, out for negative.
pub(crate) fn wheel_zoom(
    viewport: &mut impl ViewportControl,
    delta: f64,
    position: Point2d,
    zoom_factor: f64,
) -> bool {
    if delta == 0.0 || !delta.is_finite() {
        return false;
    }

    let Some(center) = viewport.pixel_to_world(position.x, position.y) else {
        return false;
    };
    let factor = if delta > 0.0 {
        1.0 / zoom_factor
    } else {
        zoom_factor
    };

    viewport.zoom(factor, Some(center))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{MapView, ViewConfig};
    use approx::assert_abs_diff_eq;
    use geoview_types::cartesian::{Rect, Size};

    #[test]
    fn wheel_zooms_around_pointer() {
        let mut view = MapView::new(Size::new(100, 100), ViewConfig::default())
            .with_extent(Rect::new(0.0, 0.0, 120.0, 120.0));

        assert!(wheel_zoom(&mut view, 1.0, Point2d::new(0.0, 100.0), 1.2));
        assert_abs_diff_eq!(
            view.extent().unwrap(),
            Rect::new(-50.0, -50.0, 50.0, 50.0),
            epsilon = 1e-9
        );

        assert!(wheel_zoom(&mut view, -1.0, Point2d::new(50.0, 50.0), 1.2));
        assert_abs_diff_eq!(view.extent().unwrap().width(), 120.0, epsilon = 1e-9);

        assert!(!wheel_zoom(&mut view, 0.0, Point2d::new(50.0, 50.0), 1.2));
    }
}
