//! Notifications sent from a [`Map`](crate::Map) to the user interface.

use geoview_types::cartesian::Point2d;

use crate::control::DrawnGeometry;

/// Event emitted by a map when its state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Number of layers in the map changed.
    LayerCountChanged(usize),
    /// Human-readable status text, e.g. a load failure.
    StatusMessage(String),
    /// A new composite image is available.
    ImageUpdated,
    /// A digitizing tool finished a geometry.
    GeometryAdded(DrawnGeometry),
    /// The identify tool was used at the given world position.
    Identified(Point2d),
}

/// Receiver of [`MapEvent`]s.
pub trait Messenger: Send {
    /// Delivers the event.
    fn notify(&self, event: MapEvent);
}

impl<T: Fn(MapEvent) + Send> Messenger for T {
    fn notify(&self, event: MapEvent) {
        self(event)
    }
}

/// Messenger that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyMessenger;

impl Messenger for DummyMessenger {
    fn notify(&self, _event: MapEvent) {}
}
