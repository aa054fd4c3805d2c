//! Geoview is the core of a desktop GIS viewer. It loads vector and raster layers, composes them
//! into a single image of the current view, and interprets user input into view changes and
//! digitized geometries.
//!
//! # Quick start
//!
//! Rendering a couple of files into a PNG image:
//!
//! ```no_run
//! use geoview::layer::LayerKind;
//! use geoview::MapBuilder;
//!
//! let mut map = MapBuilder::default().with_size(1024, 768).build();
//! map.add_layer("data/dem.tif", LayerKind::Raster).unwrap();
//! map.add_layer("data/roads.geojson", LayerKind::Vector).unwrap();
//!
//! map.render().unwrap();
//! map.save_image("map.png").unwrap();
//! ```
//!
//! # Main components
//!
//! * [`Map`] is the session the user interface talks to. It owns the
//! * [`LayerRegistry`], an ordered stack of [`layers`](layer) read through the [`source`]
//!   readers, the
//! * [`MapView`] with the currently visible extent and output size, the
//! * [`Compositor`](render::Compositor), which draws every layer and caches the images, and the
//!   active [`MapTool`](control::MapTool).
//!
//! The UI converts its events into [`MapInputEvent`](control::MapInputEvent)s and gives them to
//! [`Map::handle_event`]. Changes the UI should react on are delivered as [`MapEvent`]s through
//! the [`Messenger`] set for the map.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

mod color;
pub mod control;
pub mod error;
pub mod layer;
pub mod loader;
mod map;
mod messenger;
pub mod render;
pub mod source;
mod view;

#[cfg(test)]
mod tests;

pub use color::Color;
pub use map::{LayerRegistry, Map, MapBuilder};
pub use messenger::{DummyMessenger, MapEvent, Messenger};
pub use view::{MapView, ViewConfig};

// Reexport geoview_types
pub use geoview_types;
