//! Software rendering of layers and composition of the map image.

mod cache;
mod compositor;
mod context;
mod renderer;
mod style;

pub use cache::RenderCache;
pub use compositor::Compositor;
pub use context::RenderContext;
pub use renderer::LayerRenderer;
pub use style::{RenderConfig, VectorStyle};

pub(crate) use renderer::draw_sketch;
