use std::sync::Arc;

use ahash::HashMap;
use geoview_types::cartesian::{Rect, Size};
use image::RgbaImage;

#[derive(Debug, Clone)]
struct CacheEntry {
    extent: [u64; 4],
    size: Size<u32>,
    image: Arc<RgbaImage>,
}

/// Last rendered image of every layer, keyed by layer name.
///
/// An entry is only returned for exactly the same extent and pixel size it was rendered for.
/// Extents are compared bitwise, so any pan or zoom makes the entry stale.
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: HashMap<String, CacheEntry>,
}

impl RenderCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached image of the layer, if it was rendered for the given extent and size.
    pub fn get(&self, name: &str, extent: &Rect, size: Size<u32>) -> Option<Arc<RgbaImage>> {
        let entry = self.entries.get(name)?;
        if entry.size == size && entry.extent == extent.to_bits() {
            Some(entry.image.clone())
        } else {
            None
        }
    }

    /// Stores the image of the layer, replacing any previous one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        extent: &Rect,
        size: Size<u32>,
        image: Arc<RgbaImage>,
    ) {
        self.entries.insert(
            name.into(),
            CacheEntry {
                extent: extent.to_bits(),
                size,
                image,
            },
        );
    }

    /// Drops the image of the layer.
    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Drops all images.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached images.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
