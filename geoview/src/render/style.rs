#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Color;

/// Colors and sizes used to draw vector features.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VectorStyle {
    fill_color: Color,
    outline_color: Color,
    outline_width: f32,
    line_color: Color,
    line_width: f32,
    point_radius: f32,
}

impl Default for VectorStyle {
    fn default() -> Self {
        Self {
            fill_color: Color::rgba(100, 100, 255, 180),
            outline_color: Color::BLACK,
            outline_width: 1.0,
            line_color: Color::BLACK,
            line_width: 1.0,
            point_radius: 3.0,
        }
    }
}

impl VectorStyle {
    /// Fill color of polygons and points.
    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    /// Sets fill color of polygons and points.
    pub fn with_fill_color(mut self, color: Color) -> Self {
        self.fill_color = color;
        self
    }

    /// Sets fill color of polygons and points.
    pub fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
    }

    /// Outline color of polygons and points.
    pub fn outline_color(&self) -> Color {
        self.outline_color
    }

    /// Sets outline color of polygons and points.
    pub fn with_outline_color(mut self, color: Color) -> Self {
        self.outline_color = color;
        self
    }

    /// Sets outline color of polygons and points.
    pub fn set_outline_color(&mut self, color: Color) {
        self.outline_color = color;
    }

    /// Outline width in pixels.
    pub fn outline_width(&self) -> f32 {
        self.outline_width
    }

    /// Sets outline width in pixels.
    pub fn with_outline_width(mut self, width: f32) -> Self {
        self.outline_width = width;
        self
    }

    /// Sets outline width in pixels.
    pub fn set_outline_width(&mut self, width: f32) {
        self.outline_width = width;
    }

    /// Color of line strings.
    pub fn line_color(&self) -> Color {
        self.line_color
    }

    /// Sets color of line strings.
    pub fn with_line_color(mut self, color: Color) -> Self {
        self.line_color = color;
        self
    }

    /// Sets color of line strings.
    pub fn set_line_color(&mut self, color: Color) {
        self.line_color = color;
    }

    /// Width of line strings in pixels.
    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    /// Sets width of line strings in pixels.
    pub fn with_line_width(mut self, width: f32) -> Self {
        self.line_width = width;
        self
    }

    /// Sets width of line strings in pixels.
    pub fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    /// Radius of point markers in pixels.
    pub fn point_radius(&self) -> f32 {
        self.point_radius
    }

    /// Sets radius of point markers in pixels.
    pub fn with_point_radius(mut self, radius: f32) -> Self {
        self.point_radius = radius;
        self
    }

    /// Sets radius of point markers in pixels.
    pub fn set_point_radius(&mut self, radius: f32) {
        self.point_radius = radius;
    }
}

/// Settings of map rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RenderConfig {
    background: Color,
    cache_enabled: bool,
    vector_style: VectorStyle,
    sketch_color: Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            cache_enabled: true,
            vector_style: VectorStyle::default(),
            sketch_color: Color::rgba(255, 0, 0, 255),
        }
    }
}

impl RenderConfig {
    /// Color the composite image is filled with before layers are drawn.
    pub fn background(&self) -> Color {
        self.background
    }

    /// Sets the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Sets the background color.
    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    /// Whether rendered layer images are reused while the view does not change.
    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// Enables or disables the layer image cache.
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Enables or disables the layer image cache.
    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
    }

    /// Style of vector layers that do not have their own.
    pub fn vector_style(&self) -> &VectorStyle {
        &self.vector_style
    }

    /// Sets the default vector style.
    pub fn with_vector_style(mut self, style: VectorStyle) -> Self {
        self.vector_style = style;
        self
    }

    /// Sets the default vector style.
    pub fn set_vector_style(&mut self, style: VectorStyle) {
        self.vector_style = style;
    }

    /// Color of the geometry being digitized.
    pub fn sketch_color(&self) -> Color {
        self.sketch_color
    }

    /// Sets the color of the geometry being digitized.
    pub fn with_sketch_color(mut self, color: Color) -> Self {
        self.sketch_color = color;
        self
    }

    /// Sets the color of the geometry being digitized.
    pub fn set_sketch_color(&mut self, color: Color) {
        self.sketch_color = color;
    }
}
