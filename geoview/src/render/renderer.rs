use geoview_types::cartesian::Point2d;
use geoview_types::{ClosedContour, Contour, Geom, MultiContour, MultiPoint, MultiPolygon};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use super::{RenderContext, VectorStyle};
use crate::error::GeoviewError;
use crate::layer::{Layer, RasterLayer, VectorLayer};
use crate::source::sample_range;
use crate::Color;

/// Band drawn by the raster path.
const RASTER_BAND: u32 = 1;
/// Largest resampled raster image, as a multiple of the output pixel count.
const MAX_RESAMPLE_FACTOR: u64 = 16;

/// Draws a single layer into an image of the render context size.
///
/// Output images use straight alpha and are drawn at full opacity. Layer opacity is applied
/// later by the compositor.
#[derive(Debug, Clone, Default)]
pub struct LayerRenderer {
    style: VectorStyle,
}

impl LayerRenderer {
    /// Creates a renderer with the default vector style.
    pub fn new(style: VectorStyle) -> Self {
        Self { style }
    }

    /// Style of vector layers without their own style.
    pub fn style(&self) -> &VectorStyle {
        &self.style
    }

    /// Sets the style of vector layers without their own style.
    pub fn set_style(&mut self, style: VectorStyle) {
        self.style = style;
    }

    /// Renders the layer. Returns `None` if the layer cannot be drawn (e.g. raster samples cannot
    /// be read).
    pub fn render(&self, layer: &Layer, context: &RenderContext) -> Option<RgbaImage> {
        match layer {
            Layer::Vector(vector) => self.render_vector(vector, context),
            Layer::Raster(raster) => self.render_raster(raster, context),
        }
    }

    fn render_vector(&self, layer: &VectorLayer, context: &RenderContext) -> Option<RgbaImage> {
        let style = layer.style().unwrap_or(&self.style);
        let mut pixmap = Pixmap::new(context.width(), context.height())?;

        let mut failed = 0usize;
        for (index, feature) in layer.features().iter().enumerate() {
            if let Err(err) = draw_geometry(&mut pixmap, feature.geometry(), context, style) {
                log::warn!("Feature {index} of '{}' skipped: {err}", layer.properties.name);
                failed += 1;
            }
        }

        if failed > 0 {
            log::debug!(
                "{failed} of {} features of '{}' were not drawn",
                layer.feature_count(),
                layer.properties.name
            );
        }

        pixmap_to_image(&pixmap)
    }

    fn render_raster(&self, layer: &RasterLayer, context: &RenderContext) -> Option<RgbaImage> {
        match render_raster_window(layer, context) {
            Ok(image) => Some(image),
            Err(err) => {
                log::warn!(
                    "Raster layer '{}' cannot be drawn: {err}",
                    layer.properties.name
                );
                None
            }
        }
    }
}

fn render_raster_window(
    layer: &RasterLayer,
    context: &RenderContext,
) -> Result<RgbaImage, GeoviewError> {
    let mut output = RgbaImage::new(context.width(), context.height());

    let geotransform = layer
        .geotransform()
        .ok_or_else(|| GeoviewError::RasterRead("layer is not loaded".into()))?;
    let inverse = geotransform
        .inverse()
        .ok_or_else(|| GeoviewError::RasterRead("geotransform is not invertible".into()))?;

    let view_pixels = context
        .extent()
        .into_quadrangle()
        .map(|p| inverse.pixel_to_world(p.x, p.y));
    let (cols, rows) = pixel_bounds(&view_pixels);
    let col_min = clamp_index(cols.0.floor(), layer.width());
    let col_max = clamp_index(cols.1.ceil(), layer.width());
    let row_min = clamp_index(rows.0.floor(), layer.height());
    let row_max = clamp_index(rows.1.ceil(), layer.height());

    if col_min >= col_max || row_min >= row_max {
        log::debug!("Raster '{}' is outside of the view", layer.properties.name);
        return Ok(output);
    }

    let (x_size, y_size) = (col_max - col_min, row_max - row_min);
    let samples = layer.read_window(RASTER_BAND, col_min, row_min, x_size, y_size)?;
    let range = layer
        .bands()
        .first()
        .and_then(|band| band.min.zip(band.max))
        .or_else(|| sample_range(&samples));
    let window = normalize_to_gray(&samples, range, x_size, y_size)?;

    let top_left = geotransform.pixel_to_world(col_min as f64, row_min as f64);
    let bottom_right = geotransform.pixel_to_world(col_max as f64, row_max as f64);
    let a = context.world_to_screen(top_left.x, top_left.y);
    let b = context.world_to_screen(bottom_right.x, bottom_right.y);
    let left = a.x.min(b.x);
    let top = a.y.min(b.y);
    let target_width = ((a.x - b.x).abs().round() as u32).max(1);
    let target_height = ((a.y - b.y).abs().round() as u32).max(1);

    let too_large = target_width as u64 * target_height as u64
        > MAX_RESAMPLE_FACTOR * context.width() as u64 * context.height() as u64;
    if too_large {
        sample_nearest(&mut output, &window, layer, col_min, row_min, context);
        return Ok(output);
    }

    let gray = if (target_width, target_height) != (x_size, y_size) {
        imageops::resize(&window, target_width, target_height, FilterType::Triangle)
    } else {
        window
    };

    let rgba = RgbaImage::from_fn(gray.width(), gray.height(), |x, y| {
        let Luma([v]) = *gray.get_pixel(x, y);
        Rgba([v, v, v, 255])
    });
    imageops::replace(&mut output, &rgba, left.round() as i64, top.round() as i64);

    Ok(output)
}

/// Fills output pixels from the nearest window sample. Used when the window is magnified so much
/// that a resampled copy would not fit in memory.
fn sample_nearest(
    output: &mut RgbaImage,
    window: &GrayImage,
    layer: &RasterLayer,
    col_min: u32,
    row_min: u32,
    context: &RenderContext,
) {
    let Some(inverse) = layer.geotransform().and_then(|gt| gt.inverse()) else {
        return;
    };

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let world = context.pixel_to_world(x as f64 + 0.5, y as f64 + 0.5);
        let raster = inverse.pixel_to_world(world.x, world.y);
        let col = raster.x.floor() - col_min as f64;
        let row = raster.y.floor() - row_min as f64;
        if col < 0.0 || row < 0.0 || col >= window.width() as f64 || row >= window.height() as f64
        {
            continue;
        }

        let Luma([v]) = *window.get_pixel(col as u32, row as u32);
        *pixel = Rgba([v, v, v, 255]);
    }
}

fn pixel_bounds(points: &[Point2d; 4]) -> ((f64, f64), (f64, f64)) {
    points.iter().fold(
        (
            (f64::INFINITY, f64::NEG_INFINITY),
            (f64::INFINITY, f64::NEG_INFINITY),
        ),
        |((x0, x1), (y0, y1)), p| ((x0.min(p.x), x1.max(p.x)), (y0.min(p.y), y1.max(p.y))),
    )
}

fn clamp_index(value: f64, limit: u32) -> u32 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, limit as f64) as u32
}

/// Scales samples linearly from `range` to `0..=255`. Samples outside of the range are clamped.
/// NaN samples and an empty range become 0.
pub(crate) fn normalize_to_gray(
    samples: &[f64],
    range: Option<(f64, f64)>,
    width: u32,
    height: u32,
) -> Result<GrayImage, GeoviewError> {
    let (min, max) = range.unwrap_or((0.0, 0.0));
    let range = max - min;
    let values = samples
        .iter()
        .map(|v| {
            if range > 0.0 && !v.is_nan() {
                ((v - min) / range * 255.0).clamp(0.0, 255.0) as u8
            } else {
                0
            }
        })
        .collect();

    GrayImage::from_raw(width, height, values).ok_or_else(|| {
        GeoviewError::RasterRead(format!(
            "expected {width}x{height} samples, got {}",
            samples.len()
        ))
    })
}

fn draw_geometry(
    pixmap: &mut Pixmap,
    geometry: &Geom<Point2d>,
    context: &RenderContext,
    style: &VectorStyle,
) -> Result<(), GeoviewError> {
    match geometry {
        Geom::Point(p) => draw_point(pixmap, p, context, style),
        Geom::MultiPoint(MultiPoint(points)) => points
            .iter()
            .try_for_each(|p| draw_point(pixmap, p, context, style)),
        Geom::Contour(contour) => draw_line(pixmap, contour, context, style),
        Geom::MultiContour(MultiContour(contours)) => contours
            .iter()
            .try_for_each(|c| draw_line(pixmap, c, context, style)),
        Geom::Polygon(polygon) => draw_polygon(pixmap, &polygon.outer_contour, context, style),
        Geom::MultiPolygon(MultiPolygon(polygons)) => polygons
            .iter()
            .try_for_each(|p| draw_polygon(pixmap, &p.outer_contour, context, style)),
    }
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

fn stroke(width: f32) -> Stroke {
    Stroke {
        width,
        ..Stroke::default()
    }
}

fn screen_point(p: &Point2d, context: &RenderContext) -> Result<(f32, f32), GeoviewError> {
    let screen = context.world_to_screen(p.x, p.y);
    let (x, y) = (screen.x as f32, screen.y as f32);
    if !x.is_finite() || !y.is_finite() {
        return Err(GeoviewError::GeometryDraw(format!(
            "coordinate ({}, {}) cannot be drawn",
            p.x, p.y
        )));
    }
    Ok((x, y))
}

fn polyline<'a>(
    points: impl Iterator<Item = &'a Point2d>,
    context: &RenderContext,
    close: bool,
) -> Result<Option<Path>, GeoviewError> {
    let mut builder = PathBuilder::new();
    for (i, p) in points.enumerate() {
        let (x, y) = screen_point(p, context)?;
        if i == 0 {
            builder.move_to(x, y);
        } else {
            builder.line_to(x, y);
        }
    }
    if close {
        builder.close();
    }

    Ok(builder.finish())
}

fn draw_point(
    pixmap: &mut Pixmap,
    point: &Point2d,
    context: &RenderContext,
    style: &VectorStyle,
) -> Result<(), GeoviewError> {
    let (x, y) = screen_point(point, context)?;
    let circle = PathBuilder::from_circle(x, y, style.point_radius()).ok_or_else(|| {
        GeoviewError::GeometryDraw(format!("invalid point radius {}", style.point_radius()))
    })?;

    pixmap.fill_path(
        &circle,
        &paint(style.fill_color()),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
    pixmap.stroke_path(
        &circle,
        &paint(style.outline_color()),
        &stroke(style.outline_width()),
        Transform::identity(),
        None,
    );
    Ok(())
}

fn draw_line(
    pixmap: &mut Pixmap,
    contour: &Contour<Point2d>,
    context: &RenderContext,
    style: &VectorStyle,
) -> Result<(), GeoviewError> {
    if contour.len() < 2 {
        return Ok(());
    }

    if let Some(path) = polyline(contour.iter_points_closing(), context, false)? {
        pixmap.stroke_path(
            &path,
            &paint(style.line_color()),
            &stroke(style.line_width()),
            Transform::identity(),
            None,
        );
    }
    Ok(())
}

fn draw_polygon(
    pixmap: &mut Pixmap,
    ring: &ClosedContour<Point2d>,
    context: &RenderContext,
    style: &VectorStyle,
) -> Result<(), GeoviewError> {
    if ring.len() < 3 {
        return Ok(());
    }

    if let Some(path) = polyline(ring.points().iter(), context, true)? {
        pixmap.fill_path(
            &path,
            &paint(style.fill_color()),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
        pixmap.stroke_path(
            &path,
            &paint(style.outline_color()),
            &stroke(style.outline_width()),
            Transform::identity(),
            None,
        );
    }
    Ok(())
}

/// Draws the geometry being digitized: the vertices connected by a line, closed for polygons,
/// and a marker at every vertex.
pub(crate) fn draw_sketch(
    target: &mut RgbaImage,
    vertices: &[Point2d],
    closed: bool,
    color: Color,
    context: &RenderContext,
) -> Result<(), GeoviewError> {
    if vertices.is_empty() {
        return Ok(());
    }

    let Some(mut pixmap) = Pixmap::new(context.width(), context.height()) else {
        return Ok(());
    };
    let style = VectorStyle::default()
        .with_fill_color(color)
        .with_outline_color(color)
        .with_line_color(color)
        .with_line_width(2.0);

    if vertices.len() >= 2 {
        let close = closed && vertices.len() >= 3;
        if let Some(path) = polyline(vertices.iter(), context, close)? {
            pixmap.stroke_path(
                &path,
                &paint(color),
                &stroke(style.line_width()),
                Transform::identity(),
                None,
            );
        }
    }
    for vertex in vertices {
        draw_point(&mut pixmap, vertex, context, &style)?;
    }

    if let Some(sketch) = pixmap_to_image(&pixmap) {
        super::compositor::blend_over(target, &sketch, 1.0);
    }
    Ok(())
}

fn pixmap_to_image(pixmap: &Pixmap) -> Option<RgbaImage> {
    let raw = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{raster_layer_from, vector_layer_with_points};
    use geoview_types::cartesian::{Rect, Size};
    use geoview_types::Polygon;

    fn context(extent: Rect) -> RenderContext {
        RenderContext::new(Size::new(100, 100), extent).unwrap()
    }

    #[test]
    fn renders_points_with_fill_color() {
        let layer = vector_layer_with_points("points", &[(50.0, 50.0)]);
        let image = LayerRenderer::default()
            .render(&layer, &context(Rect::new(0.0, 0.0, 100.0, 100.0)))
            .unwrap();

        assert_eq!(image.dimensions(), (100, 100));
        let [_, _, blue, alpha] = image.get_pixel(50, 50).0;
        assert!(alpha.abs_diff(180) <= 1);
        assert!(blue >= 250);
        assert_eq!(image.get_pixel(10, 10).0, [0, 0, 0, 0]);
    }

    #[test]
    fn polygon_is_filled_and_holes_are_ignored() {
        let ring = |x: f64, size: f64| {
            ClosedContour::new(vec![
                Point2d::new(x, x),
                Point2d::new(x + size, x),
                Point2d::new(x + size, x + size),
                Point2d::new(x, x + size),
            ])
        };
        let polygon = Polygon::new(ring(10.0, 80.0), vec![ring(40.0, 20.0)]);
        let mut pixmap = Pixmap::new(100, 100).unwrap();
        draw_geometry(
            &mut pixmap,
            &Geom::Polygon(polygon),
            &context(Rect::new(0.0, 0.0, 100.0, 100.0)),
            &VectorStyle::default(),
        )
        .unwrap();

        let image = pixmap_to_image(&pixmap).unwrap();
        assert!(image.get_pixel(50, 50).0[3].abs_diff(180) <= 1);
        assert!(image.get_pixel(25, 25).0[3].abs_diff(180) <= 1);
        assert_eq!(image.get_pixel(5, 5).0[3], 0);
    }

    #[test]
    fn non_finite_coordinate_fails_feature() {
        let mut pixmap = Pixmap::new(10, 10).unwrap();
        let result = draw_geometry(
            &mut pixmap,
            &Geom::Point(Point2d::new(f64::NAN, 0.0)),
            &context(Rect::new(0.0, 0.0, 10.0, 10.0)),
            &VectorStyle::default(),
        );
        assert!(matches!(result, Err(GeoviewError::GeometryDraw(_))));
    }

    #[test]
    fn short_lines_are_skipped() {
        let mut pixmap = Pixmap::new(10, 10).unwrap();
        let line = Contour::open(vec![Point2d::new(1.0, 1.0)]);
        draw_geometry(
            &mut pixmap,
            &Geom::Contour(line),
            &context(Rect::new(0.0, 0.0, 10.0, 10.0)),
            &VectorStyle::default(),
        )
        .unwrap();
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn normalization() {
        let samples = [0.0, 5.0, 10.0, f64::NAN];
        let image = normalize_to_gray(&samples, Some((0.0, 10.0)), 2, 2).unwrap();
        assert_eq!(image.as_raw(), &vec![0, 127, 255, 0]);

        let wide = normalize_to_gray(&samples, Some((-10.0, 20.0)), 2, 2).unwrap();
        assert_eq!(wide.as_raw(), &vec![85, 127, 170, 0]);

        let clamped = normalize_to_gray(&[-5.0, 15.0], Some((0.0, 10.0)), 2, 1).unwrap();
        assert_eq!(clamped.as_raw(), &vec![0, 255]);

        let flat = normalize_to_gray(&[3.0; 4], Some((3.0, 3.0)), 2, 2).unwrap();
        assert_eq!(flat.as_raw(), &vec![0; 4]);
        let unknown = normalize_to_gray(&[3.0; 4], None, 2, 2).unwrap();
        assert_eq!(unknown.as_raw(), &vec![0; 4]);

        assert!(normalize_to_gray(&[1.0], Some((0.0, 1.0)), 2, 2).is_err());
    }

    #[test]
    fn raster_fills_view_and_is_opaque() {
        let samples: Vec<f64> = (0..100).map(|v| v as f64).collect();
        let layer = raster_layer_from("dem", 10, 10, Rect::new(0.0, 0.0, 100.0, 100.0), samples);
        let image = LayerRenderer::default()
            .render(&layer, &context(Rect::new(0.0, 0.0, 100.0, 100.0)))
            .unwrap();

        assert_eq!(image.dimensions(), (100, 100));
        assert!(image.pixels().all(|p| p.0[3] == 255));
        // top-left sample is the minimum, bottom-right the maximum
        assert!(image.get_pixel(0, 0).0[0] < 10);
        assert!(image.get_pixel(99, 99).0[0] > 245);
    }

    #[test]
    fn raster_shading_does_not_depend_on_view() {
        let samples: Vec<f64> = (0..100).map(|v| v as f64).collect();
        let layer = raster_layer_from("dem", 10, 10, Rect::new(0.0, 0.0, 100.0, 100.0), samples);
        let renderer = LayerRenderer::default();

        // world point (15, 5) holds sample 91 of the 0..=99 ramp
        let expected = (91.0 / 99.0 * 255.0) as u8;
        let zoomed = renderer
            .render(&layer, &context(Rect::new(10.0, 0.0, 20.0, 10.0)))
            .unwrap();
        assert_eq!(zoomed.get_pixel(50, 50).0[0], expected);

        let full = renderer
            .render(&layer, &context(Rect::new(0.0, 0.0, 100.0, 100.0)))
            .unwrap();
        assert!(full.get_pixel(15, 95).0[0].abs_diff(expected) <= 2);
    }

    #[test]
    fn raster_is_placed_at_its_extent() {
        let layer = raster_layer_from(
            "dem",
            2,
            2,
            Rect::new(0.0, 0.0, 50.0, 50.0),
            vec![0.0, 1.0, 2.0, 3.0],
        );
        let image = LayerRenderer::default()
            .render(&layer, &context(Rect::new(0.0, 0.0, 100.0, 100.0)))
            .unwrap();

        // the raster covers the bottom-left quarter of the view
        assert_eq!(image.get_pixel(25, 75).0[3], 255);
        assert_eq!(image.get_pixel(75, 25).0[3], 0);
        assert_eq!(image.get_pixel(25, 25).0[3], 0);
    }

    #[test]
    fn raster_outside_of_view_is_transparent() {
        let layer = raster_layer_from(
            "dem",
            2,
            2,
            Rect::new(500.0, 500.0, 600.0, 600.0),
            vec![0.0, 1.0, 2.0, 3.0],
        );
        let image = LayerRenderer::default()
            .render(&layer, &context(Rect::new(0.0, 0.0, 100.0, 100.0)))
            .unwrap();
        assert!(image.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn extreme_magnification_uses_nearest_samples() {
        let layer = raster_layer_from(
            "dem",
            2,
            2,
            Rect::new(0.0, 0.0, 2.0, 2.0),
            vec![0.0, 1.0, 2.0, 3.0],
        );
        let image = LayerRenderer::default()
            .render(&layer, &context(Rect::new(0.9, 0.9, 1.1, 1.1)))
            .unwrap();
        assert!(image.pixels().all(|p| p.0[3] == 255));
        // bottom-right quadrant of the view shows the largest sample
        assert_eq!(image.get_pixel(99, 99).0[0], 255);
        assert_eq!(image.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn sketch_is_drawn_over_target() {
        let ctx = context(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut target = RgbaImage::from_pixel(100, 100, Color::WHITE.to_pixel());
        draw_sketch(
            &mut target,
            &[Point2d::new(10.0, 50.0), Point2d::new(90.0, 50.0)],
            false,
            Color::rgba(255, 0, 0, 255),
            &ctx,
        )
        .unwrap();
        let [r, g, b, _] = target.get_pixel(50, 50).0;
        assert!(r > 250 && g < 5 && b < 5);
        assert_eq!(target.get_pixel(50, 10).0, [255, 255, 255, 255]);
    }
}
