//! Data access layer: reading vector features and raster samples from files.
//!
//! The rest of the crate only sees the [`VectorSource`] and [`RasterDataset`] contracts. Readers
//! are chosen by file extension in [`open_vector`] and [`open_raster`].

use std::fmt::Debug;
use std::path::Path;

use geoview_types::cartesian::{Point2d, Rect};
use geoview_types::geo::{Crs, Projection};
use geoview_types::GeometryType;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::GeoviewError;
use crate::layer::Feature;

#[cfg(feature = "geojson")]
mod geojson;
#[cfg(feature = "geotiff")]
mod geotiff;
mod memory;

#[cfg(feature = "geojson")]
pub use geojson::GeoJsonSource;
#[cfg(feature = "geotiff")]
pub use geotiff::GeoTiffDataset;
pub use memory::{MemoryRaster, MemoryVectorSource};

/// Settings of the data readers.
///
/// Readers get their settings explicitly instead of through process-wide state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SourceConfig {
    default_vector_crs: Crs,
    skip_invalid_features: bool,
    compute_band_stats: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            default_vector_crs: Crs::WGS84,
            skip_invalid_features: true,
            compute_band_stats: true,
        }
    }
}

impl SourceConfig {
    /// CRS assumed for vector files that do not declare one.
    pub fn default_vector_crs(&self) -> &Crs {
        &self.default_vector_crs
    }

    /// Sets CRS assumed for vector files that do not declare one.
    pub fn with_default_vector_crs(mut self, crs: Crs) -> Self {
        self.default_vector_crs = crs;
        self
    }

    /// Sets CRS assumed for vector files that do not declare one.
    pub fn set_default_vector_crs(&mut self, crs: Crs) {
        self.default_vector_crs = crs;
    }

    /// If true (default), features with geometries that cannot be read are skipped with a
    /// warning. Otherwise such a feature fails the whole load.
    pub fn skip_invalid_features(&self) -> bool {
        self.skip_invalid_features
    }

    /// Sets whether features with unreadable geometries are skipped.
    pub fn with_skip_invalid_features(mut self, skip: bool) -> Self {
        self.skip_invalid_features = skip;
        self
    }

    /// Sets whether features with unreadable geometries are skipped.
    pub fn set_skip_invalid_features(&mut self, skip: bool) {
        self.skip_invalid_features = skip;
    }

    /// If true (default), raster readers scan every band on open to fill `min`/`max` of
    /// [`BandInfo`]. Rasters are shaded over this range, so disabling it makes the shading depend
    /// on the visible part of the raster.
    pub fn compute_band_stats(&self) -> bool {
        self.compute_band_stats
    }

    /// Sets whether band statistics are computed on open.
    pub fn with_compute_band_stats(mut self, compute: bool) -> Self {
        self.compute_band_stats = compute;
        self
    }

    /// Sets whether band statistics are computed on open.
    pub fn set_compute_band_stats(&mut self, compute: bool) {
        self.compute_band_stats = compute;
    }
}

/// Contents of a vector file.
#[derive(Debug, Clone)]
pub struct VectorData {
    /// Bounding rectangle of all features, `None` if there are no features with coordinates.
    pub extent: Option<Rect>,
    /// Coordinate system of the features.
    pub crs: Option<Crs>,
    /// Dominant geometry type.
    pub geometry_type: GeometryType,
    /// Features in file order.
    pub features: Vec<Feature>,
}

impl VectorData {
    /// Builds the data from features, computing the extent and the geometry type.
    pub fn from_features(features: Vec<Feature>, crs: Option<Crs>) -> Self {
        let extent = features
            .iter()
            .filter_map(|f| f.geometry().bounding_rectangle())
            .reduce(|acc, r| acc.merge(r));
        let geometry_type =
            GeometryType::common(features.iter().map(|f| f.geometry().geometry_type()));

        Self {
            extent,
            crs,
            geometry_type,
            features,
        }
    }
}

/// Reader of vector files.
pub trait VectorSource {
    /// Reads all features of the file.
    fn open(&self, path: &Path) -> Result<VectorData, GeoviewError>;
}

/// Affine transformation from raster pixel indices to world coordinates.
///
/// Coefficients follow the usual GDAL order:
/// `x = c[0] + col * c[1] + row * c[2]`, `y = c[3] + col * c[4] + row * c[5]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// North-up transform with the given top-left corner and pixel size.
    pub fn north_up(x_min: f64, y_max: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self([x_min, pixel_width, 0.0, y_max, 0.0, -pixel_height])
    }

    /// World position of the given pixel coordinate (pixel corners are at integer values).
    pub fn pixel_to_world(&self, col: f64, row: f64) -> Point2d {
        let c = &self.0;
        Point2d::new(
            c[0] + col * c[1] + row * c[2],
            c[3] + col * c[4] + row * c[5],
        )
    }

    /// Inverse transform, or `None` if the transform is degenerate.
    pub fn inverse(&self) -> Option<GeoTransform> {
        let c = &self.0;
        let det = c[1] * c[5] - c[2] * c[4];
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let a = c[5] / det;
        let b = -c[2] / det;
        let d = -c[4] / det;
        let e = c[1] / det;
        Some(GeoTransform([
            -(a * c[0] + b * c[3]),
            a,
            b,
            -(d * c[0] + e * c[3]),
            d,
            e,
        ]))
    }

    /// Pixel coordinate of the given world position.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Option<Point2d> {
        let inverse = self.inverse()?;
        Some(inverse.pixel_to_world(x, y))
    }

    /// World extent of a raster of the given pixel size.
    pub fn extent(&self, width: u32, height: u32) -> Rect {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.pixel_to_world(0.0, 0.0),
            self.pixel_to_world(w, 0.0),
            self.pixel_to_world(0.0, h),
            self.pixel_to_world(w, h),
        ];
        let first = Rect::from_point(&corners[0]);
        corners[1..]
            .iter()
            .fold(first, |acc, p| acc.merge(Rect::from_point(p)))
    }
}

/// Metadata of one raster band.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BandInfo {
    /// 1-based band index.
    pub index: u32,
    /// Value marking missing samples.
    pub nodata: Option<f64>,
    /// Minimum sample value, if known.
    pub min: Option<f64>,
    /// Maximum sample value, if known.
    pub max: Option<f64>,
}

/// Live access to the samples of a raster file.
///
/// Bands are numbered from 1. Samples are returned row by row.
pub trait RasterDataset: Send + Debug {
    /// Width in pixels.
    fn width(&self) -> u32;
    /// Height in pixels.
    fn height(&self) -> u32;
    /// Number of bands.
    fn band_count(&self) -> u32;
    /// Pixel to world transformation.
    fn geotransform(&self) -> GeoTransform;
    /// Coordinate system of the raster, if declared.
    fn projection(&self) -> Option<Crs>;
    /// Reads `x_size * y_size` samples of the band starting at pixel `(x_off, y_off)`.
    fn read_window(
        &self,
        band: u32,
        x_off: u32,
        y_off: u32,
        x_size: u32,
        y_size: u32,
    ) -> Result<Vec<f64>, GeoviewError>;
    /// Metadata of the band.
    fn band_stats(&self, band: u32) -> Result<BandInfo, GeoviewError>;

    /// Value of the band at the world position, e.g. the elevation of a DEM.
    ///
    /// Returns `None` if the position is outside of the raster or the sample is nodata or NaN.
    fn sample_at(&self, band: u32, position: Point2d) -> Result<Option<f64>, GeoviewError> {
        let Some(pixel) = self.geotransform().world_to_pixel(position.x, position.y) else {
            return Ok(None);
        };
        let (col, row) = (pixel.x.floor(), pixel.y.floor());
        let inside =
            col >= 0.0 && row >= 0.0 && col < self.width() as f64 && row < self.height() as f64;
        if !inside {
            return Ok(None);
        }

        let nodata = self.band_stats(band)?.nodata;
        let value = self
            .read_window(band, col as u32, row as u32, 1, 1)?
            .first()
            .copied()
            .filter(|v| !v.is_nan() && Some(*v) != nodata);
        Ok(value)
    }
}

/// Checks that a window request lies inside a raster of the given dimensions.
pub(crate) fn validate_window(
    dataset: &dyn RasterDataset,
    band: u32,
    x_off: u32,
    y_off: u32,
    x_size: u32,
    y_size: u32,
) -> Result<(), GeoviewError> {
    if band == 0 || band > dataset.band_count() {
        return Err(GeoviewError::RasterRead(format!(
            "band {band} does not exist, raster has {} bands",
            dataset.band_count()
        )));
    }

    let fits = |off: u32, size: u32, limit: u32| {
        size > 0 && off.checked_add(size).is_some_and(|end| end <= limit)
    };
    if !fits(x_off, x_size, dataset.width()) || !fits(y_off, y_size, dataset.height()) {
        return Err(GeoviewError::RasterRead(format!(
            "window {x_off},{y_off} {x_size}x{y_size} is outside of {}x{} raster",
            dataset.width(),
            dataset.height()
        )));
    }

    Ok(())
}

/// Minimum and maximum of the samples, ignoring NaN. `None` if there are no numbers.
pub(crate) fn sample_range(samples: &[f64]) -> Option<(f64, f64)> {
    samples
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((min, max)) => Some((min.min(v), max.max(v))),
        })
}

/// Converts points from `source` to `dest` CRS. Returns `None` if the conversion is not supported
/// or any point cannot be converted.
pub fn reproject(points: &[Point2d], source: &Crs, dest: &Crs) -> Option<Vec<Point2d>> {
    let transform = source.transformation_to(dest)?;
    points.iter().map(|p| transform.project(p)).collect()
}

/// Converts an extent between coordinate systems by transforming its four corners.
pub fn transform_extent(extent: Rect, source: &Crs, dest: &Crs) -> Option<Rect> {
    let corners = reproject(&extent.into_quadrangle(), source, dest)?;
    Rect::from_points(corners.iter())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Returns true if the path has an extension of a vector format (readable or not).
pub fn is_vector_path(path: &Path) -> bool {
    matches!(
        extension(path).as_str(),
        "geojson" | "json" | "shp" | "dxf" | "gpkg" | "kml"
    )
}

/// Returns true if the path has an extension of a raster format.
pub fn is_raster_path(path: &Path) -> bool {
    matches!(extension(path).as_str(), "tif" | "tiff")
}

/// Reads a vector file with the reader matching its extension.
#[cfg_attr(not(feature = "geojson"), allow(unused_variables))]
pub fn open_vector(path: &Path, config: &SourceConfig) -> Result<VectorData, GeoviewError> {
    match extension(path).as_str() {
        #[cfg(feature = "geojson")]
        "geojson" | "json" => GeoJsonSource::new(config.clone()).open(path),
        "shp" | "dxf" | "gpkg" | "kml" => Err(GeoviewError::UnsupportedFormat(format!(
            "no reader for '{}' files is available",
            extension(path)
        ))),
        _ => Err(GeoviewError::UnsupportedFormat(format!(
            "'{}' is not a vector file",
            path.display()
        ))),
    }
}

/// Opens a raster file with the reader matching its extension.
#[cfg_attr(not(feature = "geotiff"), allow(unused_variables))]
pub fn open_raster(
    path: &Path,
    config: &SourceConfig,
) -> Result<Box<dyn RasterDataset>, GeoviewError> {
    match extension(path).as_str() {
        #[cfg(feature = "geotiff")]
        "tif" | "tiff" => Ok(Box::new(GeoTiffDataset::open(path, config)?)),
        _ => Err(GeoviewError::UnsupportedFormat(format!(
            "'{}' is not a raster file",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    #[test]
    fn geotransform_inverse() {
        let gt = GeoTransform::north_up(100.0, 200.0, 2.0, 4.0);
        let world = gt.pixel_to_world(10.0, 5.0);
        assert_eq!(world, Point2d::new(120.0, 180.0));

        let pixel = gt.world_to_pixel(world.x, world.y).unwrap();
        assert_abs_diff_eq!(pixel, Point2d::new(10.0, 5.0), epsilon = 1e-12);
    }

    #[test]
    fn geotransform_extent() {
        let gt = GeoTransform::north_up(0.0, 100.0, 1.0, 1.0);
        assert_eq!(gt.extent(100, 50), Rect::new(0.0, 50.0, 100.0, 100.0));
    }

    #[test]
    fn degenerate_geotransform_has_no_inverse() {
        assert!(GeoTransform([0.0, 0.0, 0.0, 0.0, 0.0, 1.0]).inverse().is_none());
    }

    #[test]
    fn range_ignores_nan() {
        assert_eq!(sample_range(&[3.0, f64::NAN, -1.0, 7.5]), Some((-1.0, 7.5)));
        assert_eq!(sample_range(&[f64::NAN]), None);
        assert_eq!(sample_range(&[]), None);
    }

    #[test]
    fn extent_to_web_mercator() {
        let extent = Rect::new(-180.0, -45.0, 180.0, 45.0);
        let projected = transform_extent(extent, &Crs::WGS84, &Crs::EPSG3857).unwrap();
        assert_abs_diff_eq!(projected.x_max(), 20_037_508.34, epsilon = 0.01);
        assert_abs_diff_eq!(projected.x_min(), -20_037_508.34, epsilon = 0.01);
        assert!(transform_extent(extent, &Crs::WGS84, &Crs::from_epsg(2056)).is_none());
    }

    #[test]
    fn extent_from_utm() {
        let extent = Rect::new(300_000.0, 7_300_000.0, 400_000.0, 7_400_000.0);
        let geographic = transform_extent(extent, &Crs::from_epsg(31983), &Crs::WGS84).unwrap();
        assert!(geographic.x_min() > -48.0 && geographic.x_max() < -45.0);
        assert!(geographic.y_min() > -25.0 && geographic.y_max() < -23.0);
    }

    #[test]
    fn unsupported_extensions() {
        let config = SourceConfig::default();
        assert_matches!(
            open_vector(Path::new("roads.shp"), &config),
            Err(GeoviewError::UnsupportedFormat(_))
        );
        assert_matches!(
            open_vector(Path::new("drawing.dxf"), &config),
            Err(GeoviewError::UnsupportedFormat(_))
        );
        assert_matches!(
            open_raster(Path::new("image.png"), &config),
            Err(GeoviewError::UnsupportedFormat(_))
        );
        assert!(is_vector_path(Path::new("a.GeoJSON")));
        assert!(is_raster_path(Path::new("dem.TIF")));
    }
}
