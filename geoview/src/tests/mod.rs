//! Fixtures shared by the unit tests.

use std::path::{Path, PathBuf};

use geoview_types::cartesian::{Point2d, Rect};
use geoview_types::geo::Crs;
use geoview_types::Geom;

use crate::layer::{Feature, Layer, RasterLayer, VectorLayer};
use crate::source::{GeoTransform, MemoryRaster, VectorData};

/// Path in the temporary directory unique for the test process.
pub(crate) fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("geoview-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("failed to create test directory");
    dir.join(name)
}

/// Writes the text into a temporary file and returns its path.
pub(crate) fn write_geojson(name: &str, contents: &str) -> PathBuf {
    let path = temp_path(name);
    std::fs::write(&path, contents).expect("failed to write test file");
    path
}

/// Writes a single band `f32` GeoTIFF with a north-up georeference.
#[cfg(feature = "geotiff")]
pub(crate) fn write_geotiff(
    path: &Path,
    width: u32,
    height: u32,
    data: &[f32],
    origin: (f64, f64),
    pixel_size: f64,
    epsg: Option<u16>,
) {
    write_striped_geotiff(path, width, height, data, origin, pixel_size, epsg, None);
}

/// Same as [`write_geotiff`], but with the given number of rows in each strip.
#[cfg(feature = "geotiff")]
#[allow(clippy::too_many_arguments)]
pub(crate) fn write_striped_geotiff(
    path: &Path,
    width: u32,
    height: u32,
    data: &[f32],
    origin: (f64, f64),
    pixel_size: f64,
    epsg: Option<u16>,
    rows_per_strip: Option<u32>,
) {
    use tiff::encoder::{colortype, TiffEncoder};
    use tiff::tags::Tag;

    let file = std::fs::File::create(path).expect("failed to create test file");
    let mut encoder = TiffEncoder::new(file).expect("failed to create encoder");
    let mut image = encoder
        .new_image::<colortype::Gray32Float>(width, height)
        .expect("failed to create image");
    if let Some(rows) = rows_per_strip {
        image
            .rows_per_strip(rows)
            .expect("failed to set strip size");
    }

    let scale = [pixel_size, pixel_size, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, origin.0, origin.1, 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &scale[..])
        .expect("failed to write pixel scale");
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
        .expect("failed to write tiepoint");
    if let Some(code) = epsg {
        // version 1.1.0, one key: ProjectedCSTypeGeoKey
        let keys = [1u16, 1, 0, 1, 3072, 0, 1, code];
        image
            .encoder()
            .write_tag(Tag::GeoKeyDirectoryTag, &keys[..])
            .expect("failed to write geo keys");
    }

    image.write_data(data).expect("failed to write samples");
}

/// Valid raster layer with 10x10 samples increasing row by row, in WGS84.
pub(crate) fn raster_layer(name: &str, extent: Rect) -> Layer {
    let samples = (0..100).map(|v| v as f64).collect();
    raster_layer_from(name, 10, 10, extent, samples)
}

/// Valid raster layer with the given samples covering the extent, in WGS84.
pub(crate) fn raster_layer_from(
    name: &str,
    width: u32,
    height: u32,
    extent: Rect,
    samples: Vec<f64>,
) -> Layer {
    let geotransform = GeoTransform::north_up(
        extent.x_min(),
        extent.y_max(),
        extent.width() / width as f64,
        extent.height() / height as f64,
    );
    let dataset = MemoryRaster::new(width, height, geotransform)
        .with_band(samples)
        .expect("invalid sample count")
        .with_crs(Crs::WGS84);

    RasterLayer::from_dataset(name, "memory", Box::new(dataset))
        .expect("failed to attach dataset")
        .into()
}

/// Valid vector layer with a point feature at each position, in WGS84.
pub(crate) fn vector_layer_with_points(name: &str, points: &[(f64, f64)]) -> Layer {
    let features = points
        .iter()
        .map(|&(x, y)| Feature::from(Geom::Point(Point2d::new(x, y))))
        .collect();
    let data = VectorData::from_features(features, Some(Crs::WGS84));

    VectorLayer::from_data(name, "memory", data).into()
}

