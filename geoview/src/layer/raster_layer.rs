use std::path::PathBuf;

use geoview_types::cartesian::{Point2d, Rect};
use geoview_types::geo::Crs;

use super::LayerProperties;
use crate::error::GeoviewError;
use crate::source::{open_raster, BandInfo, GeoTransform, RasterDataset, SourceConfig};

/// Layer backed by a raster dataset.
///
/// The layer owns the dataset handle and forwards every sample read to it; no pixel data is kept
/// in the layer.
#[derive(Debug)]
pub struct RasterLayer {
    pub(crate) properties: LayerProperties,
    dataset: Option<Box<dyn RasterDataset>>,
    width: u32,
    height: u32,
    geotransform: Option<GeoTransform>,
    crs: Option<Crs>,
    extent: Option<Rect>,
    bands: Vec<BandInfo>,
}

impl RasterLayer {
    /// Creates a layer that is not loaded yet.
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            properties: LayerProperties::new(name, source),
            dataset: None,
            width: 0,
            height: 0,
            geotransform: None,
            crs: None,
            extent: None,
            bands: vec![],
        }
    }

    /// Creates a valid layer from an opened dataset.
    pub fn from_dataset(
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        dataset: Box<dyn RasterDataset>,
    ) -> Result<Self, GeoviewError> {
        let mut layer = Self::new(name, source);
        layer.attach(dataset)?;
        Ok(layer)
    }

    /// Opens the dataset with the reader matching the source file extension.
    pub fn load(&mut self, config: &SourceConfig) -> Result<(), GeoviewError> {
        if self.properties.valid {
            return Ok(());
        }

        let dataset = open_raster(&self.properties.source, config)?;
        self.attach(dataset)
    }

    fn attach(&mut self, dataset: Box<dyn RasterDataset>) -> Result<(), GeoviewError> {
        let bands = (1..=dataset.band_count())
            .map(|band| dataset.band_stats(band))
            .collect::<Result<Vec<_>, _>>()?;
        let geotransform = dataset.geotransform();

        self.width = dataset.width();
        self.height = dataset.height();
        self.extent = Some(geotransform.extent(self.width, self.height));
        self.geotransform = Some(geotransform);
        self.crs = dataset.projection();
        self.bands = bands;
        self.dataset = Some(dataset);
        self.properties.valid = true;

        log::info!(
            "Raster layer '{}' loaded: {}x{}, {} bands",
            self.properties.name,
            self.width,
            self.height,
            self.bands.len()
        );

        Ok(())
    }

    /// Coordinate system of the raster.
    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// World extent covered by the raster.
    pub fn extent(&self) -> Option<Rect> {
        self.extent
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bands.
    pub fn band_count(&self) -> u32 {
        self.bands.len() as u32
    }

    /// Pixel to world transformation.
    pub fn geotransform(&self) -> Option<GeoTransform> {
        self.geotransform
    }

    /// Metadata of all bands.
    pub fn bands(&self) -> &[BandInfo] {
        &self.bands
    }

    /// Reads a window of samples of the band (1-based) from the dataset.
    pub fn read_window(
        &self,
        band: u32,
        x_off: u32,
        y_off: u32,
        x_size: u32,
        y_size: u32,
    ) -> Result<Vec<f64>, GeoviewError> {
        self.dataset()?
            .read_window(band, x_off, y_off, x_size, y_size)
    }

    /// Reads all samples of the band.
    pub fn read_band(&self, band: u32) -> Result<Vec<f64>, GeoviewError> {
        self.read_window(band, 0, 0, self.width, self.height)
    }

    /// Value of the band at the world position, `None` outside of the raster or for nodata.
    pub fn value_at(&self, band: u32, position: Point2d) -> Result<Option<f64>, GeoviewError> {
        self.dataset()?.sample_at(band, position)
    }

    fn dataset(&self) -> Result<&dyn RasterDataset, GeoviewError> {
        self.dataset.as_deref().ok_or_else(|| {
            GeoviewError::RasterRead(format!("layer '{}' is not loaded", self.properties.name))
        })
    }
}
