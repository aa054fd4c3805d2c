use std::path::Path;

use geoview_types::geo::Crs;

use super::{
    sample_range, validate_window, BandInfo, GeoTransform, RasterDataset, VectorData, VectorSource,
};
use crate::error::GeoviewError;
use crate::layer::Feature;

/// Raster with all samples held in memory.
///
/// Used for generated data and in tests in place of a file-backed dataset.
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    width: u32,
    height: u32,
    geotransform: GeoTransform,
    crs: Option<Crs>,
    bands: Vec<Vec<f64>>,
    nodata: Option<f64>,
}

impl MemoryRaster {
    /// Creates a raster without bands.
    pub fn new(width: u32, height: u32, geotransform: GeoTransform) -> Self {
        Self {
            width,
            height,
            geotransform,
            crs: None,
            bands: vec![],
            nodata: None,
        }
    }

    /// Adds a band. The samples must be given row by row and there must be exactly
    /// `width * height` of them.
    pub fn with_band(mut self, samples: Vec<f64>) -> Result<Self, GeoviewError> {
        let expected = self.width as usize * self.height as usize;
        if samples.len() != expected {
            return Err(GeoviewError::RasterRead(format!(
                "band has {} samples, expected {expected}",
                samples.len()
            )));
        }

        self.bands.push(samples);
        Ok(self)
    }

    /// Sets the coordinate system of the raster.
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    /// Sets the nodata value reported for all bands.
    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }
}

impl RasterDataset for MemoryRaster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn band_count(&self) -> u32 {
        self.bands.len() as u32
    }

    fn geotransform(&self) -> GeoTransform {
        self.geotransform
    }

    fn projection(&self) -> Option<Crs> {
        self.crs.clone()
    }

    fn read_window(
        &self,
        band: u32,
        x_off: u32,
        y_off: u32,
        x_size: u32,
        y_size: u32,
    ) -> Result<Vec<f64>, GeoviewError> {
        validate_window(self, band, x_off, y_off, x_size, y_size)?;

        let samples = &self.bands[band as usize - 1];
        let width = self.width as usize;
        let (x_off, x_size) = (x_off as usize, x_size as usize);
        Ok((y_off..y_off + y_size)
            .flat_map(|row| {
                let start = row as usize * width + x_off;
                samples[start..start + x_size].iter().copied()
            })
            .collect())
    }

    fn band_stats(&self, band: u32) -> Result<BandInfo, GeoviewError> {
        let samples = (band as usize)
            .checked_sub(1)
            .and_then(|i| self.bands.get(i))
            .ok_or_else(|| GeoviewError::RasterRead(format!("band {band} does not exist")))?;
        let range = sample_range(samples);

        Ok(BandInfo {
            index: band,
            nodata: self.nodata,
            min: range.map(|(min, _)| min),
            max: range.map(|(_, max)| max),
        })
    }
}

/// Vector source that returns a fixed set of features regardless of the path.
#[derive(Debug, Clone)]
pub struct MemoryVectorSource {
    features: Vec<Feature>,
    crs: Option<Crs>,
}

impl MemoryVectorSource {
    /// Creates a source with the given features.
    pub fn new(features: Vec<Feature>, crs: Option<Crs>) -> Self {
        Self { features, crs }
    }
}

impl VectorSource for MemoryVectorSource {
    fn open(&self, _path: &Path) -> Result<VectorData, GeoviewError> {
        Ok(VectorData::from_features(
            self.features.clone(),
            self.crs.clone(),
        ))
    }
}
