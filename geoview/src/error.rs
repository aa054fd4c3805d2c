//! Error types used by the crate.

use std::path::PathBuf;

use geoview_types::error::GeoviewTypesError;
use thiserror::Error;

/// Geoview error type.
#[derive(Debug, Error)]
pub enum GeoviewError {
    /// A data source could not be opened or parsed. The layer is not added.
    #[error("failed to load '{path}': {reason}")]
    Load {
        /// Path of the source.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },
    /// A layer with the same name is already registered.
    #[error("layer '{0}' already exists")]
    DuplicateName(String),
    /// A single feature could not be drawn.
    #[error("failed to draw feature: {0}")]
    GeometryDraw(String),
    /// Raster samples could not be read.
    #[error("failed to read raster: {0}")]
    RasterRead(String),
    /// Item not found.
    #[error("'{0}' not found")]
    NotFound(String),
    /// The file type cannot be read by any of the available sources.
    #[error("unsupported data format: {0}")]
    UnsupportedFormat(String),
    /// Error reading/writing data to the FS.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Image encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    /// TIFF decoding error.
    #[cfg(feature = "geotiff")]
    #[error("tiff error: {0}")]
    Tiff(#[from] tiff::TiffError),
    /// GeoJSON parsing error.
    #[cfg(feature = "geojson")]
    #[error("geojson error: {0}")]
    GeoJson(#[from] geojson::Error),
    /// Geometry or CRS conversion error.
    #[error(transparent)]
    Types(#[from] GeoviewTypesError),
}

impl GeoviewError {
    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
