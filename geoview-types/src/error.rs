//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error)]
pub enum GeoviewTypesError {
    /// Geometry conversion error.
    #[error("invalid input geometry: {0}")]
    Conversion(String),
    /// The CRS definition could not be understood.
    #[error("unsupported CRS definition: {0}")]
    UnsupportedCrs(String),
}
