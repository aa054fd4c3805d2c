use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use geoview_types::geo::Crs;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use super::{sample_range, validate_window, BandInfo, GeoTransform, RasterDataset, SourceConfig};
use crate::error::GeoviewError;

const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

type TiffDecoder = Decoder<BufReader<File>>;

/// GeoTIFF file opened for windowed reading.
///
/// Georeferencing is read from the `ModelTransformation` tag, or from `ModelTiepoint` and
/// `ModelPixelScale`. The EPSG code comes from the GeoKey directory. Only chunky (interleaved)
/// sample layout is supported.
///
/// The file stays open while the dataset lives. A window read decodes only the strips or tiles
/// that overlap the window. The dataset can be moved to another thread but not shared between
/// threads.
pub struct GeoTiffDataset {
    path: PathBuf,
    decoder: RefCell<TiffDecoder>,
    width: u32,
    height: u32,
    band_count: u32,
    geotransform: GeoTransform,
    crs: Option<Crs>,
    bands: Vec<BandInfo>,
}

impl Debug for GeoTiffDataset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoTiffDataset")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("band_count", &self.band_count)
            .field("geotransform", &self.geotransform)
            .field("crs", &self.crs)
            .field("bands", &self.bands)
            .finish_non_exhaustive()
    }
}

impl GeoTiffDataset {
    /// Opens the file and reads its metadata.
    pub fn open(path: &Path, config: &SourceConfig) -> Result<Self, GeoviewError> {
        let decoder = open_decoder(path).map_err(|err| GeoviewError::load(path, err))?;
        let mut dataset =
            Self::read_metadata(path, decoder).map_err(|err| GeoviewError::load(path, err))?;

        if config.compute_band_stats() {
            let ranges = (1..=dataset.band_count)
                .map(|band| {
                    dataset
                        .read_window(band, 0, 0, dataset.width, dataset.height)
                        .map(|samples| sample_range(&samples))
                })
                .collect::<Result<Vec<_>, _>>()?;
            for (band, range) in dataset.bands.iter_mut().zip(ranges) {
                band.min = range.map(|(min, _)| min);
                band.max = range.map(|(_, max)| max);
            }
        }

        log::debug!(
            "Opened GeoTIFF {} ({}x{}, {} bands, crs: {:?})",
            path.display(),
            dataset.width,
            dataset.height,
            dataset.band_count,
            dataset.crs.as_ref().map(|crs| crs.to_string())
        );

        Ok(dataset)
    }

    fn read_metadata(path: &Path, mut decoder: TiffDecoder) -> Result<Self, GeoviewError> {
        let (width, height) = decoder.dimensions()?;

        let planar = decoder
            .find_tag(Tag::PlanarConfiguration)?
            .map(|v| v.into_u32())
            .transpose()?
            .unwrap_or(1);
        if planar != 1 {
            return Err(GeoviewError::UnsupportedFormat(
                "planar GeoTIFF sample layout".into(),
            ));
        }

        let band_count = decoder
            .find_tag(Tag::SamplesPerPixel)?
            .map(|v| v.into_u32())
            .transpose()?
            .unwrap_or(1);

        let geo_keys = read_geo_keys(&mut decoder)?;
        let mut geotransform = read_geotransform(&mut decoder)?;
        if geo_key(&geo_keys, GT_RASTER_TYPE_KEY) == Some(RASTER_PIXEL_IS_POINT) {
            let c = &mut geotransform.0;
            c[0] -= 0.5 * (c[1] + c[2]);
            c[3] -= 0.5 * (c[4] + c[5]);
        }

        let crs = [PROJECTED_CS_TYPE_KEY, GEOGRAPHIC_TYPE_KEY]
            .iter()
            .filter_map(|key| geo_key(&geo_keys, *key))
            .find(|code| *code != 0 && *code != USER_DEFINED)
            .map(|code| Crs::from_epsg(code as u32));

        let nodata = decoder
            .find_tag(Tag::GdalNodata)?
            .map(|v| v.into_string())
            .transpose()?
            .and_then(|s| s.trim_matches(|c: char| c == '\0' || c.is_whitespace()).parse().ok());

        let bands = (1..=band_count)
            .map(|index| BandInfo {
                index,
                nodata,
                min: None,
                max: None,
            })
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            decoder: RefCell::new(decoder),
            width,
            height,
            band_count,
            geotransform,
            crs,
            bands,
        })
    }
}

impl RasterDataset for GeoTiffDataset {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn band_count(&self) -> u32 {
        self.band_count
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

        let stride = self.band_count as usize;
        let band_offset = (band - 1) as usize;
        let mut window = vec![f64::NAN; x_size as usize * y_size as usize];

        let mut decoder = self.decoder.try_borrow_mut().map_err(|_| {
            GeoviewError::RasterRead(format!("{} is already being read", self.path.display()))
        })?;
        let (chunk_width, chunk_height) = decoder.chunk_dimensions();
        if chunk_width == 0 || chunk_height == 0 {
            return Err(GeoviewError::RasterRead(format!(
                "invalid chunk size in {}",
                self.path.display()
            )));
        }
        let chunks_across = self.width.div_ceil(chunk_width);

        let (x_end, y_end) = (x_off + x_size, y_off + y_size);
        for chunk_row in y_off / chunk_height..=(y_end - 1) / chunk_height {
            for chunk_col in x_off / chunk_width..=(x_end - 1) / chunk_width {
                let index = chunk_row * chunks_across + chunk_col;
                let (data_width, data_height) = decoder.chunk_data_dimensions(index);
                let samples = decoder
                    .read_chunk(index)
                    .map_err(|err| GeoviewError::RasterRead(err.to_string()))
                    .and_then(into_samples)?;

                let (x0, y0) = (chunk_col * chunk_width, chunk_row * chunk_height);
                for row in y0.max(y_off)..(y0 + data_height).min(y_end) {
                    for col in x0.max(x_off)..(x0 + data_width).min(x_end) {
                        let source = ((row - y0) as usize * data_width as usize
                            + (col - x0) as usize)
                            * stride
                            + band_offset;
                        let target =
                            (row - y_off) as usize * x_size as usize + (col - x_off) as usize;
                        window[target] = samples.get(source).copied().unwrap_or(f64::NAN);
                    }
                }
            }
        }

        Ok(window)
    }

    fn band_stats(&self, band: u32) -> Result<BandInfo, GeoviewError> {
        self.bands
            .get((band as usize).wrapping_sub(1))
            .copied()
            .ok_or_else(|| GeoviewError::RasterRead(format!("band {band} does not exist")))
    }
}

fn open_decoder(path: &Path) -> Result<TiffDecoder, GeoviewError> {
    let file = File::open(path)?;
    Ok(Decoder::new(BufReader::new(file))?)
}

fn into_samples(decoded: DecodingResult) -> Result<Vec<f64>, GeoviewError> {
    #[allow(unreachable_patterns)]
    let samples = match decoded {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|s| s as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|s| s as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
        _ => {
            return Err(GeoviewError::RasterRead(
                "unsupported sample format".into(),
            ))
        }
    };

    Ok(samples)
}

fn read_geotransform(
    decoder: &mut TiffDecoder,
) -> Result<GeoTransform, GeoviewError> {
    if let Some(value) = decoder.find_tag(Tag::ModelTransformationTag)? {
        let m = value.into_f64_vec()?;
        if m.len() >= 8 {
            return Ok(GeoTransform([m[3], m[0], m[1], m[7], m[4], m[5]]));
        }
    }

    let tie_points = decoder
        .find_tag(Tag::ModelTiepointTag)?
        .map(|v| v.into_f64_vec())
        .transpose()?;
    let pixel_scale = decoder
        .find_tag(Tag::ModelPixelScaleTag)?
        .map(|v| v.into_f64_vec())
        .transpose()?;

    match (tie_points.as_deref(), pixel_scale.as_deref()) {
        (Some([i, j, _, x, y, ..]), Some([sx, sy, ..])) => Ok(GeoTransform([
            x - i * sx,
            *sx,
            0.0,
            y + j * sy,
            0.0,
            -sy,
        ])),
        _ => {
            log::warn!("GeoTIFF has no georeferencing, using pixel coordinates");
            Ok(GeoTransform([0.0, 1.0, 0.0, 0.0, 0.0, 1.0]))
        }
    }
}

fn read_geo_keys(decoder: &mut TiffDecoder) -> Result<Vec<u16>, GeoviewError> {
    Ok(decoder
        .find_tag(Tag::GeoKeyDirectoryTag)?
        .map(|v| v.into_u16_vec())
        .transpose()?
        .unwrap_or_default())
}

/// Value of a GeoKey stored directly in the directory. Keys stored in other tags are not
/// supported and are reported as missing.
fn geo_key(directory: &[u16], key: u16) -> Option<u16> {
    let count = *directory.get(3)? as usize;
    directory
        .get(4..)?
        .chunks_exact(4)
        .take(count)
        .find(|entry| entry[0] == key && entry[1] == 0)
        .map(|entry| entry[3])
}
