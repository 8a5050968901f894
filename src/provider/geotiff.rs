//! GeoTIFF reader for single-band DEM and slope rasters
//!
//! Cell geometry comes from the `ModelPixelScale` and `ModelTiepoint` tags,
//! NoData from `GDAL_NODATA`. The spatial reference is taken from a `.prj`
//! sidecar when present, otherwise from the GeoKey directory.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use super::raster::{cell_value, sidecar_reference};
use super::{Grid, ProviderError, ProviderResult};
use crate::geometry::{LinearUnit, SpatialReference};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE_KEY: u32 = 1024;
const GT_RASTER_TYPE_KEY: u32 = 1025;
const PROJ_LINEAR_UNITS_KEY: u32 = 3076;

const MODEL_TYPE_GEOGRAPHIC: u32 = 2;
const RASTER_PIXEL_IS_POINT: u32 = 2;
const LINEAR_UNIT_FOOT: u32 = 9002;
const LINEAR_UNIT_US_SURVEY_FOOT: u32 = 9003;

/// Inline values of the GeoKeys the reader understands
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct GeoKeys {
    model_type: Option<u32>,
    raster_type: Option<u32>,
    linear_units: Option<u32>,
}

impl GeoKeys {
    /// Parse a `GeoKeyDirectoryTag`: a 4-value header, then
    /// `[key, location, count, value]` entries
    fn parse(directory: &[u32]) -> Self {
        let mut keys = GeoKeys::default();
        for entry in directory.get(4..).unwrap_or_default().chunks_exact(4) {
            let [key, location, _count, value] = [entry[0], entry[1], entry[2], entry[3]];
            // Non-zero locations point into other tags
            if location != 0 {
                continue;
            }
            match key {
                GT_MODEL_TYPE_KEY => keys.model_type = Some(value),
                GT_RASTER_TYPE_KEY => keys.raster_type = Some(value),
                PROJ_LINEAR_UNITS_KEY => keys.linear_units = Some(value),
                _ => {}
            }
        }
        keys
    }

    fn pixel_is_point(&self) -> bool {
        self.raster_type == Some(RASTER_PIXEL_IS_POINT)
    }

    fn reference(&self) -> SpatialReference {
        if self.model_type == Some(MODEL_TYPE_GEOGRAPHIC) {
            return SpatialReference::geographic();
        }
        match self.linear_units {
            Some(LINEAR_UNIT_FOOT | LINEAR_UNIT_US_SURVEY_FOOT) => {
                SpatialReference::projected(LinearUnit::Feet)
            }
            _ => SpatialReference::projected(LinearUnit::Meters),
        }
    }
}

/// Lower-left corner and cell size of a north-up raster
fn georeference(
    scale: &[f64],
    tiepoint: &[f64],
    nrows: usize,
    pixel_is_point: bool,
) -> Result<((f64, f64), f64), String> {
    let [sx, sy, ..] = scale else {
        return Err(format!("ModelPixelScale has {} values, need 3", scale.len()));
    };
    let [i, j, _k, x, y, ..] = tiepoint else {
        return Err(format!("ModelTiepoint has {} values, need 6", tiepoint.len()));
    };
    if sx.is_nan() || *sx <= 0.0 || (sx - sy).abs() > sx * 1e-9 {
        return Err(format!("cells must be square, got {sx} x {sy}"));
    }

    let mut left = x - i * sx;
    let mut top = y + j * sy;
    if pixel_is_point {
        left -= sx / 2.0;
        top += sy / 2.0;
    }
    Ok(((left, top - nrows as f64 * sy), *sx))
}

fn samples_as_f64(image: DecodingResult) -> Option<Vec<f64>> {
    let values = match image {
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        _ => return None,
    };
    Some(values)
}

/// Read a single-band GeoTIFF raster
pub fn read_geotiff(path: &Path) -> ProviderResult<Grid> {
    let malformed = |detail: String| ProviderError::Format {
        path: path.to_path_buf(),
        what: "GeoTIFF",
        detail,
    };

    let file = File::open(path).map_err(|source| ProviderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(|e| malformed(e.to_string()))?;

    let (width, height) = decoder.dimensions().map_err(|e| malformed(e.to_string()))?;
    let (ncols, nrows) = (width as usize, height as usize);

    let mut f64_tag = |code: u16| -> ProviderResult<Option<Vec<f64>>> {
        decoder
            .find_tag(Tag::from_u16_exhaustive(code))
            .and_then(|value| value.map(|v| v.into_f64_vec()).transpose())
            .map_err(|e| malformed(e.to_string()))
    };
    let scale = f64_tag(MODEL_PIXEL_SCALE)?
        .ok_or_else(|| malformed("missing ModelPixelScale tag".into()))?;
    let tiepoint = f64_tag(MODEL_TIEPOINT)?
        .ok_or_else(|| malformed("missing ModelTiepoint tag".into()))?;

    let geo_keys = decoder
        .find_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY))
        .and_then(|value| value.map(|v| v.into_u32_vec()).transpose())
        .map_err(|e| malformed(e.to_string()))?
        .map(|directory| GeoKeys::parse(&directory));

    let nodata = match decoder
        .find_tag(Tag::from_u16_exhaustive(GDAL_NODATA))
        .and_then(|value| value.map(|v| v.into_string()).transpose())
        .map_err(|e| malformed(e.to_string()))?
    {
        Some(text) => {
            let text = text.trim_matches(char::from(0)).trim();
            let value = text
                .parse::<f64>()
                .map_err(|_| malformed(format!("invalid GDAL_NODATA {text:?}")))?;
            Some(value)
        }
        None => None,
    };

    let image = decoder.read_image().map_err(|e| malformed(e.to_string()))?;
    let samples = samples_as_f64(image)
        .ok_or_else(|| malformed("unsupported sample format".into()))?;
    let expected = ncols
        .checked_mul(nrows)
        .ok_or_else(|| malformed(format!("{ncols} x {nrows} cells overflows the grid size")))?;
    if samples.len() != expected {
        return Err(malformed(format!(
            "expected {} single-band samples, found {}",
            expected,
            samples.len()
        )));
    }

    let keys = geo_keys.unwrap_or_default();
    let (lower_left, cell_size) =
        georeference(&scale, &tiepoint, nrows, keys.pixel_is_point()).map_err(malformed)?;

    let reference = match sidecar_reference(path)? {
        Some(reference) => reference,
        None if geo_keys.is_some() => keys.reference(),
        None => {
            tracing::debug!(
                "No GeoKeys or projection file for {:?}, assuming projected meters",
                path
            );
            SpatialReference::default()
        }
    };

    let values = samples.into_iter().map(|v| cell_value(v, nodata)).collect();
    Grid::new(ncols, nrows, lower_left, cell_size, values, reference)
}
