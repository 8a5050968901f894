//! ESRI ASCII grid reader
//!
//! ```text
//! ncols         4
//! nrows         3
//! xllcorner     500000.0
//! yllcorner     4200000.0
//! cellsize      10.0
//! NODATA_value  -9999
//! 1 2 3 4
//! ...
//! ```
//!
//! `xllcenter`/`yllcenter` are accepted in place of the corner keys. The
//! spatial reference comes from a `.prj` sidecar when one exists.

use std::path::Path;

use super::raster::{cell_value, sidecar_reference};
use super::{Grid, ProviderError, ProviderResult};
use crate::geometry::SpatialReference;

const HEADER_KEYS: usize = 6;

/// Read a grid and its `.prj` sidecar
pub fn read_ascii_grid(path: &Path) -> ProviderResult<Grid> {
    let contents = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reference = sidecar_reference(path)?.unwrap_or_else(|| {
        tracing::debug!("No projection file next to {:?}, assuming projected meters", path);
        SpatialReference::default()
    });

    parse_ascii_grid(&contents, reference, path)
}

#[derive(Default)]
struct Header {
    ncols: Option<usize>,
    nrows: Option<usize>,
    x: Option<(f64, bool)>,
    y: Option<(f64, bool)>,
    cell_size: Option<f64>,
    nodata: Option<f64>,
}

pub fn parse_ascii_grid(
    contents: &str,
    reference: SpatialReference,
    path: &Path,
) -> ProviderResult<Grid> {
    let malformed = |detail: String| ProviderError::Format {
        path: path.to_path_buf(),
        what: "ASCII grid",
        detail,
    };

    let mut header = Header::default();
    let mut lines = contents.lines().peekable();
    let mut header_lines = 0;

    while header_lines < HEADER_KEYS {
        let Some(line) = lines.peek() else { break };
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            break;
        };
        if key.parse::<f64>().is_ok() {
            break;
        }

        let key = key.to_ascii_lowercase();
        let number: f64 = value
            .parse()
            .map_err(|_| malformed(format!("invalid value {value:?} for {key}")))?;
        let count = || {
            if number >= 0.0 && number.fract() == 0.0 {
                Ok(number as usize)
            } else {
                Err(malformed(format!("{key} must be a whole number, got {value}")))
            }
        };

        match key.as_str() {
            "ncols" => header.ncols = Some(count()?),
            "nrows" => header.nrows = Some(count()?),
            "xllcorner" => header.x = Some((number, false)),
            "xllcenter" => header.x = Some((number, true)),
            "yllcorner" => header.y = Some((number, false)),
            "yllcenter" => header.y = Some((number, true)),
            "cellsize" => header.cell_size = Some(number),
            "nodata_value" => header.nodata = Some(number),
            other => return Err(malformed(format!("unknown header key {other:?}"))),
        }
        lines.next();
        header_lines += 1;
    }

    let ncols = header.ncols.ok_or_else(|| malformed("missing ncols".into()))?;
    let nrows = header.nrows.ok_or_else(|| malformed("missing nrows".into()))?;
    let cell_size = header.cell_size.ok_or_else(|| malformed("missing cellsize".into()))?;
    let (x, x_center) = header.x.ok_or_else(|| malformed("missing xllcorner".into()))?;
    let (y, y_center) = header.y.ok_or_else(|| malformed("missing yllcorner".into()))?;
    let xll = if x_center { x - cell_size / 2.0 } else { x };
    let yll = if y_center { y - cell_size / 2.0 } else { y };

    let expected = ncols
        .checked_mul(nrows)
        .ok_or_else(|| malformed(format!("{ncols} x {nrows} cells overflows the grid size")))?;

    let mut values = Vec::new();
    for token in lines.flat_map(str::split_whitespace) {
        if values.len() == expected {
            return Err(malformed(format!("more than {expected} cell values")));
        }
        let v: f64 = token
            .parse()
            .map_err(|_| malformed(format!("invalid cell value {token:?}")))?;
        values.push(cell_value(v, header.nodata));
    }

    if values.len() != expected {
        return Err(malformed(format!(
            "expected {} cell values, found {}",
            expected,
            values.len()
        )));
    }

    Grid::new(ncols, nrows, (xll, yll), cell_size, values, reference)
}
