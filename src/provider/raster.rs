use std::path::Path;

use super::{Grid, ProviderError, ProviderResult, read_ascii_grid, read_geotiff};
use crate::geometry::SpatialReference;

/// Read a DEM or slope raster, choosing the format by file extension.
///
/// `.tif`/`.tiff` are read as GeoTIFF, `.asc`/`.txt` as ESRI ASCII grids.
pub fn read_raster(path: &Path) -> ProviderResult<Grid> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("tif" | "tiff") => read_geotiff(path),
        Some("asc" | "txt") => read_ascii_grid(path),
        _ => Err(ProviderError::Format {
            path: path.to_path_buf(),
            what: "raster",
            detail: "unsupported extension, expected .tif, .tiff, .asc or .txt".into(),
        }),
    }
}

/// Spatial reference from a `.prj` file next to `path`, if there is one
pub(crate) fn sidecar_reference(path: &Path) -> ProviderResult<Option<SpatialReference>> {
    let prj = path.with_extension("prj");
    if !prj.exists() {
        return Ok(None);
    }
    let wkt = std::fs::read_to_string(&prj).map_err(|source| ProviderError::Io {
        path: prj.clone(),
        source,
    })?;
    Ok(Some(SpatialReference::from_wkt(&wkt)))
}

/// A raw cell value as data, `None` for NoData and non-finite values
pub(crate) fn cell_value(value: f64, nodata: Option<f64>) -> Option<f64> {
    match nodata {
        _ if !value.is_finite() => None,
        Some(nodata) if value == nodata => None,
        _ => Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cell_value() {
        assert_eq!(cell_value(12.5, Some(-9999.0)), Some(12.5));
        assert_eq!(cell_value(-9999.0, Some(-9999.0)), None);
        assert_eq!(cell_value(f64::NAN, None), None);
        assert_eq!(cell_value(f64::INFINITY, Some(-9999.0)), None);
    }

    #[test]
    fn test_dispatch_by_extension() {
        let dir = tempdir().unwrap();
        let asc = dir.path().join("DEM.ASC");
        fs::write(&asc, "ncols 1\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n7\n").unwrap();
        assert_eq!(read_raster(&asc).unwrap().value(0, 0), Some(7.0));

        let img = dir.path().join("dem.img");
        fs::write(&img, "").unwrap();
        assert!(matches!(read_raster(&img), Err(ProviderError::Format { .. })));

        // Not a TIFF, but routed to the TIFF reader
        let tif = dir.path().join("dem.tif");
        fs::write(&tif, "ncols 1").unwrap();
        assert!(matches!(read_raster(&tif), Err(ProviderError::Format { what: "GeoTIFF", .. })));
    }
}
