use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::TurbineSink;
use crate::geometry::Frame;

/// File name of the proposed-turbine layer inside the output workspace
pub const LAYER_FILE_NAME: &str = "ProposedTurbineLayer.geojson";

#[derive(Serialize)]
struct FeatureCollection<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    features: Vec<Feature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crs: Option<Crs<'a>>,
}

#[derive(Serialize)]
struct Crs<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    properties: CrsProperties<'a>,
}

#[derive(Serialize)]
struct CrsProperties<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    geometry: PointGeometry,
    properties: TurbineProperties,
}

#[derive(Serialize)]
struct PointGeometry {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: [f64; 2],
}

#[derive(Serialize)]
struct TurbineProperties {
    id: u64,
    elevation: f64,
    slope: f64,
}

/// Path of the turbine layer inside `workspace`
pub fn layer_path(workspace: &Path) -> PathBuf {
    workspace.join(LAYER_FILE_NAME)
}

/// Write the sink as a GeoJSON FeatureCollection of points.
///
/// Each feature carries the candidate `id`, `elevation` and `slope`.
/// An existing file at `path` is replaced.
pub fn write_geojson(path: &Path, sink: &TurbineSink) -> Result<()> {
    let features = sink
        .iter()
        .map(|turbine| Feature {
            kind: "Feature",
            geometry: PointGeometry {
                kind: "Point",
                coordinates: [turbine.position().x(), turbine.position().y()],
            },
            properties: TurbineProperties {
                id: turbine.site.id.0,
                elevation: turbine.site.elevation,
                slope: turbine.site.slope,
            },
        })
        .collect();

    // Projected layers keep their coordinates, so name the source reference
    let crs = match (sink.reference().frame, sink.reference().wkt.as_deref()) {
        (Frame::Projected(_), Some(wkt)) => Some(Crs {
            kind: "name",
            properties: CrsProperties { name: wkt },
        }),
        _ => None,
    };

    let collection = FeatureCollection {
        kind: "FeatureCollection",
        features,
        crs,
    };

    let file = File::create(path)
        .with_context(|| format!("Failed to create turbine layer: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &collection)
        .with_context(|| format!("Failed to write turbine layer: {}", path.display()))?;
    writer.flush()?;

    Ok(())
}

/// Create `workspace` if needed and write the layer into it
pub fn write_layer(workspace: &Path, sink: &TurbineSink) -> Result<PathBuf> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("Failed to create workspace: {}", workspace.display()))?;
    let path = layer_path(workspace);
    write_geojson(&path, sink)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CandidatePoint, SitedTurbine};
    use crate::geometry::{LinearUnit, SpatialReference};
    use geo::Point;
    use std::fs;
    use tempfile::tempdir;

    fn sink_with(ids: &[u64]) -> TurbineSink {
        let mut sink = TurbineSink::new(SpatialReference::projected(LinearUnit::Feet));
        for &id in ids {
            let site = CandidatePoint::new(id, Point::new(1000.0 * id as f64, 250.0), 512.5, 1.25);
            sink.append(SitedTurbine::new(site));
        }
        sink
    }

    #[test]
    fn test_write_geojson() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("turbines.geojson");

        write_geojson(&path, &sink_with(&[4, 9])).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        let features = json["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[1]["geometry"]["type"], "Point");
        assert_eq!(features[1]["geometry"]["coordinates"][0], 9000.0);
        assert_eq!(features[1]["properties"]["id"], 9);
        assert_eq!(features[1]["properties"]["elevation"], 512.5);
        assert_eq!(features[0]["properties"]["slope"], 1.25);
        assert!(json.get("crs").is_none());
    }

    #[test]
    fn test_write_layer_creates_workspace_and_overwrites() {
        let dir = tempdir().unwrap();
        let workspace = dir.path().join("out").join("site");

        let path = write_layer(&workspace, &sink_with(&[1, 2, 3])).unwrap();
        assert_eq!(path, workspace.join(LAYER_FILE_NAME));

        write_layer(&workspace, &sink_with(&[])).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(json["features"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_projected_wkt_is_named() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("turbines.geojson");
        let wkt =
            r#"PROJCS["NAD83 / Iowa North (ftUS)",UNIT["US survey foot",0.3048006096012192]]"#;
        let mut sink = TurbineSink::new(SpatialReference::from_wkt(wkt));
        sink.append(SitedTurbine::new(CandidatePoint::new(1, Point::new(0.0, 0.0), 1.0, 1.0)));

        write_geojson(&path, &sink).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["crs"]["properties"]["name"], wkt);
    }
}
