use geo::{LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use std::path::Path;

use super::{ProviderError, ProviderResult};

type Ring = Vec<Vec<f64>>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Document {
    FeatureCollection { features: Vec<Feature> },
    Feature { geometry: Option<Geometry> },
    Polygon { coordinates: Vec<Ring> },
    MultiPolygon { coordinates: Vec<Vec<Ring>> },
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon {
        coordinates: Vec<Ring>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Ring>>,
    },
    #[serde(other)]
    Unsupported,
}

/// Read wind-farm boundary polygons from a GeoJSON file.
///
/// Accepts a FeatureCollection, a single Feature or a bare (Multi)Polygon.
/// Non-polygon features are skipped.
pub fn read_boundary(path: &Path) -> ProviderResult<MultiPolygon<f64>> {
    let contents = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_boundary(&contents, path)
}

pub fn parse_boundary(contents: &str, path: &Path) -> ProviderResult<MultiPolygon<f64>> {
    let malformed = |detail: String| ProviderError::Format {
        path: path.to_path_buf(),
        what: "GeoJSON boundary",
        detail,
    };

    let document: Document =
        serde_json::from_str(contents).map_err(|e| malformed(e.to_string()))?;

    let geometries = match document {
        Document::FeatureCollection { features } => {
            features.into_iter().filter_map(|f| f.geometry).collect()
        }
        Document::Feature { geometry } => geometry.into_iter().collect(),
        Document::Polygon { coordinates } => vec![Geometry::Polygon { coordinates }],
        Document::MultiPolygon { coordinates } => vec![Geometry::MultiPolygon { coordinates }],
    };

    let mut polygons = Vec::new();
    for geometry in geometries {
        match geometry {
            Geometry::Polygon { coordinates } => {
                polygons.push(to_polygon(coordinates).map_err(malformed)?)
            }
            Geometry::MultiPolygon { coordinates } => {
                for rings in coordinates {
                    polygons.push(to_polygon(rings).map_err(malformed)?);
                }
            }
            Geometry::Unsupported => {
                tracing::debug!("Skipping non-polygon boundary feature in {:?}", path)
            }
        }
    }

    Ok(MultiPolygon::new(polygons))
}

fn to_ring(ring: Ring) -> Result<LineString<f64>, String> {
    if ring.len() < 4 {
        return Err(format!("ring has {} positions, need at least 4", ring.len()));
    }
    ring.into_iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok((*x, *y)),
            _ => Err(format!("position {position:?} has fewer than 2 coordinates")),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::from)
}

fn to_polygon(rings: Vec<Ring>) -> Result<Polygon<f64>, String> {
    let mut rings = rings.into_iter();
    let exterior = rings.next().ok_or("polygon has no rings")?;
    let interiors = rings.map(to_ring).collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(to_ring(exterior)?, interiors))
}
