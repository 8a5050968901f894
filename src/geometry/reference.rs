use serde::{Deserialize, Serialize};

/// International feet per meter
pub const METERS_TO_FEET: f64 = 3.2808399;

/// Linear unit of a projected coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinearUnit {
    Meters,
    Feet,
}

impl LinearUnit {
    /// Convert a length in this unit to meters
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            LinearUnit::Meters => value,
            LinearUnit::Feet => value / METERS_TO_FEET,
        }
    }

    /// Convert a length in meters to this unit
    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            LinearUnit::Meters => meters,
            LinearUnit::Feet => meters * METERS_TO_FEET,
        }
    }
}

/// How raster and vector coordinates are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// x = longitude, y = latitude, both in degrees
    Geographic,
    /// Planar x/y in the given linear unit
    Projected(LinearUnit),
}

/// Spatial reference of a layer
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialReference {
    pub frame: Frame,
    /// Well-known text the reference was read from, if any
    pub wkt: Option<String>,
}

impl SpatialReference {
    pub fn projected(unit: LinearUnit) -> Self {
        Self {
            frame: Frame::Projected(unit),
            wkt: None,
        }
    }

    pub fn geographic() -> Self {
        Self {
            frame: Frame::Geographic,
            wkt: None,
        }
    }

    /// Classify a `.prj` WKT string.
    ///
    /// A `PROJCS` with a foot-based `UNIT` is projected feet, any other
    /// `PROJCS` is projected meters and a bare `GEOGCS` is geographic.
    pub fn from_wkt(wkt: &str) -> Self {
        let upper = wkt.to_ascii_uppercase();
        let frame = if upper.contains("PROJCS") {
            // The last UNIT in a PROJCS belongs to the projection, not the datum
            let unit_clause = upper.rsplit("UNIT[").next().unwrap_or("");
            if unit_clause.contains("FOOT") || unit_clause.contains("FEET") {
                Frame::Projected(LinearUnit::Feet)
            } else {
                Frame::Projected(LinearUnit::Meters)
            }
        } else if upper.contains("GEOGCS") {
            Frame::Geographic
        } else {
            Frame::Projected(LinearUnit::Meters)
        };

        Self {
            frame,
            wkt: Some(wkt.trim().to_string()),
        }
    }
}

impl Default for SpatialReference {
    fn default() -> Self {
        Self::projected(LinearUnit::Meters)
    }
}

/// A length together with its unit, as passed to buffering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    pub value: f64,
    pub unit: LinearUnit,
}

impl Distance {
    pub fn feet(value: f64) -> Self {
        Self {
            value,
            unit: LinearUnit::Feet,
        }
    }

    pub fn in_meters(&self) -> f64 {
        self.unit.to_meters(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversion() {
        assert!((LinearUnit::Feet.to_meters(METERS_TO_FEET) - 1.0).abs() < 1e-12);
        assert!((LinearUnit::Feet.from_meters(44.0) - 144.356).abs() < 0.001);
        assert!((Distance::feet(6000.0).in_meters() - 1828.8).abs() < 1e-3);
    }

    #[test]
    fn test_from_wkt() {
        let feet = concat!(
            r#"PROJCS["NAD_1983_StatePlane",GEOGCS["GCS_North_American_1983","#,
            r#"UNIT["Degree",0.0174532925199433]],PROJECTION["Lambert_Conformal_Conic"],"#,
            r#"UNIT["Foot_US",0.3048006096012192]]"#
        );
        assert_eq!(
            SpatialReference::from_wkt(feet).frame,
            Frame::Projected(LinearUnit::Feet)
        );

        let utm = concat!(
            r#"PROJCS["WGS_1984_UTM_Zone_13N",GEOGCS["GCS_WGS_1984","#,
            r#"UNIT["Degree",0.0174532925199433]],UNIT["Meter",1.0]]"#
        );
        assert_eq!(
            SpatialReference::from_wkt(utm).frame,
            Frame::Projected(LinearUnit::Meters)
        );

        let geographic =
            r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984"],UNIT["Degree",0.0174532925199433]]"#;
        assert_eq!(SpatialReference::from_wkt(geographic).frame, Frame::Geographic);
    }
}
