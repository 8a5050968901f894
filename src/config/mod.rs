use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::geometry::METERS_TO_FEET;

/// Default siting parameters.
///
/// Lengths attached to the turbine (hub height, blade length) are meters,
/// ray and zone distances are feet, slope is percent and the elevation
/// limit is in DEM units.
pub mod defaults {
    pub const MIN_TOTAL_MW: f64 = 90.0;
    pub const WIND_BEARING_DEG: f64 = 270.0;
    pub const HUB_HEIGHT: f64 = 80.0;
    pub const BLADE_LENGTH: f64 = 44.0;
    pub const TURBINE_MW: f64 = 3.0;
    pub const SLOPE_THRESHOLD: f64 = 2.0;
    pub const ELEVATION_BUFFER_LIMIT: f64 = 1000.0;
    pub const ZONE_BUFFER_FT: f64 = 6000.0;
    pub const RAY_INTERVAL_FT: f64 = 328.0;
    pub const RAY_LIMIT_FT: f64 = 2297.0;
    pub const SITE_BUFFER_FACTOR: f64 = 10.0;
    pub const CORRIDOR_BUFFER_FACTOR: f64 = 6.0;
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("ray limit {limit} ft leaves no samples at an interval of {interval} ft")]
    EmptyRay { interval: f64, limit: f64 },
    #[error("missing input: {0}")]
    MissingInput(&'static str),
}

fn default_min_total_mw() -> f64 {
    defaults::MIN_TOTAL_MW
}
fn default_wind_bearing_deg() -> f64 {
    defaults::WIND_BEARING_DEG
}
fn default_hub_height() -> f64 {
    defaults::HUB_HEIGHT
}
fn default_blade_length() -> f64 {
    defaults::BLADE_LENGTH
}
fn default_turbine_mw() -> f64 {
    defaults::TURBINE_MW
}
fn default_slope_threshold() -> f64 {
    defaults::SLOPE_THRESHOLD
}
fn default_elevation_buffer_limit() -> f64 {
    defaults::ELEVATION_BUFFER_LIMIT
}
fn default_zone_buffer_ft() -> f64 {
    defaults::ZONE_BUFFER_FT
}
fn default_ray_interval_ft() -> f64 {
    defaults::RAY_INTERVAL_FT
}
fn default_ray_limit_ft() -> f64 {
    defaults::RAY_LIMIT_FT
}
fn default_site_buffer_factor() -> f64 {
    defaults::SITE_BUFFER_FACTOR
}
fn default_corridor_buffer_factor() -> f64 {
    defaults::CORRIDOR_BUFFER_FACTOR
}

/// Tunables of one siting run
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SitingConfig {
    #[serde(default = "default_min_total_mw")]
    pub min_total_mw: f64,
    #[serde(default = "default_wind_bearing_deg")]
    pub wind_bearing_deg: f64,
    #[serde(default = "default_hub_height")]
    pub hub_height: f64,
    /// Blade length, also the unit of the exclusion buffers
    #[serde(default = "default_blade_length")]
    pub blade_length: f64,
    #[serde(default = "default_turbine_mw")]
    pub turbine_mw: f64,
    #[serde(default = "default_slope_threshold")]
    pub slope_threshold: f64,
    #[serde(default = "default_elevation_buffer_limit")]
    pub elevation_buffer_limit: f64,
    #[serde(default = "default_zone_buffer_ft")]
    pub zone_buffer_ft: f64,
    #[serde(default = "default_ray_interval_ft")]
    pub ray_interval_ft: f64,
    #[serde(default = "default_ray_limit_ft")]
    pub ray_limit_ft: f64,
    #[serde(default = "default_site_buffer_factor")]
    pub site_buffer_factor: f64,
    #[serde(default = "default_corridor_buffer_factor")]
    pub corridor_buffer_factor: f64,
}

impl Default for SitingConfig {
    fn default() -> Self {
        Self {
            min_total_mw: default_min_total_mw(),
            wind_bearing_deg: default_wind_bearing_deg(),
            hub_height: default_hub_height(),
            blade_length: default_blade_length(),
            turbine_mw: default_turbine_mw(),
            slope_threshold: default_slope_threshold(),
            elevation_buffer_limit: default_elevation_buffer_limit(),
            zone_buffer_ft: default_zone_buffer_ft(),
            ray_interval_ft: default_ray_interval_ft(),
            ray_limit_ft: default_ray_limit_ft(),
            site_buffer_factor: default_site_buffer_factor(),
            corridor_buffer_factor: default_corridor_buffer_factor(),
        }
    }
}

impl SitingConfig {
    /// Smallest boundary region (square meters) able to host `min_total_mw`
    pub fn min_study_area(&self) -> f64 {
        self.blade_length * self.blade_length
            * std::f64::consts::PI
            * (self.min_total_mw / self.turbine_mw)
    }

    /// Blade length expressed in feet, the unit of both exclusion buffers
    pub fn unit_buffer_ft(&self) -> f64 {
        self.blade_length * METERS_TO_FEET
    }

    pub fn site_buffer_ft(&self) -> f64 {
        self.unit_buffer_ft() * self.site_buffer_factor
    }

    pub fn corridor_buffer_ft(&self) -> f64 {
        self.unit_buffer_ft() * self.corridor_buffer_factor
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("turbine_mw", self.turbine_mw),
            ("blade_length", self.blade_length),
            ("ray_interval_ft", self.ray_interval_ft),
            ("zone_buffer_ft", self.zone_buffer_ft),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        let non_negative = [
            ("min_total_mw", self.min_total_mw),
            ("hub_height", self.hub_height),
            ("slope_threshold", self.slope_threshold),
            ("elevation_buffer_limit", self.elevation_buffer_limit),
            ("site_buffer_factor", self.site_buffer_factor),
            ("corridor_buffer_factor", self.corridor_buffer_factor),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.ray_limit_ft <= self.ray_interval_ft {
            return Err(ConfigError::EmptyRay {
                interval: self.ray_interval_ft,
                limit: self.ray_limit_ft,
            });
        }

        Ok(())
    }
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

/// Limits applied to every geospatial backend call
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts for a call that failed with a retryable error
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Input layers and output workspace
#[derive(Debug, Deserialize, Default, Clone)]
pub struct InputConfig {
    #[serde(default)]
    pub dem: Option<PathBuf>,
    #[serde(default)]
    pub slope: Option<PathBuf>,
    #[serde(default)]
    pub boundary: Option<PathBuf>,
    #[serde(default)]
    pub workspace: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub inputs: InputConfig,
    #[serde(default)]
    pub siting: SitingConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub verbose: bool,
}

impl FileConfig {
    pub fn load() -> Option<Self> {
        let config_paths = get_config_paths();

        for path in config_paths {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {:?}: {}", path, e);
                    }
                }
            }
        }
        None
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("windsite.toml"));
    paths.push(PathBuf::from(".windsite.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("windsite").join("config.toml"));
        paths.push(config_dir.join("windsite.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".windsite.toml"));
    }

    paths
}
