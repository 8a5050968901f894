use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use windsite::config::{ConfigError, FileConfig, SitingConfig};
use windsite::geometry::SpatialReference;
use windsite::output::{TurbineSink, write_layer};
use windsite::provider::{GridProvider, read_boundary, read_raster};
use windsite::siting::{CancelFlag, SitingJob};

/// Select wind-turbine sites from a DEM, a slope raster and a boundary
///
/// Examples:
///   # Site turbines with the default 3 MW / 44 m blade turbine
///   windsite --dem dem.tif --slope slope.tif --boundary farm.geojson -o out
///
///   # ESRI ASCII grids, wind from the south-west, 100 MW target
///   windsite --dem dem.asc --slope slope.asc --boundary farm.geojson \
///       --wind-bearing 225 --min-mw 100
///
///   # Use a config file
///   windsite --config my-farm.toml
#[derive(Parser, Debug)]
#[command(name = "windsite")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches windsite.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Elevation raster (GeoTIFF or ESRI ASCII grid)
    #[arg(long)]
    dem: Option<PathBuf>,

    /// Slope raster in percent (GeoTIFF or ESRI ASCII grid)
    #[arg(long)]
    slope: Option<PathBuf>,

    /// Wind-farm boundary polygons (GeoJSON)
    #[arg(long)]
    boundary: Option<PathBuf>,

    /// Output workspace for ProposedTurbineLayer.geojson
    #[arg(short = 'o', long)]
    workspace: Option<PathBuf>,

    /// Treat raster coordinates as longitude/latitude degrees
    #[arg(long)]
    geographic: bool,

    /// Minimum total farm output in MW
    #[arg(long)]
    min_mw: Option<f64>,

    /// Direction the wind blows from, degrees clockwise from north
    #[arg(long)]
    wind_bearing: Option<f64>,

    /// Hub height in meters
    #[arg(long)]
    hub_height: Option<f64>,

    /// Blade length in meters
    #[arg(long)]
    blade_length: Option<f64>,

    /// Rated output of one turbine in MW
    #[arg(long)]
    turbine_mw: Option<f64>,

    /// Maximum safe slope in percent
    #[arg(long)]
    slope_threshold: Option<f64>,

    /// Maximum elevation range inside the zone buffer
    #[arg(long)]
    elevation_limit: Option<f64>,

    /// Per-call timeout for raster operations in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Attempts per provider call before giving up
    #[arg(long)]
    retries: Option<u32>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    let file_config = resolve_file_config(args.config.as_deref())?;

    let verbose = args.verbose || file_config.verbose;
    let filter = if verbose { "windsite=debug" } else { "windsite=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let siting = apply_overrides(file_config.siting.clone(), &args);
    siting.validate().context("Invalid siting configuration")?;

    let mut provider_config = file_config.provider.clone();
    if let Some(timeout) = args.timeout {
        provider_config.timeout_secs = timeout;
    }
    if let Some(retries) = args.retries {
        provider_config.max_retries = retries;
    }

    let inputs = &file_config.inputs;
    let dem_path = args
        .dem
        .clone()
        .or_else(|| inputs.dem.clone())
        .ok_or(ConfigError::MissingInput("--dem"))?;
    let slope_path = args
        .slope
        .clone()
        .or_else(|| inputs.slope.clone())
        .ok_or(ConfigError::MissingInput("--slope"))?;
    let boundary_path = args
        .boundary
        .clone()
        .or_else(|| inputs.boundary.clone())
        .ok_or(ConfigError::MissingInput("--boundary"))?;
    let workspace = args
        .workspace
        .clone()
        .or_else(|| inputs.workspace.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    println!("windsite - Wind Turbine Site Selection");
    println!("======================================");
    println!();

    if verbose {
        println!("Configuration:");
        println!("  DEM: {}", dem_path.display());
        println!("  Slope: {}", slope_path.display());
        println!("  Boundary: {}", boundary_path.display());
        println!("  Workspace: {}", workspace.display());
        println!("  Wind bearing: {}°", siting.wind_bearing_deg);
        println!(
            "  Turbine: {} MW, hub {} m, blade {} m",
            siting.turbine_mw, siting.hub_height, siting.blade_length
        );
        println!("  Minimum study area: {:.0} m²", siting.min_study_area());
        println!("  Site buffer: {:.0} ft", siting.site_buffer_ft());
        println!("  Corridor buffer: {:.0} ft", siting.corridor_buffer_ft());
        println!(
            "  Provider: {}s timeout, {} attempts",
            provider_config.timeout_secs, provider_config.max_retries
        );
        println!();
    }

    let spinner = create_spinner("Loading terrain layers...");
    let start = Instant::now();
    let mut dem = read_raster(&dem_path)
        .with_context(|| format!("Failed to read DEM: {}", dem_path.display()))?;
    let mut slope = read_raster(&slope_path)
        .with_context(|| format!("Failed to read slope raster: {}", slope_path.display()))?;
    if args.geographic {
        dem = dem.with_reference(SpatialReference::geographic());
        slope = slope.with_reference(SpatialReference::geographic());
    }
    let boundary = read_boundary(&boundary_path)
        .with_context(|| format!("Failed to read boundary: {}", boundary_path.display()))?;
    if boundary.0.is_empty() {
        bail!("No boundary polygons found in {}", boundary_path.display());
    }
    spinner.finish_with_message(format!(
        "Loaded {}x{} DEM, {} boundary polygons [{:.1}s]",
        dem.ncols(),
        dem.nrows(),
        boundary.0.len(),
        start.elapsed().as_secs_f32()
    ));

    let reference = dem.reference().clone();
    let mut sink = TurbineSink::new(reference.clone());
    let layer = write_layer(&workspace, &sink).context("Failed to create turbine layer")?;

    let provider = GridProvider::new(reference, Duration::from_secs(provider_config.timeout_secs));
    let job = SitingJob {
        provider: &provider,
        dem: &dem,
        slope: &slope,
        boundary: &boundary,
        config: &siting,
        retry: &provider_config,
    };

    let bar = create_progress_bar();
    let result = job.run(&mut sink, &CancelFlag::new(), |progress| {
        bar.set_length(progress.total as u64);
        bar.set_position(progress.processed as u64);
        bar.set_message(format!(
            "{} sited, {} disqualified",
            progress.sited, progress.disqualified
        ));
    });

    // Turbines sited before a failure are still written
    write_layer(&workspace, &sink).context("Failed to write turbine layer")?;

    let report = match result {
        Ok(report) => {
            bar.finish_with_message(format!(
                "Sited {} turbines [{:.1}s]",
                report.progress.sited,
                report.elapsed.as_secs_f32()
            ));
            report
        }
        Err(err) => {
            bar.abandon_with_message(format!("Stopped: {}", err.progress()));
            if !sink.is_empty() {
                eprintln!(
                    "Wrote {} turbines sited before the failure to {}",
                    sink.len(),
                    layer.display()
                );
            }
            return Err(err).with_context(|| {
                format!("Site selection failed, partial layer at {}", layer.display())
            });
        }
    };

    let installed_mw = report.progress.sited as f64 * siting.turbine_mw;

    println!();
    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );
    println!();
    println!("Candidates:   {}", report.progress.total);
    println!("Turbines:     {}", report.progress.sited);
    println!("Disqualified: {}", report.progress.disqualified);
    println!("Capacity:     {:.0} MW", installed_mw);
    if installed_mw < siting.min_total_mw {
        println!(
            "Warning: below the {:.0} MW target for this boundary",
            siting.min_total_mw
        );
    }
    println!();
    println!("Output: {}", layer.display());

    Ok(())
}

/// An explicit `--config` must exist, otherwise search the default locations
fn resolve_file_config(path: Option<&Path>) -> Result<FileConfig> {
    let Some(config_path) = path else {
        return Ok(FileConfig::load().unwrap_or_default());
    };
    if !config_path.exists() {
        bail!("Config file not found: {:?}", config_path);
    }
    let contents = std::fs::read_to_string(config_path)
        .context(format!("Failed to read config file: {:?}", config_path))?;
    toml::from_str(&contents).context("Failed to parse config file")
}

fn apply_overrides(mut siting: SitingConfig, args: &Args) -> SitingConfig {
    let overrides = [
        (args.min_mw, &mut siting.min_total_mw),
        (args.wind_bearing, &mut siting.wind_bearing_deg),
        (args.hub_height, &mut siting.hub_height),
        (args.blade_length, &mut siting.blade_length),
        (args.turbine_mw, &mut siting.turbine_mw),
        (args.slope_threshold, &mut siting.slope_threshold),
        (args.elevation_limit, &mut siting.elevation_buffer_limit),
    ];
    for (value, field) in overrides {
        if let Some(value) = value {
            *field = value;
        }
    }
    siting
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} candidates {msg}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb
}
