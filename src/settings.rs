use anyhow::{anyhow, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use log::{debug, info};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::cell::UnitCell;

#[cfg(test)]
mod tests {

    use super::*;

    fn settings() -> Settings {
        Settings {
            unit_cell: vec![5.028, 5.028, 5.519, 90.0, 90.0, 120.0],
            beam_direction: vec![2.0, 0.0, 0.0],
            num_orientations: 4,
            strain_sigma: 1e-3,
            seed: Some(1),
            geom_name: None,
            beam_grid: 4,
            output: "out.json".to_string(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        let settings = load_default_config().unwrap();
        assert!(settings.num_orientations > 0);
        assert_eq!(settings.unit_cell.len(), 6);
    }

    #[test]
    fn accessors() {
        let settings = settings();
        assert_eq!(settings.unit_cell().unwrap().gamma, 120.0);
        assert_eq!(settings.beam_direction().unwrap(), Vector3::x());
    }

    #[test]
    fn short_vectors_are_errors() {
        let mut bad = settings();
        bad.unit_cell.truncate(3);
        bad.beam_direction.pop();
        assert!(bad.unit_cell().is_err());
        assert!(bad.beam_direction().is_err());
    }

    #[test]
    fn invalid_settings() {
        let mut bad = settings();
        bad.unit_cell.pop();
        assert!(validate_config(&bad).is_err());

        let mut bad = settings();
        bad.beam_direction = vec![0.0, 0.0, 0.0];
        assert!(validate_config(&bad).is_err());

        let mut bad = settings();
        bad.unit_cell[1] = -1.0;
        assert!(validate_config(&bad).is_err());

        let mut bad = settings();
        bad.strain_sigma = -0.1;
        assert!(validate_config(&bad).is_err());

        let mut bad = settings();
        bad.beam_grid = 0;
        assert!(validate_config(&bad).is_err());

        assert!(validate_config(&settings()).is_ok());
    }
}

/// Runtime configuration for the sampling driver.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    /// Reference cell `[a, b, c, alpha, beta, gamma]`, angles in degrees.
    pub unit_cell: Vec<f64>,
    /// Beam propagation direction in the lab frame.
    pub beam_direction: Vec<f64>,
    pub num_orientations: usize,
    /// Standard deviation of the random lab strain components.
    pub strain_sigma: f64,
    pub seed: Option<u64>,
    /// Wavefront .obj file holding the scatterer hull. A unit cube is used if absent.
    pub geom_name: Option<String>,
    /// Number of beam rays per side of the square grid.
    pub beam_grid: usize,
    pub output: String,
}

impl Settings {
    pub fn unit_cell(&self) -> Result<UnitCell> {
        let params: [f64; 6] = self.unit_cell.as_slice().try_into().map_err(|_| {
            anyhow!(
                "unit_cell needs 6 values [a, b, c, alpha, beta, gamma], got {}",
                self.unit_cell.len()
            )
        })?;
        Ok(UnitCell::from_array(params))
    }

    /// Unit beam direction.
    pub fn beam_direction(&self) -> Result<Vector3<f64>> {
        let [x, y, z]: [f64; 3] = self.beam_direction.as_slice().try_into().map_err(|_| {
            anyhow!(
                "beam_direction needs 3 values, got {}",
                self.beam_direction.len()
            )
        })?;
        Vector3::new(x, y, z)
            .try_normalize(0.0)
            .ok_or_else(|| anyhow!("beam_direction must be non-zero"))
    }
}

pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    let default_config_file = root.join("config/default.toml");

    let config: Settings = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .context("Error loading configuration")?
        .try_deserialize()
        .context("Error deserializing configuration")?;

    validate_config(&config)?;

    Ok(config)
}

pub fn load_config() -> Result<Settings> {
    let root = retrieve_project_root()?;

    let default_config_file = root.join("config/default.toml");
    let local_config = root.join("config/local.toml");

    // Check if local config exists, if not use default
    let config_file = if local_config.exists() {
        info!("Using local configuration: {:?}", local_config);
        local_config
    } else {
        info!("Using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let mut config: Settings = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(Environment::with_prefix("xrdsim"))
        .build()
        .context("Error loading configuration")?
        .try_deserialize()
        .context("Error deserializing configuration")?;

    // Parse command-line arguments and override values
    let args = CliArgs::parse();

    if let Some(num) = args.num {
        config.num_orientations = num;
    }
    if let Some(sigma) = args.sigma {
        config.strain_sigma = sigma;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(geo) = args.geo {
        config.geom_name = Some(geo);
    }
    if let Some(grid) = args.grid {
        config.beam_grid = grid;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(cell) = args.cell {
        config.unit_cell = cell;
    }
    if let Some(beam) = args.beam {
        config.beam_direction = beam;
    }

    validate_config(&config)?;

    debug!("{:#?}", config);

    Ok(config)
}

/// Parses only the verbosity flag, so logging can start before the configuration loads.
pub fn verbose_requested() -> bool {
    CliArgs::parse().verbose
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the XRDSIM_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("XRDSIM_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    let exe_path = env::current_exe().context("Failed to get current executable path")?;
    exe_path
        .ancestors()
        .skip(1)
        .find(|dir| dir.join("config").is_dir())
        .map(|dir| dir.to_path_buf())
        .ok_or_else(|| anyhow!("Could not find project root directory"))
}

pub fn validate_config(config: &Settings) -> Result<()> {
    if config.unit_cell.len() != 6 {
        return Err(anyhow!(
            "unit_cell needs 6 values [a, b, c, alpha, beta, gamma], got {}",
            config.unit_cell.len()
        ));
    }
    if config.unit_cell[..3].iter().any(|&l| l <= 0.0) {
        return Err(anyhow!("unit cell lengths must be greater than 0"));
    }
    if config.beam_direction.len() != 3 {
        return Err(anyhow!(
            "beam_direction needs 3 values, got {}",
            config.beam_direction.len()
        ));
    }
    if config.beam_direction.iter().all(|&d| d == 0.0) {
        return Err(anyhow!("beam_direction must be non-zero"));
    }
    if config.num_orientations == 0 {
        return Err(anyhow!("num_orientations must be greater than 0"));
    }
    if config.strain_sigma < 0.0 {
        return Err(anyhow!("strain_sigma must not be negative"));
    }
    if config.beam_grid == 0 {
        return Err(anyhow!("beam_grid must be greater than 0"));
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about = "xrdsim - orientation and strain sampling for polycrystal diffraction")]
pub struct CliArgs {
    /// Number of random orientations to sample.
    #[arg(short, long)]
    num: Option<usize>,

    /// Standard deviation of the random lab strain components.
    #[arg(long)]
    sigma: Option<f64>,

    /// Random seed for orientation and strain sampling.
    #[arg(short, long)]
    seed: Option<u64>,

    /// File path to the scatterer geometry. Only triangulated Wavefront .obj is supported.
    #[arg(short, long)]
    geo: Option<String>,

    /// Number of beam rays per side of the square beam grid.
    #[arg(long)]
    grid: Option<usize>,

    /// Output JSON file.
    #[arg(short, long)]
    output: Option<String>,

    /// Reference unit cell: a b c alpha beta gamma (angles in degrees).
    #[arg(long, num_args = 6, value_delimiter = ' ', allow_negative_numbers = true)]
    cell: Option<Vec<f64>>,

    /// Beam direction: x y z.
    #[arg(long, num_args = 3, value_delimiter = ' ', allow_negative_numbers = true)]
    beam: Option<Vec<f64>>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Unit Cell: {:?}
  - Beam Direction: {:?}
  - Orientations: {}
  - Strain Sigma: {:.6}
  - Seed: {:?}
  - Geometry: {}
  - Beam Grid: {}
  - Output: {}
  ",
            self.unit_cell,
            self.beam_direction,
            self.num_orientations,
            self.strain_sigma,
            self.seed,
            self.geom_name.as_deref().unwrap_or("unit cube"),
            self.beam_grid,
            self.output,
        )
    }
}
