//! Orientation and strain sampling over a single scattering grain.
//!
//! For each sampled orientation the driver:
//! - converts the orientation parameters to a rotation `U`
//! - draws a small random lab-frame strain and builds the lattice matrix
//! - rotates the grain hull by `U` and clips a square beam grid through it
//!
//! Samples are processed in parallel with rayon and written as JSON.

use std::fs::File;
use std::io::BufWriter;

use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use nalgebra::{Matrix3, Point3, Vector3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde::Serialize;

use crate::clip;
use crate::config;
use crate::geom::ConvexHull;
use crate::orientation::{self, Orientations};
use crate::scatterer::Scatterer;
use crate::settings::{validate_config, Settings};
use crate::strain;


/// Result of one orientation sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Orientation parameters `(alpha_1, alpha_2, alpha_3)`.
    pub alphas: (f64, f64, f64),
    /// Orientation quaternion `(w, x, y, z)`.
    pub quaternion: [f64; 4],
    /// Lab-frame strain applied to the grain.
    pub strain: [[f64; 3]; 3],
    /// Lattice matrix of the strained, rotated grain.
    pub lattice_matrix: [[f64; 3]; 3],
    /// Number of beam rays intersecting the grain.
    pub hits: usize,
    pub mean_path_length: f64,
    pub max_path_length: f64,
}

/// Symmetrised random strain tensor with components drawn from `normal`.
pub fn random_strain<R: rand::Rng>(rng: &mut R, normal: &Normal<f64>) -> Matrix3<f64> {
    let e = Matrix3::from_fn(|_, _| normal.sample(rng));
    (e + e.transpose()) * 0.5
}

/// Loads the grain hull named in the settings, or a unit cube centred at the origin.
pub fn load_hull(settings: &Settings) -> Result<ConvexHull> {
    match &settings.geom_name {
        Some(name) => ConvexHull::from_file(name),
        None => Ok(ConvexHull::cuboid(
            Point3::new(-0.5, -0.5, -0.5),
            Point3::new(0.5, 0.5, 0.5),
        )),
    }
}

/// The grain as a scatterer. No reflection is tracked, so `kprime` and `hkl` stay zero.
pub fn load_grain(settings: &Settings) -> Result<Scatterer> {
    Scatterer::new(load_hull(settings)?, Vector3::zeros(), 0.0, Vector3::zeros())
}

/// Runs the sampling described by `settings` and returns one sample per orientation.
pub fn run(settings: &Settings) -> Result<Vec<Sample>> {
    validate_config(settings)?;
    let unit_cell = settings.unit_cell()?;
    let beam = settings.beam_direction()?;
    let grain = load_grain(settings)?;

    let volume = grain.volume();
    if volume <= 0.0 {
        warn!("scatterer hull has zero volume");
    }
    info!(
        "grain volume {:.6}, centroid {:?}",
        volume,
        grain.centroid()
    );

    let orientations = Orientations::random_uniform(settings.num_orientations, settings.seed);
    // strains are drawn up front so the result does not depend on thread scheduling
    let normal = Normal::new(0.0, settings.strain_sigma)
        .map_err(|e| anyhow!("invalid strain sigma {}: {}", settings.strain_sigma, e))?;
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_os_rng(),
    };
    let strains: Vec<Matrix3<f64>> = (0..orientations.num_orientations)
        .map(|_| random_strain(&mut rng, &normal))
        .collect();

    let radius = grain.convex_hull.bounding_radius();
    let origins = clip::beam_grid(
        &grain.centroid(),
        &beam,
        radius,
        config::BEAM_MARGIN * radius.max(1.0),
        settings.beam_grid,
    )?;

    let pb = ProgressBar::new(orientations.num_orientations as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>7}/{len:7} {msg}",
        )?
        .progress_chars("#>-"),
    );

    let samples = orientations
        .alphas
        .par_iter()
        .zip(strains.par_iter())
        .map(|(&(a1, a2, a3), strain_tensor)| {
            let q = orientation::alpha_to_quaternion(a1, a2, a3);
            let u = orientation::quaternion_to_rotation(&q);
            let b = strain::lab_strain_to_lattice_matrix(strain_tensor, &u, &unit_cell);

            let rotated = grain.convex_hull.rotated(&u);
            let lengths = clip::clip_rays(&origins, &beam, &rotated.half_spaces());
            let hits: Vec<f64> = lengths.iter().copied().filter(|&l| l > 0.0).collect();
            let mean_path_length = if hits.is_empty() {
                0.0
            } else {
                hits.iter().sum::<f64>() / hits.len() as f64
            };
            let max_path_length = hits.iter().copied().fold(0.0, f64::max);

            pb.inc(1);
            Sample {
                alphas: (a1, a2, a3),
                quaternion: [q.w, q.i, q.j, q.k],
                strain: to_rows(strain_tensor),
                lattice_matrix: to_rows(&b),
                hits: hits.len(),
                mean_path_length,
                max_path_length,
            }
        })
        .collect::<Vec<_>>();
    pb.finish_with_message("done");

    Ok(samples)
}

/// Writes samples to `filename` as pretty-printed JSON.
pub fn write_samples(samples: &[Sample], filename: &str) -> Result<()> {
    let file = File::create(filename).with_context(|| format!("failed to create {}", filename))?;
    serde_json::to_writer_pretty(BufWriter::new(file), samples)?;
    info!("wrote {} samples to {}", samples.len(), filename);
    Ok(())
}

fn to_rows(m: &Matrix3<f64>) -> [[f64; 3]; 3] {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}
