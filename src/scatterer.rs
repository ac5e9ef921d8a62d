//! Scattering regions of a single crystal.

use anyhow::{anyhow, Result};
use nalgebra::{Point3, Vector3};
use ndarray::Array1;

use crate::clip;
use crate::geom::{ConvexHull, ConvexPolyhedron};


/// A scattering single crystal occupying a convex region.
#[derive(Debug, Clone, PartialEq)]
pub struct Scatterer {
    /// Boundary of the scattering region.
    pub convex_hull: ConvexHull,
    /// Wavevector pointing in the direction of diffraction.
    pub kprime: Vector3<f64>,
    /// Beam parameter in `[0, 1]`: 0 for the beam with wavevector k1, 1 for k2.
    /// Selects the detector position used for this scatterer.
    pub s: f64,
    /// Miller indices of the diffracting reflection.
    pub hkl: Vector3<i32>,
}

impl Scatterer {
    pub fn new(
        convex_hull: ConvexHull,
        kprime: Vector3<f64>,
        s: f64,
        hkl: Vector3<i32>,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&s) {
            return Err(anyhow!("beam parameter s must lie in [0, 1], got {}", s));
        }
        Ok(Self {
            convex_hull,
            kprime,
            s,
            hkl,
        })
    }

    /// Centroid of the scattering region (mean of the hull vertices).
    pub fn centroid(&self) -> Point3<f64> {
        self.convex_hull.centroid()
    }

    /// Volume of the scattering region.
    pub fn volume(&self) -> f64 {
        self.convex_hull.volume()
    }

    pub fn half_spaces(&self) -> ConvexPolyhedron {
        self.convex_hull.half_spaces()
    }

    /// Chord lengths of parallel rays through the scattering region.
    /// Non-positive entries mark rays that miss.
    pub fn path_lengths(&self, points: &[Point3<f64>], direction: &Vector3<f64>) -> Array1<f64> {
        clip::clip_rays(points, direction, &self.half_spaces())
    }
}
