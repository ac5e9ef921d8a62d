//! Chord lengths of rays through convex polyhedra.
//!
//! Rays are clipped against the half-space form of a polyhedron (Cyrus–Beck).
//! Each plane whose outward normal opposes the ray direction raises the
//! entry parameter; each plane whose normal agrees with it lowers the exit
//! parameter. The chord length is the difference of the two.
//!
//! A ray that misses the polyhedron is not an error: the returned length is
//! zero or negative and callers discard non-positive values.

use anyhow::{anyhow, Result};
use nalgebra::{Point3, Vector3};
use ndarray::Array1;
use rayon::prelude::*;

use crate::config;
use crate::geom::ConvexPolyhedron;


/// A parametric ray `origin + t * direction`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }
}

/// Computes the length of the segment of `ray` inside a convex polyhedron.
///
/// A plane parallel to the ray imposes no constraint when the ray lies on or
/// inside it; a parallel ray outside any plane misses and gets minus its
/// distance to that plane. Otherwise the result
/// is `t_exit - t_entry`, which is negative if the ray misses and zero if it
/// grazes the boundary. If either bound is left unconstrained the result is `0.0`.
/// The length is in units of `|direction|`.
pub fn clip_length(ray: &Ray, polyhedron: &ConvexPolyhedron) -> f64 {
    let mut t_entry = f64::NEG_INFINITY;
    let mut t_exit = f64::INFINITY;

    for plane in &polyhedron.planes {
        let denom = plane.normal.dot(&ray.direction);
        if denom.abs() <= config::PARALLEL_THRESHOLD {
            // a parallel ray on the outer side of a plane never enters
            let distance = plane.signed_distance(&ray.origin);
            if distance > 0.0 {
                return -distance;
            }
            continue;
        }
        let t = plane.normal.dot(&(plane.point - ray.origin)) / denom;
        if denom < 0.0 {
            t_entry = t_entry.max(t);
        } else {
            t_exit = t_exit.min(t);
        }
    }

    if t_entry.is_finite() && t_exit.is_finite() {
        t_exit - t_entry
    } else {
        0.0
    }
}

/// Clips a bundle of parallel rays against a convex polyhedron given as
/// parallel arrays of plane points and outward unit normals.
///
/// Returns one chord length per entry of `line_points`, in order. Rays are
/// evaluated in parallel.
pub fn clip_line_with_convex_polyhedron(
    line_points: &[Point3<f64>],
    line_direction: &Vector3<f64>,
    plane_points: &[Point3<f64>],
    plane_normals: &[Vector3<f64>],
) -> Result<Array1<f64>> {
    let polyhedron = ConvexPolyhedron::from_arrays(plane_points, plane_normals)?;
    Ok(clip_rays(line_points, line_direction, &polyhedron))
}

/// Clips parallel rays starting at `origins` against an already assembled polyhedron.
pub fn clip_rays(
    origins: &[Point3<f64>],
    direction: &Vector3<f64>,
    polyhedron: &ConvexPolyhedron,
) -> Array1<f64> {
    let lengths: Vec<f64> = origins
        .par_iter()
        .map(|origin| clip_length(&Ray::new(*origin, *direction), polyhedron))
        .collect();
    Array1::from_vec(lengths)
}

/// Square grid of `n * n` ray origins on the plane perpendicular to `direction`,
/// centred `distance` upstream of `centre` and spanning `2 * half_width` per side.
pub fn beam_grid(
    centre: &Point3<f64>,
    direction: &Vector3<f64>,
    half_width: f64,
    distance: f64,
    n: usize,
) -> Result<Vec<Point3<f64>>> {
    let direction = direction
        .try_normalize(config::PARALLEL_THRESHOLD)
        .ok_or_else(|| anyhow!("beam direction must be non-zero"))?;
    // any axis not parallel to the beam seeds the transverse basis
    let seed = if direction.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = direction.cross(&seed).normalize();
    let v = direction.cross(&u);
    let start = centre - distance * direction;

    let step = if n > 1 {
        2.0 * half_width / (n - 1) as f64
    } else {
        0.0
    };
    let offset = |i: usize| if n > 1 { -half_width + step * i as f64 } else { 0.0 };

    Ok((0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .map(|(i, j)| start + offset(i) * u + offset(j) * v)
        .collect())
}
