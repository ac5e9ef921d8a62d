//! Convex geometry for scattering regions.
//!
//! Scattering regions are convex polyhedra. They are stored in two forms:
//! - [`ConvexHull`]: vertices plus triangular simplices, as produced by a
//!   convex hull routine or read from a triangulated OBJ file
//! - [`ConvexPolyhedron`]: the half-space form (plane point + outward normal)
//!   consumed by the ray clipper
//!
//! No adjacency is needed by the clipper, so the half-space form is a flat
//! sequence of planes.

use anyhow::{anyhow, Context, Result};
use itertools::Itertools;
use log::{debug, warn};
use nalgebra::{Matrix3, Point3, Vector3};

use crate::config;


/// Represents a plane bounding a half-space, defined by a point on the plane
/// and an outward-pointing unit normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub point: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Plane {
    pub fn new(point: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { point, normal }
    }

    /// Signed distance from the plane to a point, positive on the outer side.
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&(point - self.point))
    }
}

/// A convex region described as the intersection of half-spaces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConvexPolyhedron {
    pub planes: Vec<Plane>,
}

impl ConvexPolyhedron {
    pub fn new(planes: Vec<Plane>) -> Self {
        Self { planes }
    }

    /// Builds the half-space form from parallel arrays of plane points and
    /// outward normals.
    pub fn from_arrays(points: &[Point3<f64>], normals: &[Vector3<f64>]) -> Result<Self> {
        if points.len() != normals.len() {
            return Err(anyhow!(
                "got {} plane points but {} plane normals",
                points.len(),
                normals.len()
            ));
        }
        Ok(Self {
            planes: points
                .iter()
                .zip(normals.iter())
                .map(|(point, normal)| Plane::new(*point, *normal))
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }
}

/// A convex hull given as vertices and triangular simplices indexing into them.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexHull {
    pub points: Vec<Point3<f64>>,
    pub simplices: Vec<[usize; 3]>,
}

impl ConvexHull {
    pub fn new(points: Vec<Point3<f64>>, simplices: Vec<[usize; 3]>) -> Result<Self> {
        if let Some(bad) = simplices.iter().flatten().find(|&&i| i >= points.len()) {
            return Err(anyhow!(
                "simplex index {} out of range for {} points",
                bad,
                points.len()
            ));
        }
        Ok(Self { points, simplices })
    }

    /// Axis-aligned box spanning `min` to `max`.
    pub fn cuboid(min: Point3<f64>, max: Point3<f64>) -> Self {
        let points = (0..8)
            .map(|i| {
                Point3::new(
                    if i & 1 == 0 { min.x } else { max.x },
                    if i & 2 == 0 { min.y } else { max.y },
                    if i & 4 == 0 { min.z } else { max.z },
                )
            })
            .collect();
        // two triangles per face, wound counter-clockwise seen from outside
        let simplices = vec![
            [0, 2, 1], [1, 2, 3], // z = min
            [4, 5, 6], [5, 7, 6], // z = max
            [0, 1, 4], [1, 5, 4], // y = min
            [2, 6, 3], [3, 6, 7], // y = max
            [0, 4, 2], [2, 4, 6], // x = min
            [1, 3, 5], [3, 7, 5], // x = max
        ];
        Self { points, simplices }
    }

    /// Loads a hull from a triangulated Wavefront .obj file. Only the first
    /// model in the file is used.
    pub fn from_file(filename: &str) -> Result<Self> {
        let options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        let (models, _) = tobj::load_obj(filename, &options)
            .with_context(|| format!("failed to load OBJ file {}", filename))?;

        let model = models
            .first()
            .ok_or_else(|| anyhow!("no mesh found in OBJ file {}", filename))?;
        if models.len() > 1 {
            warn!(
                "found {} meshes in {}, using only the first",
                models.len(),
                filename
            );
        }

        let mesh = &model.mesh;
        let points = mesh
            .positions
            .chunks_exact(3)
            .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
            .collect();
        let simplices = mesh
            .indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
            .collect::<Vec<_>>();

        debug!("loaded hull with {} simplices from {}", simplices.len(), filename);
        Self::new(points, simplices)
    }

    /// Indices of the points referenced by at least one simplex.
    pub fn vertices(&self) -> Vec<usize> {
        self.simplices.iter().flatten().copied().sorted().dedup().collect()
    }

    /// Mean of the hull vertices.
    pub fn centroid(&self) -> Point3<f64> {
        let vertices = self.vertices();
        if vertices.is_empty() {
            return Point3::origin();
        }
        let sum = vertices
            .iter()
            .fold(Vector3::zeros(), |acc, &i| acc + self.points[i].coords);
        Point3::from(sum / vertices.len() as f64)
    }

    /// Volume enclosed by the hull, summed over tetrahedra fanned from the
    /// centroid. Independent of simplex winding.
    pub fn volume(&self) -> f64 {
        let centroid = self.centroid();
        self.simplices
            .iter()
            .map(|&[i, j, k]| {
                let a = self.points[i] - centroid;
                let b = self.points[j] - centroid;
                let c = self.points[k] - centroid;
                a.dot(&b.cross(&c)).abs()
            })
            .sum::<f64>()
            / 6.0
    }

    /// Largest distance from the centroid to a vertex.
    pub fn bounding_radius(&self) -> f64 {
        let centroid = self.centroid();
        self.vertices()
            .iter()
            .map(|&i| (self.points[i] - centroid).norm())
            .fold(0.0, f64::max)
    }

    /// Converts the hull into half-space form. Normals are oriented away from
    /// the centroid; degenerate simplices are skipped.
    pub fn half_spaces(&self) -> ConvexPolyhedron {
        let centroid = self.centroid();
        let planes: Vec<Plane> = self
            .simplices
            .iter()
            .filter_map(|&[i, j, k]| {
                let p0 = self.points[i];
                let normal = (self.points[j] - p0)
                    .cross(&(self.points[k] - p0))
                    .try_normalize(config::DEGENERATE_AREA_THRESHOLD)?;
                let outward = if normal.dot(&(p0 - centroid)) < 0.0 {
                    -normal
                } else {
                    normal
                };
                Some(Plane::new(p0, outward))
            })
            .collect();

        if planes.len() < self.simplices.len() {
            debug!(
                "skipped {} degenerate simplices",
                self.simplices.len() - planes.len()
            );
        }
        ConvexPolyhedron::new(planes)
    }

    /// Returns a copy of the hull rotated about its centroid.
    pub fn rotated(&self, rotation: &Matrix3<f64>) -> Self {
        let centroid = self.centroid();
        let points = self
            .points
            .iter()
            .map(|p| centroid + rotation * (p - centroid))
            .collect();
        Self {
            points,
            simplices: self.simplices.clone(),
        }
    }
}
