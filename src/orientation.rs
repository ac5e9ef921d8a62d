//! Crystal orientations from the three-parameter quaternion family.
//!
//! An orientation is given by `(alpha_1, alpha_2, alpha_3)`:
//! - `alpha_1` is the rotation half-angle
//! - `alpha_2` is the polar angle of the rotation axis
//! - `alpha_3` is the azimuth of the rotation axis
//!
//! The quaternion `(cos α1, sin α1 · n)` with `n` the unit axis has unit norm
//! by construction, so no normalisation step is applied.

use std::f64::consts::{FRAC_PI_2, PI};

use anyhow::{anyhow, Result};
use itertools::izip;
use nalgebra::{Matrix3, Quaternion, UnitQuaternion};
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::array;

    #[test]
    fn zero_angle_is_identity() {
        let mut rng = StdRng::seed_from_u64(10);
        for _ in 0..10 {
            let (a2, a3) = (rng.random::<f64>(), rng.random::<f64>());
            let q = alpha_to_quaternion(0.0, a2, a3);
            assert_eq!(q.w, 1.0);
            assert_eq!(q.i, 0.0);
            assert_eq!(q.j, 0.0);
            assert_eq!(q.k, 0.0);
        }
        assert_eq!(alpha_to_quaternion(-0.0, 1.0, 2.0), Quaternion::identity());
    }

    #[test]
    fn batch_is_unit_length() {
        let mut rng = StdRng::seed_from_u64(10);
        let a1: Vec<f64> = (0..7).map(|_| rng.random()).collect();
        let a2: Vec<f64> = (0..7).map(|_| rng.random()).collect();
        let a3: Vec<f64> = (0..7).map(|_| rng.random()).collect();
        let quaternions = alpha_to_quaternions(&a1, &a2, &a3).unwrap();
        assert_eq!(quaternions.dim(), (7, 4));
        for q in quaternions.rows() {
            let norm = q.dot(&q).sqrt();
            assert!((norm - 1.0).abs() < 1e-5, "norm: {}", norm);
        }
    }

    #[test]
    fn batch_matches_scalar() {
        let alphas = array![[0.3, 1.2, 4.0], [0.0, 0.5, 0.5], [1.4, 2.9, -1.0]];
        let quaternions = alpha_array_to_quaternions(alphas.view()).unwrap();
        for (row, alpha) in quaternions.rows().into_iter().zip(alphas.rows()) {
            let q = alpha_to_quaternion(alpha[0], alpha[1], alpha[2]);
            assert_eq!(row.to_vec(), vec![q.w, q.i, q.j, q.k]);
        }
    }

    #[test]
    fn deterministic() {
        let q1 = alpha_to_quaternion(0.7, 0.2, 5.1);
        let q2 = alpha_to_quaternion(0.7, 0.2, 5.1);
        assert_eq!(q1, q2);
    }

    #[test]
    fn mismatched_lengths() {
        assert!(alpha_to_quaternions(&[0.1, 0.2], &[0.1], &[0.1, 0.2]).is_err());
        let alphas = Array2::<f64>::zeros((4, 2));
        assert!(alpha_array_to_quaternions(alphas.view()).is_err());
    }

    #[test]
    fn rotation_about_z() {
        // half-angle pi/4 about the z axis (polar angle 0) is a quarter turn
        let q = alpha_to_quaternion(PI / 4.0, 0.0, 0.0);
        let r = quaternion_to_rotation(&q);
        let expected = Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        assert!((r - expected).norm() < 1e-12, "r: {}", r);
    }

    #[test]
    fn rotations_are_proper() {
        let orientations = Orientations::random_uniform(50, Some(1));
        for r in orientations.rotations() {
            assert!((r.transpose() * r - Matrix3::identity()).norm() < 1e-12);
            assert!((r.determinant() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let first = Orientations::random_uniform(16, Some(42));
        let second = Orientations::random_uniform(16, Some(42));
        assert_eq!(first, second);
        assert_eq!(first.num_orientations, 16);
        for &(a1, a2, a3) in &first.alphas {
            assert!((0.0..=FRAC_PI_2).contains(&a1));
            assert!((0.0..=PI).contains(&a2));
            assert!((0.0..2.0 * PI).contains(&a3));
        }
    }

    #[test]
    fn discrete_orientations() {
        assert!(Orientations::new_discrete(vec![], vec![], vec![]).is_err());
        assert!(Orientations::new_discrete(vec![0.1], vec![0.2, 0.3], vec![0.4]).is_err());
        let orientations = Orientations::new_discrete(vec![0.1, 0.2], vec![0.3, 0.4], vec![0.5, 0.6]).unwrap();
        assert_eq!(orientations.quaternions().len(), 2);
    }
}

/// Unit quaternion `(w, x, y, z)` for half-angle `alpha_1` about the axis with
/// polar angle `alpha_2` and azimuth `alpha_3`.
///
/// `alpha_2` is the raw polar angle, so uniformly distributed `alpha_2` does
/// not give uniform axes; use `alpha_2 = acos(1 - 2u)` with `u` uniform in
/// `[0, 1]`, as [`random_alphas`] does.
///
/// A zero half-angle returns the identity exactly, whatever the axis.
pub fn alpha_to_quaternion(alpha_1: f64, alpha_2: f64, alpha_3: f64) -> Quaternion<f64> {
    if alpha_1 == 0.0 {
        return Quaternion::identity();
    }
    let (s1, c1) = alpha_1.sin_cos();
    let (s2, c2) = alpha_2.sin_cos();
    let (s3, c3) = alpha_3.sin_cos();
    Quaternion::new(c1, s1 * s2 * c3, s1 * s2 * s3, s1 * c2)
}

/// Elementwise [`alpha_to_quaternion`] over parallel arrays. Returns an
/// `(n, 4)` array with rows `(w, x, y, z)`.
pub fn alpha_to_quaternions(
    alpha_1: &[f64],
    alpha_2: &[f64],
    alpha_3: &[f64],
) -> Result<Array2<f64>> {
    if alpha_1.len() != alpha_2.len() || alpha_1.len() != alpha_3.len() {
        return Err(anyhow!(
            "alpha arrays have different lengths: {}, {}, {}",
            alpha_1.len(),
            alpha_2.len(),
            alpha_3.len()
        ));
    }
    let quaternions: Vec<Quaternion<f64>> = izip!(alpha_1, alpha_2, alpha_3)
        .map(|(&a1, &a2, &a3)| alpha_to_quaternion(a1, a2, a3))
        .collect();
    Ok(quaternion_rows(&quaternions))
}

/// Same as [`alpha_to_quaternions`] for an `(n, 3)` array of parameter triples.
pub fn alpha_array_to_quaternions(alphas: ArrayView2<f64>) -> Result<Array2<f64>> {
    if alphas.ncols() != 3 {
        return Err(anyhow!(
            "expected 3 alpha columns, got {}",
            alphas.ncols()
        ));
    }
    let quaternions: Vec<Quaternion<f64>> = alphas
        .rows()
        .into_iter()
        .map(|row| alpha_to_quaternion(row[0], row[1], row[2]))
        .collect();
    Ok(quaternion_rows(&quaternions))
}

fn quaternion_rows(quaternions: &[Quaternion<f64>]) -> Array2<f64> {
    Array2::from_shape_fn((quaternions.len(), 4), |(i, j)| {
        let q = &quaternions[i];
        match j {
            0 => q.w,
            1 => q.i,
            2 => q.j,
            _ => q.k,
        }
    })
}

/// Rotation matrix (crystal to lab) of a quaternion.
pub fn quaternion_to_rotation(q: &Quaternion<f64>) -> Matrix3<f64> {
    UnitQuaternion::from_quaternion(*q)
        .to_rotation_matrix()
        .into_inner()
}

/// Draws `n` parameter triples distributed uniformly over rotations.
///
/// The axis is uniform on the sphere (polar angle `acos(1 - 2u)`, azimuth
/// `2πu`) and the half-angle follows the density `sin²(α1)` on `[0, π/2]`,
/// sampled by rejection.
pub fn random_alphas<R: Rng>(rng: &mut R, n: usize) -> Vec<(f64, f64, f64)> {
    (0..n)
        .map(|_| {
            let alpha_1 = loop {
                let candidate = rng.random_range(0.0..=FRAC_PI_2);
                if rng.random::<f64>() < candidate.sin().powi(2) {
                    break candidate;
                }
            };
            let alpha_2 = (1.0 - rng.random_range(0.0_f64..=1.0) * 2.0).acos();
            let alpha_3 = rng.random_range(0.0_f64..1.0) * 2.0 * PI;
            (alpha_1, alpha_2, alpha_3)
        })
        .collect()
}

/// A set of crystal orientations, stored as parameter triples.
#[derive(Debug, Clone, PartialEq)]
pub struct Orientations {
    pub num_orientations: usize,
    pub alphas: Vec<(f64, f64, f64)>,
}

impl Orientations {
    /// Creates an orientation set from parallel parameter lists.
    pub fn new_discrete(alpha_1: Vec<f64>, alpha_2: Vec<f64>, alpha_3: Vec<f64>) -> Result<Self> {
        if alpha_1.is_empty() || alpha_2.is_empty() || alpha_3.is_empty() {
            return Err(anyhow!("Empty alpha list"));
        }
        if alpha_1.len() != alpha_2.len() || alpha_1.len() != alpha_3.len() {
            return Err(anyhow!("Alpha lists have different lengths"));
        }
        Ok(Self {
            num_orientations: alpha_1.len(),
            alphas: izip!(alpha_1, alpha_2, alpha_3).collect(),
        })
    }

    /// Uniformly random orientations. A seed makes the draw reproducible.
    pub fn random_uniform(num_orient: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            num_orientations: num_orient,
            alphas: random_alphas(&mut rng, num_orient),
        }
    }

    pub fn quaternions(&self) -> Vec<Quaternion<f64>> {
        self.alphas
            .iter()
            .map(|&(a1, a2, a3)| alpha_to_quaternion(a1, a2, a3))
            .collect()
    }

    pub fn rotations(&self) -> Vec<Matrix3<f64>> {
        self.quaternions().iter().map(quaternion_to_rotation).collect()
    }
}
