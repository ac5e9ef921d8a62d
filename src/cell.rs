//! Unit cells and the lattice (B) matrix convention.
//!
//! The lattice matrix `B` holds the reciprocal basis vectors of a crystal as
//! its columns, expressed in the Cartesian crystal frame and scaled by 2π.
//! The real-space basis `A` (lattice vectors as columns) is its dual,
//! `A = 2π (B⁻¹)ᵀ`, so that `Aᵀ B = 2π I`. The Cartesian crystal frame puts
//! `a*` along x and `c` along z, so `B` is upper triangular for a reference cell.
//!
//! Strain vectors are the six independent components of a symmetric strain
//! tensor, ordered `[e11, e12, e13, e22, e23, e33]`.

use std::f64::consts::PI;

use anyhow::{anyhow, Result};
use nalgebra::{Matrix3, Vector3};

#[cfg(test)]
mod tests {

    use super::*;

    const QUARTZ: [f64; 6] = [5.028, 5.028, 5.519, 90., 90., 120.];

    #[test]
    fn cubic_b_matrix_is_diagonal() {
        let cell = UnitCell::new(4.0, 4.0, 4.0, 90.0, 90.0, 90.0);
        let b = cell.b_matrix();
        let expected = Matrix3::from_diagonal_element(2.0 * PI / 4.0);
        assert!((b - expected).norm() < 1e-12, "b: {}", b);
    }

    #[test]
    fn real_and_reciprocal_bases_are_dual() {
        let cell = UnitCell::from_array(QUARTZ);
        let product = cell.a_matrix().transpose() * cell.b_matrix();
        let expected = Matrix3::from_diagonal_element(2.0 * PI);
        assert!((product - expected).norm() < 1e-10);
    }

    #[test]
    fn real_basis_reproduces_lengths() {
        let cell = UnitCell::from_array(QUARTZ);
        let a = cell.a_matrix();
        assert!((a.column(0).norm() - 5.028).abs() < 1e-10);
        assert!((a.column(1).norm() - 5.028).abs() < 1e-10);
        assert!((a.column(2).norm() - 5.519).abs() < 1e-10);
        assert!((cell.volume() - a.determinant()).abs() < 1e-8);
    }

    #[test]
    fn cell_from_b_matrix() {
        let cell = UnitCell::new(4.1, 5.2, 6.3, 80.0, 95.0, 110.0);
        let back = UnitCell::from_b_matrix(&cell.b_matrix()).unwrap();
        let (expected, got) = (cell.to_array(), back.to_array());
        for (e, g) in expected.iter().zip(got.iter()) {
            assert!((e - g).abs() < 1e-9, "expected {}, got {}", e, g);
        }
    }

    #[test]
    fn strain_vector_round_trip() {
        let cell = UnitCell::from_array(QUARTZ);
        let strain = [1e-3, -2e-4, 3e-4, -5e-4, 1e-4, 2e-3];
        let b = epsilon_to_b(&strain, &cell);
        let back = b_to_epsilon(&b, &cell).unwrap();
        for (e, g) in strain.iter().zip(back.iter()) {
            assert!((e - g).abs() < 1e-12, "expected {}, got {}", e, g);
        }
    }

    #[test]
    fn zero_strain_gives_reference_matrix() {
        let cell = UnitCell::from_array(QUARTZ);
        let b = epsilon_to_b(&[0.0; 6], &cell);
        assert!((b - cell.b_matrix()).norm() < 1e-12);
    }

    #[test]
    fn singular_b_matrix_is_rejected() {
        let cell = UnitCell::from_array(QUARTZ);
        assert!(b_to_epsilon(&Matrix3::zeros(), &cell).is_err());
        assert!(UnitCell::from_b_matrix(&Matrix3::zeros()).is_err());
    }

    #[test]
    fn tensor_and_vector_agree() {
        let strain = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let tensor = strain_tensor(&strain);
        assert_eq!(tensor, tensor.transpose());
        assert_eq!(tensor[(1, 2)], 5.0);
        assert_eq!(strain_vector(&tensor), strain);
    }
}

/// Reference (unstrained) lattice parameters. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl UnitCell {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        }
    }

    /// Builds a cell from `[a, b, c, alpha, beta, gamma]`.
    pub fn from_array(params: [f64; 6]) -> Self {
        let [a, b, c, alpha, beta, gamma] = params;
        Self::new(a, b, c, alpha, beta, gamma)
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.alpha, self.beta, self.gamma]
    }

    /// Volume of the cell. Zero or NaN for a degenerate cell.
    pub fn volume(&self) -> f64 {
        let (ca, cb, cg) = (
            self.alpha.to_radians().cos(),
            self.beta.to_radians().cos(),
            self.gamma.to_radians().cos(),
        );
        self.a * self.b * self.c * (1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg).sqrt()
    }

    /// Reciprocal lattice matrix of the cell (Busing–Levy form, scaled by 2π).
    pub fn b_matrix(&self) -> Matrix3<f64> {
        let (sa, ca) = self.alpha.to_radians().sin_cos();
        let (sb, cb) = self.beta.to_radians().sin_cos();
        let (sg, cg) = self.gamma.to_radians().sin_cos();
        let v = self.volume();
        let abc = self.a * self.b * self.c;

        let astar = 2.0 * PI * self.b * self.c * sa / v;
        let bstar = 2.0 * PI * self.a * self.c * sb / v;
        let cstar = 2.0 * PI * self.a * self.b * sg / v;
        let sbetastar = v / (abc * sa * sg);
        let sgammastar = v / (abc * sa * sb);
        let cbetastar = (ca * cg - cb) / (sa * sg);
        let cgammastar = (ca * cb - cg) / (sa * sb);

        Matrix3::new(
            astar, bstar * cgammastar, cstar * cbetastar,
            0.0, bstar * sgammastar, -cstar * sbetastar * ca,
            0.0, 0.0, cstar * sbetastar * sa,
        )
    }

    /// Real-space lattice vectors of the cell as columns.
    pub fn a_matrix(&self) -> Matrix3<f64> {
        dual_basis(&self.b_matrix()).unwrap_or_else(Matrix3::zeros)
    }

    /// Recovers cell parameters from a lattice matrix through its real-space metric.
    pub fn from_b_matrix(b: &Matrix3<f64>) -> Result<Self> {
        let a = dual_basis(b).ok_or_else(|| anyhow!("lattice matrix is singular"))?;
        let g = a.transpose() * a;
        let (la, lb, lc) = (g[(0, 0)].sqrt(), g[(1, 1)].sqrt(), g[(2, 2)].sqrt());
        let angle = |cos: f64| cos.clamp(-1.0, 1.0).acos().to_degrees();
        Ok(Self::new(
            la,
            lb,
            lc,
            angle(g[(1, 2)] / (lb * lc)),
            angle(g[(0, 2)] / (la * lc)),
            angle(g[(0, 1)] / (la * lb)),
        ))
    }
}

/// Maps a basis to its dual under `Mᵀ D = 2π I`. The map is its own inverse.
pub fn dual_basis(m: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    m.try_inverse().map(|inv| inv.transpose() * (2.0 * PI))
}

/// Expands `[e11, e12, e13, e22, e23, e33]` into a symmetric tensor.
pub fn strain_tensor(strain: &[f64; 6]) -> Matrix3<f64> {
    let [e11, e12, e13, e22, e23, e33] = *strain;
    Matrix3::new(
        e11, e12, e13,
        e12, e22, e23,
        e13, e23, e33,
    )
}

/// Collects the upper triangle of a tensor as `[e11, e12, e13, e22, e23, e33]`.
pub fn strain_vector(tensor: &Matrix3<f64>) -> [f64; 6] {
    [
        tensor[(0, 0)],
        tensor[(0, 1)],
        tensor[(0, 2)],
        tensor[(1, 1)],
        tensor[(1, 2)],
        tensor[(2, 2)],
    ]
}

/// Lattice matrix of `unit_cell` after deforming its real-space vectors by
/// `(I + e)`, with `e` the crystal-frame strain. A singular deformation gives
/// the zero matrix.
pub fn epsilon_to_b(strain: &[f64; 6], unit_cell: &UnitCell) -> Matrix3<f64> {
    let deformation = Matrix3::identity() + strain_tensor(strain);
    let a = deformation * unit_cell.a_matrix();
    dual_basis(&a).unwrap_or_else(Matrix3::zeros)
}

/// Crystal-frame strain carried by a lattice matrix relative to `unit_cell`.
///
/// The deformation gradient `F = A A0⁻¹` is formed from the real-space bases
/// and the strain is its symmetric part minus the identity.
pub fn b_to_epsilon(b: &Matrix3<f64>, unit_cell: &UnitCell) -> Result<[f64; 6]> {
    let a = dual_basis(b).ok_or_else(|| anyhow!("lattice matrix is singular"))?;
    // A0⁻¹ = B0ᵀ / 2π
    let f = a * unit_cell.b_matrix().transpose() / (2.0 * PI);
    let strain = (f + f.transpose()) * 0.5 - Matrix3::identity();
    Ok(strain_vector(&strain))
}

/// Normal strain along a unit direction, `nᵀ e n`.
pub fn directional_strain(tensor: &Matrix3<f64>, direction: &Vector3<f64>) -> f64 {
    direction.dot(&(tensor * direction))
}
