//! Conversion of lab-frame strain into crystal lattice matrices.

use nalgebra::Matrix3;

use crate::cell::{self, UnitCell};

#[cfg(test)]
mod tests {

    use super::*;
    use crate::cell::{b_to_epsilon, directional_strain, strain_tensor};
    use crate::orientation::{random_alphas, alpha_to_quaternion, quaternion_to_rotation};
    use nalgebra::Vector3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const QUARTZ: [f64; 6] = [5.028, 5.028, 5.519, 90., 90., 120.];

    fn random_strain(rng: &mut StdRng) -> Matrix3<f64> {
        let e = Matrix3::from_fn(|_, _| (rng.random::<f64>() - 0.5) / 100.0);
        (e + e.transpose()) / 2.0
    }

    #[test]
    fn directional_strain_is_frame_invariant() {
        let mut rng = StdRng::seed_from_u64(10);
        let cell = UnitCell::from_array(QUARTZ);

        for (a1, a2, a3) in random_alphas(&mut rng, 20) {
            let u = quaternion_to_rotation(&alpha_to_quaternion(a1, a2, a3));
            let strain = random_strain(&mut rng);
            let b = lab_strain_to_lattice_matrix(&strain, &u, &cell);

            let n_c = Vector3::new(rng.random::<f64>(), rng.random::<f64>(), rng.random::<f64>())
                .normalize();
            let n_l = u * n_c;

            let strain_l = directional_strain(&strain, &n_l);
            let crystal_strain = strain_tensor(&b_to_epsilon(&b, &cell).unwrap());
            let strain_c = directional_strain(&crystal_strain, &n_c);

            let tol = 1e-6 * strain_l.abs().max(1e-6);
            assert!(
                (strain_l - strain_c).abs() < tol,
                "lab: {}, crystal: {}",
                strain_l,
                strain_c
            );
        }
    }

    #[test]
    fn identity_rotation_keeps_strain() {
        let mut rng = StdRng::seed_from_u64(3);
        let cell = UnitCell::from_array(QUARTZ);
        let strain = random_strain(&mut rng);
        let b = lab_strain_to_lattice_matrix(&strain, &Matrix3::identity(), &cell);
        let decoded = strain_tensor(&b_to_epsilon(&b, &cell).unwrap());
        assert!((decoded - strain).norm() < 1e-12);
    }

    #[test]
    fn zero_strain_gives_reference_lattice() {
        let cell = UnitCell::from_array(QUARTZ);
        let u = quaternion_to_rotation(&alpha_to_quaternion(0.4, 1.0, 2.0));
        let b = lab_strain_to_lattice_matrix(&Matrix3::zeros(), &u, &cell);
        assert!((b - cell.b_matrix()).norm() < 1e-12);
    }

    #[test]
    fn expansion_shrinks_reciprocal_lattice() {
        let cell = UnitCell::new(4.0, 4.0, 4.0, 90.0, 90.0, 90.0);
        let strain = Matrix3::from_diagonal_element(0.01);
        let b = lab_strain_to_lattice_matrix(&strain, &Matrix3::identity(), &cell);
        let expected = cell.b_matrix() / 1.01;
        assert!((b - expected).norm() < 1e-12);
    }
}

/// Expresses a lab-frame strain tensor in the crystal frame, `Uᵀ e U`, where
/// `crystal_orientation` maps crystal-frame vectors to the lab frame.
pub fn lab_to_crystal_strain(
    strain_tensor: &Matrix3<f64>,
    crystal_orientation: &Matrix3<f64>,
) -> Matrix3<f64> {
    crystal_orientation.transpose() * strain_tensor * crystal_orientation
}

/// Lattice matrix of a crystal with reference cell `unit_cell`, orientation
/// `crystal_orientation` (crystal to lab) and lab-frame strain `strain_tensor`.
///
/// The strain is rotated into the crystal frame and applied to the real-space
/// lattice vectors as `(I + e) v`; the result is the reciprocal (B) matrix of
/// the deformed lattice. Decoding it with [`cell::b_to_epsilon`] returns the
/// crystal-frame strain, so `n_lᵀ e_lab n_l == n_cᵀ e_c n_c` for `n_l = U n_c`.
///
/// Neither the rotation nor the cell is validated.
pub fn lab_strain_to_lattice_matrix(
    strain_tensor: &Matrix3<f64>,
    crystal_orientation: &Matrix3<f64>,
    unit_cell: &UnitCell,
) -> Matrix3<f64> {
    let crystal_strain = lab_to_crystal_strain(strain_tensor, crystal_orientation);
    cell::epsilon_to_b(&cell::strain_vector(&crystal_strain), unit_cell)
}
