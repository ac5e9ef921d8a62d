use nalgebra::{Matrix3, Point3, Vector3};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use xrdsim::{cell::UnitCell, clip, orientation, strain};

fn matrix(rows: [[f64; 3]; 3]) -> Matrix3<f64> {
    Matrix3::from_fn(|i, j| rows[i][j])
}

/// Chord lengths of parallel rays through a convex polyhedron given by plane points and outward normals.
/// Non-positive lengths mark rays that miss.
#[pyfunction]
fn clip_line_with_convex_polyhedron(
    line_points: Vec<[f64; 3]>,
    line_direction: [f64; 3],
    plane_points: Vec<[f64; 3]>,
    plane_normals: Vec<[f64; 3]>,
) -> PyResult<Vec<f64>> {
    let line_points: Vec<Point3<f64>> = line_points.into_iter().map(Point3::from).collect();
    let plane_points: Vec<Point3<f64>> = plane_points.into_iter().map(Point3::from).collect();
    let plane_normals: Vec<Vector3<f64>> = plane_normals.into_iter().map(Vector3::from).collect();

    clip::clip_line_with_convex_polyhedron(
        &line_points,
        &Vector3::from(line_direction),
        &plane_points,
        &plane_normals,
    )
    .map(|lengths| lengths.to_vec())
    .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Lattice matrix of a strained crystal from its lab-frame strain, orientation and reference unit cell.
#[pyfunction]
fn lab_strain_to_lattice_matrix(
    strain_tensor: [[f64; 3]; 3],
    crystal_orientation: [[f64; 3]; 3],
    unit_cell: [f64; 6],
) -> Vec<Vec<f64>> {
    let b = strain::lab_strain_to_lattice_matrix(
        &matrix(strain_tensor),
        &matrix(crystal_orientation),
        &UnitCell::from_array(unit_cell),
    );
    b.row_iter().map(|row| row.iter().copied().collect()).collect()
}

/// Unit quaternions (w, x, y, z) from parallel lists of orientation parameters.
#[pyfunction]
fn alpha_to_quaternion(
    alpha_1: Vec<f64>,
    alpha_2: Vec<f64>,
    alpha_3: Vec<f64>,
) -> PyResult<Vec<Vec<f64>>> {
    orientation::alpha_to_quaternions(&alpha_1, &alpha_2, &alpha_3)
        .map(|q| q.rows().into_iter().map(|row| row.to_vec()).collect())
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Geometry and crystallography kernels for polycrystal diffraction simulation.
#[pymodule]
fn _xrdsim_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(clip_line_with_convex_polyhedron, m)?)?;
    m.add_function(wrap_pyfunction!(lab_strain_to_lattice_matrix, m)?)?;
    m.add_function(wrap_pyfunction!(alpha_to_quaternion, m)?)?;
    Ok(())
}
