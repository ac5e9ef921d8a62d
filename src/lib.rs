//! Geometry and crystallography kernels for polycrystal diffraction simulation.
//!
//! - [`clip`]: chord lengths of rays through convex polyhedra
//! - [`strain`]: lab-frame strain to crystal lattice matrix
//! - [`orientation`]: unit quaternions from three orientation parameters
//! - [`cell`]: unit-cell and lattice matrix conventions
//! - [`geom`], [`scatterer`]: convex scattering regions
//! - [`sampling`], [`settings`]: the orientation/strain sampling driver

pub mod cell;
pub mod clip;
pub mod config;
pub mod geom;
pub mod orientation;
pub mod sampling;
pub mod scatterer;
pub mod settings;
pub mod strain;
