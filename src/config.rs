/// Minimum absolute value of `n·d` for a plane to constrain a ray. Planes below this are treated as parallel.
pub const PARALLEL_THRESHOLD: f64 = 1e-12;
/// Minimum cross-product magnitude for a hull triangle to define a plane.
pub const DEGENERATE_AREA_THRESHOLD: f64 = 1e-12;
/// Distance upstream of the scatterer at which beam rays start, in multiples of its bounding radius.
pub const BEAM_MARGIN: f64 = 2.0;
