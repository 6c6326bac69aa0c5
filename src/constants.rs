//! Physical constants in SI units

/// J/K
pub const BOLTZMANN: f64 = 1.380_649e-23;
/// C
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;
