/// Group of useful computations
pub mod computations;
/// Window kernels over batched trajectory data
pub mod correlation;

pub use computations::*;
