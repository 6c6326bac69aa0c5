//! Batched, memory-bounded analysis of molecular dynamics trajectories.

pub mod calculator;
pub mod cancel;
pub mod constants;
pub mod data;
pub mod error;
pub mod experiment;
pub mod machine;
pub mod memory;
pub mod prelude;
pub mod results;
pub mod scale_function;
pub mod store;
pub mod transformations;
pub mod utils;

pub use cancel::CancellationToken;
pub use error::{Error, Result};
pub use experiment::Experiment;
pub use machine::MachineProfile;
pub use scale_function::ScaleFunctionSpec;
