//! Batch planning for trajectories larger than memory.
//!
//! The [`MemoryManager`] decides how many configurations (and, if needed, how
//! many atoms) are loaded at once. Plans are returned as values and never
//! cached by the manager, so each analysis sees the memory available when it
//! starts.

mod config;
mod manager;
mod plan;

pub use config::{MemoryConfig, DEFAULT_MINIBATCH_FRACTIONS};
pub use manager::MemoryManager;
pub use plan::{BatchPlan, EnsembleLoopPlan};
