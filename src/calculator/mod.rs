//! Ensemble-averaged analyses over batched trajectories.
//!
//! A [`Calculator`] only describes what it reads and how one window is
//! measured; [`run_analysis`] owns the batching and the accumulation.

mod accumulator;
mod angular_distribution_function;
mod einstein_diffusion;
mod einstein_distinct_diffusion;
mod einstein_helfand_ionic_conductivity;
mod green_kubo_diffusion;
mod green_kubo_ionic_conductivity;
mod green_kubo_thermal_conductivity;
mod nernst_einstein;
mod potential_of_mean_force;
mod radial_distribution_function;

use std::{ops::Range, sync::Arc};

use ndarray::ArrayView3;
use serde::{Deserialize, Serialize};

use crate::{
    data::DataManager,
    memory::{MemoryConfig, MemoryManager},
    results::AnalysisResult,
    store::TrajectoryStore,
    CancellationToken, Error, MachineProfile, Result,
};

pub use accumulator::{Accumulator, WindowSample};
pub use angular_distribution_function::{
    AngularDistributionFunction, ANGULAR_DISTRIBUTION_FUNCTION,
};
pub use einstein_diffusion::{EinsteinDiffusion, UNWRAPPED_POSITIONS};
pub use einstein_distinct_diffusion::EinsteinDistinctDiffusion;
pub use einstein_helfand_ionic_conductivity::EinsteinHelfandIonicConductivity;
pub use green_kubo_diffusion::{GreenKuboDiffusion, VELOCITIES};
pub use green_kubo_ionic_conductivity::GreenKuboIonicConductivity;
pub use green_kubo_thermal_conductivity::GreenKuboThermalConductivity;
pub use nernst_einstein::NernstEinstein;
pub use potential_of_mean_force::{PotentialOfMeanForce, POTENTIAL_OF_MEAN_FORCE};
pub use radial_distribution_function::{RadialDistributionFunction, POSITIONS};

pub const DIFFUSION_COEFFICIENTS: &str = "Diffusion_Coefficients";
pub const IONIC_CONDUCTIVITY: &str = "Ionic_Conductivity";
pub const THERMAL_CONDUCTIVITY: &str = "Thermal_Conductivity";
pub const RADIAL_DISTRIBUTION_FUNCTION: &str = "Radial_Distribution_Function";

/// Sliding window of an analysis: `data_range` configurations per window,
/// successive windows `correlation_time` configurations apart
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub data_range: usize,
    pub correlation_time: usize,
}
impl Window {
    pub fn new(data_range: usize, correlation_time: usize) -> Self {
        Self {
            data_range,
            correlation_time,
        }
    }
}
impl Default for Window {
    fn default() -> Self {
        Self::new(500, 1)
    }
}

pub trait Calculator {
    /// Method name under which results are stored
    fn name(&self) -> &str;
    fn category(&self) -> &str;
    fn data_paths(&self) -> Vec<String>;
    /// Whether the datasets are system-wide series of a single row
    fn system(&self) -> bool {
        false
    }
    fn window(&self) -> Window;
    /// Length of the accumulated series
    fn series_length(&self) -> usize {
        self.window().data_range
    }
    fn memory_config(&self) -> &MemoryConfig;
    /// Whether a window may be measured on disjoint atom subsets and summed
    fn supports_minibatch(&self) -> bool {
        true
    }
    /// Measure one window. `window` holds one view per data path, each shaped
    /// `[atoms, data_range, components]`.
    fn window_statistic(
        &self,
        window: &[ArrayView3<f64>],
        atoms: &Range<usize>,
    ) -> Result<WindowSample>;
    fn reduce(&self, accumulator: &Accumulator) -> Result<AnalysisResult>;
}

/// Stream the datasets of `calculator` batch by batch and reduce the
/// accumulated windows.
///
/// The cancellation token is checked before every batch is loaded; a
/// cancelled or failed run returns no partial result.
pub fn run_analysis<S: TrajectoryStore + ?Sized>(
    calculator: &dyn Calculator,
    store: &S,
    profile: Arc<MachineProfile>,
    cancel: &CancellationToken,
) -> Result<AnalysisResult> {
    let paths = calculator.data_paths();
    let window = calculator.window();
    let manager = MemoryManager::new(
        store,
        paths.clone(),
        calculator.memory_config().clone(),
        profile,
    )?;
    let plan = manager.get_batch_size(calculator.system())?;
    let ensemble = manager.get_ensemble_loop(&plan, window.data_range, window.correlation_time)?;
    if ensemble.requires_minibatch() && !calculator.supports_minibatch() {
        return Err(Error::MinibatchUnsupported {
            name: String::from(calculator.name()),
            path: paths.join(", "),
        });
    }
    let plan = ensemble.batch_plan();
    log::info!(
        "{}: {} batches of {} configurations over {} atom batches, {} windows per batch",
        calculator.name(),
        plan.total_batches(),
        plan.batch_size(),
        plan.atom_ranges().len(),
        ensemble.windows_per_batch()
    );

    let data = DataManager::new(store, paths.clone());
    let mut batches = data.batch_generator(plan)?;
    let batches_per_pass = plan.total_batches();
    let mut accumulator = Accumulator::new(calculator.name(), calculator.series_length());
    let mut ordinal = 0;
    loop {
        if cancel.is_cancelled() {
            log::warn!("{}: cancelled", calculator.name());
            return Err(Error::Cancelled(String::from(calculator.name())));
        }
        let batch = match batches.next() {
            Some(batch) => batch?,
            None => break,
        };
        if batch.index() % batches_per_pass == 0 {
            ordinal = 0;
        }
        log::debug!(
            "{}: batch {} (configurations {:?}, atoms {:?})",
            calculator.name(),
            batch.index(),
            batch.configurations(),
            batch.atoms()
        );
        for start in ensemble.window_starts(batch.len()) {
            let views = batch.window(start, window.data_range);
            let sample = calculator.window_statistic(&views, batch.atoms())?;
            accumulator.add(ordinal, sample)?;
            ordinal += 1;
        }
    }

    if accumulator.windows() == 0 {
        return Err(Error::InsufficientData {
            path: paths.join(", "),
            data_range: window.data_range,
            correlation_time: window.correlation_time,
        });
    }
    calculator.reduce(&accumulator)
}

/// Lag times of a window in seconds
pub(crate) fn lag_times(length: usize, interval: f64) -> Vec<f64> {
    (0..length).map(|k| k as f64 * interval).collect()
}

pub(crate) fn check_window(name: &str, window: &[ArrayView3<f64>], expected: usize) -> Result<()> {
    if window.len() != expected {
        return Err(Error::ShapeMismatch {
            path: String::from(name),
            expected: vec![expected],
            found: vec![window.len()],
        });
    }
    Ok(())
}
