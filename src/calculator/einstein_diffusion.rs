use std::ops::Range;

use ndarray::ArrayView3;

use super::{
    check_window, lag_times, Accumulator, Calculator, Window, WindowSample,
    DIFFUSION_COEFFICIENTS,
};
use crate::{
    experiment::SystemProperties,
    memory::MemoryConfig,
    results::{AnalysisResult, ResultKind},
    store::join_path,
    utils::{correlation::squared_displacement, linear_fit},
    Error, Result,
};

pub const UNWRAPPED_POSITIONS: &str = "Unwrapped_Positions";

/// Self diffusion coefficient from the mean square displacement,
/// `D = d<|r(t) - r(0)|²>/dt / 6`
pub struct EinsteinDiffusion {
    species: String,
    n_atoms: usize,
    interval: f64,
    length_squared: f64,
    window: Window,
    memory: MemoryConfig,
}
impl EinsteinDiffusion {
    pub fn new(properties: &SystemProperties, species: &str) -> Result<Self> {
        properties.validate()?;
        let n_atoms = properties.species(species)?.n_atoms;
        Ok(Self {
            species: String::from(species),
            n_atoms,
            interval: properties.configuration_interval_si(),
            length_squared: properties.units.length.powi(2),
            window: Window::default(),
            memory: MemoryConfig::default(),
        })
    }
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }
    pub fn with_memory_config(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }
}

impl Calculator for EinsteinDiffusion {
    fn name(&self) -> &str {
        "Einstein Self Diffusion Coefficients"
    }
    fn category(&self) -> &str {
        DIFFUSION_COEFFICIENTS
    }
    fn data_paths(&self) -> Vec<String> {
        vec![join_path(&self.species, UNWRAPPED_POSITIONS)]
    }
    fn window(&self) -> Window {
        self.window
    }
    fn memory_config(&self) -> &MemoryConfig {
        &self.memory
    }

    fn window_statistic(
        &self,
        window: &[ArrayView3<f64>],
        _atoms: &Range<usize>,
    ) -> Result<WindowSample> {
        check_window(self.name(), window, 1)?;
        let msd = squared_displacement(window[0].view()) * self.length_squared;
        let times = lag_times(msd.len(), self.interval);
        let msd_values = msd.to_vec();
        let (slope, _) = linear_fit(&times, &msd_values).ok_or_else(|| {
            Error::invalid_parameter("data_range", "a fit needs at least two configurations")
        })?;
        Ok(WindowSample::new(
            msd,
            Some(slope / (6.0 * self.n_atoms as f64)),
        ))
    }

    fn reduce(&self, accumulator: &Accumulator) -> Result<AnalysisResult> {
        Ok(AnalysisResult {
            category: String::from(self.category()),
            method: String::from(self.name()),
            kind: ResultKind::Singular,
            label: self.species.clone(),
            estimate: accumulator.estimate(),
            series: (accumulator.normalized_series() / self.n_atoms as f64).to_vec(),
            windows: accumulator.windows(),
        })
    }
}
