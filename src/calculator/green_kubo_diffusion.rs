use std::ops::Range;

use ndarray::ArrayView3;

use super::{check_window, Accumulator, Calculator, Window, WindowSample, DIFFUSION_COEFFICIENTS};
use crate::{
    experiment::SystemProperties,
    memory::MemoryConfig,
    results::{AnalysisResult, ResultKind},
    store::join_path,
    utils::{correlation::origin_correlation, trapezoid},
    Result,
};

pub const VELOCITIES: &str = "Velocities";

/// Self diffusion coefficient from the velocity autocorrelation function,
/// `D = ∫<v(0) · v(t)> dt / 3`
pub struct GreenKuboDiffusion {
    species: String,
    n_atoms: usize,
    interval: f64,
    velocity_squared: f64,
    window: Window,
    memory: MemoryConfig,
}
impl GreenKuboDiffusion {
    pub fn new(properties: &SystemProperties, species: &str) -> Result<Self> {
        properties.validate()?;
        let n_atoms = properties.species(species)?.n_atoms;
        let units = properties.units;
        Ok(Self {
            species: String::from(species),
            n_atoms,
            interval: properties.configuration_interval_si(),
            velocity_squared: (units.length / units.time).powi(2),
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

impl Calculator for GreenKuboDiffusion {
    fn name(&self) -> &str {
        "Green Kubo Self Diffusion Coefficients"
    }
    fn category(&self) -> &str {
        DIFFUSION_COEFFICIENTS
    }
    fn data_paths(&self) -> Vec<String> {
        vec![join_path(&self.species, VELOCITIES)]
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
        let vacf = origin_correlation(window[0].view(), window[0].view()) * self.velocity_squared;
        let integral = trapezoid(&vacf.to_vec(), self.interval);
        Ok(WindowSample::new(
            vacf,
            Some(integral / (3.0 * self.n_atoms as f64)),
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
